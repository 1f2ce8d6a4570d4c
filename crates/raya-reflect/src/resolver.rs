//! Type resolution by qualified name
//!
//! Names resolve through a cache first. On a miss, loaded modules that
//! have not been scanned yet are scanned in load order; every type of a
//! scanned module is published, not only the requested one, and a module
//! is never scanned twice. Failed lookups are not cached, so a module
//! loaded later is still found.
//!
//! A name may be module-qualified as `"geo.Point, geometry"`, restricting
//! the match to the module named `geometry`.

use std::sync::Arc;

use parking_lot::Mutex;
use raya_meta::{ModuleId, ModuleRegistry, TypeDef};
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::cache::{CacheCounters, CacheStats, FxDashMap};
use crate::error::{ReflectError, ReflectResult};

/// Cached name → type resolution over a module registry
pub struct TypeResolver {
    registry: Arc<ModuleRegistry>,
    /// Keys are `full_name` and `full_name, module`
    names: FxDashMap<Arc<str>, Arc<TypeDef>>,
    /// Modules already scanned. Held for the whole scan so concurrent
    /// misses never observe a half-published module.
    scanned: Mutex<FxHashSet<ModuleId>>,
    counters: CacheCounters,
}

impl TypeResolver {
    /// Create a resolver over `registry`
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self {
            registry,
            names: FxDashMap::default(),
            scanned: Mutex::new(FxHashSet::default()),
            counters: CacheCounters::default(),
        }
    }

    /// The registry this resolver scans
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// Resolve a type by qualified name
    pub fn resolve(&self, name: &str) -> ReflectResult<Arc<TypeDef>> {
        let key = normalize(name);
        if let Some(hit) = self.names.get(key.as_str()) {
            self.counters.hit();
            return Ok(hit.value().clone());
        }

        self.counters.computed();
        trace!(name = %key, "type cache miss");

        let mut scanned = self.scanned.lock();
        if let Some(hit) = self.names.get(key.as_str()) {
            return Ok(hit.value().clone());
        }

        for module in self.registry.modules() {
            if !scanned.insert(module.id()) {
                continue;
            }
            debug!(
                module = module.name(),
                types = module.types().len(),
                "scanning module"
            );
            for ty in module.types() {
                let qualified: Arc<str> = Arc::from(format!("{}, {}", ty.full_name(), module.name()));
                self.names.insert(qualified, ty.clone());
                // First module in load order owns the bare name.
                self.names
                    .entry(Arc::from(ty.full_name()))
                    .or_insert_with(|| ty.clone());
            }
            if let Some(hit) = self.names.get(key.as_str()) {
                return Ok(hit.value().clone());
            }
        }

        Err(ReflectError::TypeNotFound {
            name: name.to_string(),
        })
    }

    /// Number of modules scanned so far
    pub fn scanned_modules(&self) -> usize {
        self.scanned.lock().len()
    }

    /// Cache statistics
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.names.len())
    }

    /// Forget every resolved name and scanned module
    pub fn reset(&self) {
        let mut scanned = self.scanned.lock();
        scanned.clear();
        self.names.clear();
        self.counters.reset();
    }
}

/// Canonical cache key: `"name"` or `"name, module"` with surrounding
/// whitespace removed
fn normalize(name: &str) -> String {
    match name.split_once(',') {
        Some((ty, module)) => format!("{}, {}", ty.trim(), module.trim()),
        None => name.trim().to_string(),
    }
}
