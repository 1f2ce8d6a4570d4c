//! Modules and the registry of loaded modules

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::class::TypeDef;

/// Global counter for generating unique module IDs
static NEXT_MODULE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide registry used by [`ModuleRegistry::global`]
static GLOBAL_REGISTRY: Lazy<Arc<ModuleRegistry>> = Lazy::new(|| Arc::new(ModuleRegistry::new()));

/// Unique identity of a loaded module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(u64);

/// A named unit of type definitions
#[derive(Debug)]
pub struct Module {
    id: ModuleId,
    name: Arc<str>,
    types: Vec<Arc<TypeDef>>,
}

impl Module {
    /// Create an empty module
    pub fn new(name: &str) -> Self {
        Self {
            id: ModuleId(NEXT_MODULE_ID.fetch_add(1, Ordering::Relaxed)),
            name: Arc::from(name),
            types: Vec::new(),
        }
    }

    /// Add a type
    pub fn with_type(mut self, ty: Arc<TypeDef>) -> Self {
        self.types.push(ty);
        self
    }

    /// Add a type
    pub fn add_type(&mut self, ty: Arc<TypeDef>) {
        self.types.push(ty);
    }

    /// Module identity
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Module name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Types defined by this module
    pub fn types(&self) -> &[Arc<TypeDef>] {
        &self.types
    }
}

/// Registry of loaded modules, in load order
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: RwLock<Vec<Arc<Module>>>,
}

impl ModuleRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    pub fn global() -> Arc<ModuleRegistry> {
        GLOBAL_REGISTRY.clone()
    }

    /// Load a module, making its types visible to resolution
    pub fn load(&self, module: Module) -> Arc<Module> {
        let module = Arc::new(module);
        self.modules.write().push(module.clone());
        module
    }

    /// Snapshot of the loaded modules
    pub fn modules(&self) -> Vec<Arc<Module>> {
        self.modules.read().clone()
    }

    /// Find a loaded module by name
    pub fn find(&self, name: &str) -> Option<Arc<Module>> {
        self.modules.read().iter().find(|m| m.name() == name).cloned()
    }

    /// Number of loaded modules
    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    /// Check if no module is loaded
    pub fn is_empty(&self) -> bool {
        self.modules.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::TypeBuilder;

    #[test]
    fn test_load_and_find() {
        let registry = ModuleRegistry::new();
        assert!(registry.is_empty());

        let point = TypeBuilder::new("geo.Point").build();
        let loaded = registry.load(Module::new("geometry").with_type(point));

        assert_eq!(registry.len(), 1);
        assert_eq!(loaded.types().len(), 1);
        assert_eq!(registry.find("geometry").unwrap().id(), loaded.id());
        assert!(registry.find("missing").is_none());
    }

    #[test]
    fn test_module_ids_are_unique() {
        assert_ne!(Module::new("a").id(), Module::new("a").id());
    }
}
