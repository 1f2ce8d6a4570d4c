//! Member lookup and caching
//!
//! Lookups walk the inheritance chain from the search root outward, one
//! level at a time, and the first level that yields a match wins. A field
//! or property declared on a subclass therefore shadows any ancestor member
//! of the same name; the ancestor member stays reachable by rooting the
//! search at the ancestor. Non-public members of ancestors are visible to
//! the walk when the scope includes `NON_PUBLIC`.
//!
//! Methods and constructors are overloadable, so their lookups return the
//! whole candidate group and leave the choice to overload resolution.

use std::sync::Arc;

use raya_meta::{TypeDef, TypeRef};
use tracing::trace;

use crate::cache::{get_or_add, CacheCounters, CacheStats, FxDashMap};
use crate::descriptor::{MemberDescriptor, MemberGroup, MemberKind, CONSTRUCTOR_NAME};
use crate::error::{ReflectError, ReflectResult};
use crate::scope::BindingScope;

/// Cache key: `(owning type, member name, binding scope)` plus the kind of
/// member looked up
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Search root
    pub owner: raya_meta::ClassId,
    /// Member name
    pub name: Arc<str>,
    /// Binding scope
    pub scope: BindingScope,
    /// Member kind
    pub kind: MemberKind,
}

/// Resolved descriptor caches for fields, properties, methods and constructors
#[derive(Default)]
pub struct MemberCache {
    members: FxDashMap<CacheKey, Arc<MemberDescriptor>>,
    groups: FxDashMap<CacheKey, MemberGroup>,
    counters: CacheCounters,
}

impl MemberCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a field
    pub fn get_field(
        &self,
        ty: &Arc<TypeDef>,
        name: &str,
        scope: BindingScope,
    ) -> ReflectResult<Arc<MemberDescriptor>> {
        self.get_single(ty, name, scope, MemberKind::Field)
    }

    /// Resolve a property
    pub fn get_property(
        &self,
        ty: &Arc<TypeDef>,
        name: &str,
        scope: BindingScope,
    ) -> ReflectResult<Arc<MemberDescriptor>> {
        self.get_single(ty, name, scope, MemberKind::Property)
    }

    /// Resolve every method called `name` visible from `ty`.
    ///
    /// An ancestor method is left out when a more-derived level already
    /// contributed one with the same parameter list and storage (it is
    /// overridden or hidden).
    pub fn get_methods(
        &self,
        ty: &Arc<TypeDef>,
        name: &str,
        scope: BindingScope,
    ) -> ReflectResult<MemberGroup> {
        let key = CacheKey {
            owner: ty.id(),
            name: Arc::from(name),
            scope,
            kind: MemberKind::Method,
        };
        get_or_add(&self.groups, &self.counters, key, || {
            trace!(owner = ty.full_name(), name, ?scope, "method cache miss");
            let mut found: Vec<Arc<MemberDescriptor>> = Vec::new();
            for level in chain(ty, scope) {
                for (index, method) in level.methods().iter().enumerate() {
                    if &*method.name != name || !scope.admits(method.visibility, method.is_static) {
                        continue;
                    }
                    let hidden = found.iter().any(|seen| {
                        seen.is_static() == method.is_static && seen.params() == method.params.as_slice()
                    });
                    if !hidden {
                        found.push(Arc::new(MemberDescriptor::method(level, index)));
                    }
                }
            }
            if found.is_empty() {
                Err(ReflectError::not_found(ty.full_name(), name, MemberKind::Method))
            } else {
                Ok(MemberGroup::from(found))
            }
        })
    }

    /// Constructors declared on `ty` (constructors are never inherited).
    /// The group is empty when the type declares none.
    pub fn get_constructors(
        &self,
        ty: &Arc<TypeDef>,
        scope: BindingScope,
    ) -> ReflectResult<MemberGroup> {
        let key = CacheKey {
            owner: ty.id(),
            name: Arc::from(CONSTRUCTOR_NAME),
            scope,
            kind: MemberKind::Constructor,
        };
        get_or_add(&self.groups, &self.counters, key, || {
            trace!(owner = ty.full_name(), ?scope, "constructor cache miss");
            let found: Vec<Arc<MemberDescriptor>> = ty
                .constructors()
                .iter()
                .enumerate()
                .filter(|(_, ctor)| scope.admits(ctor.visibility, false))
                .map(|(index, _)| Arc::new(MemberDescriptor::constructor(ty, index)))
                .collect();
            Ok(MemberGroup::from(found))
        })
    }

    /// The constructor whose parameter list is exactly `params`
    pub fn get_constructor(
        &self,
        ty: &Arc<TypeDef>,
        params: &[TypeRef],
        scope: BindingScope,
    ) -> ReflectResult<Arc<MemberDescriptor>> {
        self.get_constructors(ty, scope)?
            .iter()
            .find(|ctor| ctor.params() == params)
            .cloned()
            .ok_or_else(|| {
                ReflectError::not_found(ty.full_name(), CONSTRUCTOR_NAME, MemberKind::Constructor)
            })
    }

    /// Cache statistics (descriptor and group caches combined)
    pub fn stats(&self) -> CacheStats {
        self.counters
            .snapshot(self.members.len() + self.groups.len())
    }

    /// Drop every cached descriptor. Descriptors already handed out stay valid.
    pub fn reset(&self) {
        self.members.clear();
        self.groups.clear();
        self.counters.reset();
    }

    fn get_single(
        &self,
        ty: &Arc<TypeDef>,
        name: &str,
        scope: BindingScope,
        kind: MemberKind,
    ) -> ReflectResult<Arc<MemberDescriptor>> {
        let key = CacheKey {
            owner: ty.id(),
            name: Arc::from(name),
            scope,
            kind,
        };
        get_or_add(&self.members, &self.counters, key, || {
            trace!(owner = ty.full_name(), name, ?scope, %kind, "member cache miss");
            find_single(ty, name, scope, kind)
                .map(Arc::new)
                .ok_or_else(|| ReflectError::not_found(ty.full_name(), name, kind))
        })
    }
}

/// Levels searched for `scope`: the root, then its ancestors unless the
/// scope is declared-only
fn chain<'a>(ty: &'a Arc<TypeDef>, scope: BindingScope) -> impl Iterator<Item = &'a Arc<TypeDef>> {
    let depth = if scope.includes_inherited() { usize::MAX } else { 1 };
    std::iter::successors(Some(ty), |level| level.parent()).take(depth)
}

/// Most-derived field or property matching `name` and `scope`
fn find_single(
    ty: &Arc<TypeDef>,
    name: &str,
    scope: BindingScope,
    kind: MemberKind,
) -> Option<MemberDescriptor> {
    for level in chain(ty, scope) {
        let found = match kind {
            MemberKind::Field => level
                .fields()
                .iter()
                .position(|f| &*f.name == name && scope.admits(f.visibility, f.is_static))
                .map(|index| MemberDescriptor::field(level, index)),
            MemberKind::Property => level
                .properties()
                .iter()
                .position(|p| &*p.name == name && scope.admits(p.visibility, p.is_static))
                .map(|index| MemberDescriptor::property(level, index)),
            MemberKind::Method | MemberKind::Constructor => None,
        };
        if found.is_some() {
            return found;
        }
    }
    None
}
