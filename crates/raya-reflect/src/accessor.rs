//! Accessor factory
//!
//! Hands out getter and setter closures for fields and properties. The
//! capability probe picks the backend once; every entry created afterwards
//! uses that backend, and an entry never changes variant once published.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use raya_meta::Value;
use tracing::trace;

use crate::cache::{get_or_add, CacheCounters, CacheStats, FxDashMap};
use crate::capability::CapabilityProbe;
use crate::convert::{FromValue, IntoValue};
use crate::descriptor::{MemberDescriptor, MemberId, MemberKind};
use crate::error::{ReflectError, ReflectResult};
use crate::synth::{compiled, raw, DynGetter, DynSetter};

/// Typed getter
pub type Getter<V> = Arc<dyn Fn(&Value) -> ReflectResult<V> + Send + Sync>;

/// Typed setter
pub type Setter<V> = Arc<dyn Fn(&Value, V) -> ReflectResult<()> + Send + Sync>;

/// Accessor pair for one member. A missing half means the member does not
/// support that access.
#[derive(Clone)]
pub struct Accessors {
    /// Member the accessors read or write
    pub descriptor: Arc<MemberDescriptor>,
    /// Getter, absent for set-only properties
    pub getter: Option<DynGetter>,
    /// Setter, absent for readonly fields and get-only properties
    pub setter: Option<DynSetter>,
}

/// Cached accessors, tagged with the backend that built them
#[derive(Clone)]
pub enum AccessorEntry {
    /// Closures specialised at creation
    Compiled(Accessors),
    /// Closures that go through the descriptor on every call
    RawIntrospection(Accessors),
}

impl AccessorEntry {
    /// The accessor pair
    pub fn accessors(&self) -> &Accessors {
        match self {
            AccessorEntry::Compiled(accessors) | AccessorEntry::RawIntrospection(accessors) => {
                accessors
            }
        }
    }

    /// Whether this entry uses the compiled backend
    pub fn is_compiled(&self) -> bool {
        matches!(self, AccessorEntry::Compiled(_))
    }

    /// Member the entry serves
    pub fn descriptor(&self) -> &Arc<MemberDescriptor> {
        &self.accessors().descriptor
    }
}

impl fmt::Debug for AccessorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let accessors = self.accessors();
        f.debug_struct("AccessorEntry")
            .field("compiled", &self.is_compiled())
            .field("member", &accessors.descriptor.qualified_name())
            .field("readable", &accessors.getter.is_some())
            .field("writable", &accessors.setter.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Direction {
    Get,
    Set,
}

type TypedKey = (MemberId, TypeId, Direction);

/// Accessor entry cache plus the typed wrappers built on top of it
pub struct AccessorFactory {
    probe: Arc<CapabilityProbe>,
    entries: FxDashMap<MemberId, Arc<AccessorEntry>>,
    typed: FxDashMap<TypedKey, Arc<dyn Any + Send + Sync>>,
    counters: CacheCounters,
}

impl AccessorFactory {
    /// Create a factory that consults `probe` on its first entry
    pub fn new(probe: Arc<CapabilityProbe>) -> Self {
        Self {
            probe,
            entries: FxDashMap::default(),
            typed: FxDashMap::default(),
            counters: CacheCounters::default(),
        }
    }

    /// Capability probe shared with the invokers
    pub fn probe(&self) -> &Arc<CapabilityProbe> {
        &self.probe
    }

    /// Cached accessor entry for a field or property
    pub fn entry(&self, descriptor: &Arc<MemberDescriptor>) -> ReflectResult<Arc<AccessorEntry>> {
        if matches!(descriptor.kind(), MemberKind::Method | MemberKind::Constructor) {
            return Err(unsupported(descriptor, "value access"));
        }
        get_or_add(&self.entries, &self.counters, descriptor.id(), || {
            let compiled = self.probe.codegen_available();
            trace!(member = %descriptor.qualified_name(), compiled, "accessor cache miss");
            Ok(Arc::new(synthesize(descriptor, compiled)))
        })
    }

    /// Untyped getter for a field or property
    pub fn create_getter(&self, descriptor: &Arc<MemberDescriptor>) -> ReflectResult<DynGetter> {
        self.entry(descriptor)?
            .accessors()
            .getter
            .clone()
            .ok_or_else(|| unsupported(descriptor, "reads"))
    }

    /// Untyped setter for a field or property
    pub fn create_setter(&self, descriptor: &Arc<MemberDescriptor>) -> ReflectResult<DynSetter> {
        self.entry(descriptor)?
            .accessors()
            .setter
            .clone()
            .ok_or_else(|| unsupported(descriptor, "writes"))
    }

    /// Getter producing `V`. Fails up front when the member's declared type
    /// cannot always be read as `V`.
    pub fn typed_getter<V: FromValue>(
        &self,
        descriptor: &Arc<MemberDescriptor>,
    ) -> ReflectResult<Getter<V>> {
        let key = (descriptor.id(), TypeId::of::<V>(), Direction::Get);
        let erased = get_or_add(&self.typed, &self.counters, key, || {
            let member = descriptor.qualified_name();
            if !V::readable_from(descriptor.value_type()) {
                return Err(ReflectError::mismatch(
                    &member,
                    descriptor.value_type(),
                    V::type_label(),
                ));
            }
            let untyped = self.create_getter(descriptor)?;
            let getter: Getter<V> = Arc::new(move |target: &Value| {
                V::from_value(untyped(target)?).map_err(|value| {
                    ReflectError::mismatch(&member, V::type_label(), value.type_name())
                })
            });
            Ok(Arc::new(getter) as Arc<dyn Any + Send + Sync>)
        })?;
        downcast::<Getter<V>>(erased, descriptor)
    }

    /// Setter accepting `V`. Fails up front when `V` cannot be stored in the
    /// member's declared type.
    pub fn typed_setter<V: IntoValue>(
        &self,
        descriptor: &Arc<MemberDescriptor>,
    ) -> ReflectResult<Setter<V>> {
        let key = (descriptor.id(), TypeId::of::<V>(), Direction::Set);
        let erased = get_or_add(&self.typed, &self.counters, key, || {
            if !V::writable_to(descriptor.value_type()) {
                return Err(ReflectError::mismatch(
                    &descriptor.qualified_name(),
                    descriptor.value_type(),
                    std::any::type_name::<V>(),
                ));
            }
            let untyped = self.create_setter(descriptor)?;
            let setter: Setter<V> =
                Arc::new(move |target: &Value, value: V| untyped(target, value.into_value()));
            Ok(Arc::new(setter) as Arc<dyn Any + Send + Sync>)
        })?;
        downcast::<Setter<V>>(erased, descriptor)
    }

    /// Cache statistics (entries and typed wrappers combined)
    pub fn stats(&self) -> CacheStats {
        self.counters
            .snapshot(self.entries.len() + self.typed.len())
    }

    /// Drop every cached accessor. The probe outcome is kept.
    pub fn reset(&self) {
        self.entries.clear();
        self.typed.clear();
        self.counters.reset();
    }
}

impl fmt::Debug for AccessorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorFactory")
            .field("probe", &self.probe)
            .field("entries", &self.entries.len())
            .field("typed", &self.typed.len())
            .finish()
    }
}

fn synthesize(descriptor: &Arc<MemberDescriptor>, compiled: bool) -> AccessorEntry {
    if compiled {
        AccessorEntry::Compiled(Accessors {
            descriptor: descriptor.clone(),
            getter: compiled::getter(descriptor),
            setter: compiled::setter(descriptor),
        })
    } else {
        AccessorEntry::RawIntrospection(Accessors {
            descriptor: descriptor.clone(),
            getter: raw::getter(descriptor),
            setter: raw::setter(descriptor),
        })
    }
}

fn downcast<T: Clone + 'static>(
    erased: Arc<dyn Any + Send + Sync>,
    descriptor: &MemberDescriptor,
) -> ReflectResult<T> {
    erased
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| unsupported(descriptor, "typed access"))
}

fn unsupported(descriptor: &MemberDescriptor, access: &'static str) -> ReflectError {
    ReflectError::UnsupportedAccess {
        type_name: descriptor.declaring_type().full_name().to_string(),
        member: descriptor.name().to_string(),
        kind: descriptor.kind(),
        access,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodegenPolicy;
    use raya_meta::{FieldDef, Instance, PropertyDef, TypeBuilder, TypeDef, TypeRef};

    fn widget() -> Arc<TypeDef> {
        TypeBuilder::new("ui.Widget")
            .field(FieldDef::new("Count", TypeRef::I32))
            .field(FieldDef::new("Id", TypeRef::I64).as_readonly())
            .property(PropertyDef::new("Sink", TypeRef::String).setter(|_, _| Ok(())))
            .build()
    }

    fn factory(policy: CodegenPolicy) -> AccessorFactory {
        AccessorFactory::new(Arc::new(CapabilityProbe::new(policy)))
    }

    #[test]
    fn test_entry_variant_follows_probe() {
        let ty = widget();
        let count = Arc::new(MemberDescriptor::field(&ty, 0));

        let fast = factory(CodegenPolicy::Enabled);
        assert!(fast.entry(&count).unwrap().is_compiled());

        let slow = factory(CodegenPolicy::Disabled);
        assert!(!slow.entry(&count).unwrap().is_compiled());
    }

    #[test]
    fn test_getter_is_cached() {
        let ty = widget();
        let count = Arc::new(MemberDescriptor::field(&ty, 0));
        let factory = factory(CodegenPolicy::Auto);

        let a = factory.create_getter(&count).unwrap();
        let b = factory.create_getter(&count).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let typed_a = factory.typed_getter::<i32>(&count).unwrap();
        let typed_b = factory.typed_getter::<i32>(&count).unwrap();
        assert!(Arc::ptr_eq(&typed_a, &typed_b));
    }

    #[test]
    fn test_typed_accessors_validate_at_creation() {
        let ty = widget();
        let count = Arc::new(MemberDescriptor::field(&ty, 0));
        let factory = factory(CodegenPolicy::Auto);

        assert!(matches!(
            factory.typed_getter::<String>(&count),
            Err(ReflectError::TypeMismatch { .. })
        ));
        assert!(matches!(
            factory.typed_setter::<f64>(&count),
            Err(ReflectError::TypeMismatch { .. })
        ));
        // i32 widens to i64 on read.
        assert!(factory.typed_getter::<i64>(&count).is_ok());
    }

    #[test]
    fn test_typed_roundtrip() {
        let ty = widget();
        let count = Arc::new(MemberDescriptor::field(&ty, 0));
        let factory = factory(CodegenPolicy::Auto);
        let target = Value::Object(Instance::new(&ty));

        factory.typed_setter::<i32>(&count).unwrap()(&target, 5).unwrap();
        assert_eq!(factory.typed_getter::<i32>(&count).unwrap()(&target).unwrap(), 5);
    }

    #[test]
    fn test_unsupported_access() {
        let ty = widget();
        let id = Arc::new(MemberDescriptor::field(&ty, 1));
        let sink = Arc::new(MemberDescriptor::property(&ty, 0));
        let factory = factory(CodegenPolicy::Disabled);

        assert!(matches!(
            factory.create_setter(&id),
            Err(ReflectError::UnsupportedAccess { access: "writes", .. })
        ));
        assert!(matches!(
            factory.create_getter(&sink),
            Err(ReflectError::UnsupportedAccess { access: "reads", .. })
        ));
    }

    #[test]
    fn test_reset_keeps_probe_outcome() {
        let ty = widget();
        let count = Arc::new(MemberDescriptor::field(&ty, 0));
        let factory = factory(CodegenPolicy::Auto);
        factory.create_getter(&count).unwrap();
        let state = factory.probe().state();

        factory.reset();
        assert_eq!(factory.stats().entries, 0);
        assert_eq!(factory.probe().state(), state);
        assert!(state.is_terminal());
    }
}
