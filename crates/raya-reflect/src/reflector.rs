//! Reflector facade
//!
//! Owns every cache and the capability probe. Production code usually goes
//! through [`Reflector::global`]; tests build their own instance over a
//! private [`ModuleRegistry`] so they can reset freely.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use raya_meta::{Attribute, ModuleRegistry, ObjectRef, TypeDef, TypeRef, Value};
use tracing::debug;

use crate::accessor::{AccessorEntry, AccessorFactory, Getter, Setter};
use crate::attributes::{AttributeCache, AttributeTarget};
use crate::cache::CacheStats;
use crate::capability::{CapabilityProbe, CapabilityState};
use crate::config::ReflectConfig;
use crate::convert::{FromValue, IntoValue};
use crate::descriptor::{MemberDescriptor, MemberGroup};
use crate::dispatch::{InvocationDispatcher, MethodBinding};
use crate::error::{ReflectError, ReflectResult};
use crate::factory::{ConstructorBinding, InstanceFactory};
use crate::members::MemberCache;
use crate::resolver::TypeResolver;
use crate::scope::BindingScope;
use crate::synth::{DynGetter, DynSetter};

static GLOBAL: Lazy<Reflector> =
    Lazy::new(|| Reflector::new(ModuleRegistry::global(), ReflectConfig::from_env()));

/// Per-cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReflectorStats {
    /// Type resolver
    pub types: CacheStats,
    /// Field, property, method and constructor descriptors
    pub members: CacheStats,
    /// Attribute outcomes
    pub attributes: CacheStats,
    /// Accessor entries and typed accessors
    pub accessors: CacheStats,
    /// Constructor bindings
    pub constructors: CacheStats,
    /// Method bindings
    pub invocations: CacheStats,
}

/// Cached reflective access over a module registry
pub struct Reflector {
    config: ReflectConfig,
    probe: Arc<CapabilityProbe>,
    types: TypeResolver,
    members: MemberCache,
    attributes: AttributeCache,
    accessors: AccessorFactory,
    instances: InstanceFactory,
    dispatcher: InvocationDispatcher,
}

impl Reflector {
    /// Create a reflector over `registry`
    pub fn new(registry: Arc<ModuleRegistry>, config: ReflectConfig) -> Self {
        let probe = Arc::new(CapabilityProbe::new(config.codegen));
        Self {
            config,
            types: TypeResolver::new(registry),
            members: MemberCache::new(),
            attributes: AttributeCache::new(),
            accessors: AccessorFactory::new(probe.clone()),
            instances: InstanceFactory::new(probe.clone()),
            dispatcher: InvocationDispatcher::new(probe.clone()),
            probe,
        }
    }

    /// Reflector over `registry` with default configuration
    pub fn with_registry(registry: Arc<ModuleRegistry>) -> Self {
        Self::new(registry, ReflectConfig::default())
    }

    /// Process-wide reflector over [`ModuleRegistry::global`], configured
    /// from the environment
    pub fn global() -> &'static Reflector {
        &GLOBAL
    }

    /// Active configuration
    pub fn config(&self) -> &ReflectConfig {
        &self.config
    }

    /// Registry types are resolved from
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        self.types.registry()
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Resolve a type by qualified name (`"ns.Name"` or `"ns.Name, module"`)
    pub fn resolve_type(&self, name: &str) -> ReflectResult<Arc<TypeDef>> {
        self.types.resolve(name)
    }

    /// Most-derived field called `name` visible from `ty` under `scope`
    pub fn get_field(
        &self,
        ty: &Arc<TypeDef>,
        name: &str,
        scope: BindingScope,
    ) -> ReflectResult<Arc<MemberDescriptor>> {
        self.members.get_field(ty, name, scope)
    }

    /// Most-derived property called `name` visible from `ty` under `scope`
    pub fn get_property(
        &self,
        ty: &Arc<TypeDef>,
        name: &str,
        scope: BindingScope,
    ) -> ReflectResult<Arc<MemberDescriptor>> {
        self.members.get_property(ty, name, scope)
    }

    /// Every overload of method `name` visible from `ty` under `scope`
    pub fn get_methods(
        &self,
        ty: &Arc<TypeDef>,
        name: &str,
        scope: BindingScope,
    ) -> ReflectResult<MemberGroup> {
        self.members.get_methods(ty, name, scope)
    }

    /// Constructors declared on `ty`
    pub fn get_constructors(
        &self,
        ty: &Arc<TypeDef>,
        scope: BindingScope,
    ) -> ReflectResult<MemberGroup> {
        self.members.get_constructors(ty, scope)
    }

    /// Constructor of `ty` with exactly `params`
    pub fn get_constructor(
        &self,
        ty: &Arc<TypeDef>,
        params: &[TypeRef],
        scope: BindingScope,
    ) -> ReflectResult<Arc<MemberDescriptor>> {
        self.members.get_constructor(ty, params, scope)
    }

    // ========================================================================
    // Values
    // ========================================================================

    /// Read instance field `name` of `target`
    pub fn get_field_value(&self, target: &ObjectRef, name: &str) -> ReflectResult<Value> {
        let field = self.members.get_field(target.class(), name, BindingScope::ALL_INSTANCE)?;
        let getter = self.accessors.create_getter(&field)?;
        getter(&Value::Object(target.clone()))
    }

    /// Write instance field `name` of `target`
    pub fn set_field_value(
        &self,
        target: &ObjectRef,
        name: &str,
        value: impl Into<Value>,
    ) -> ReflectResult<()> {
        let field = self.members.get_field(target.class(), name, BindingScope::ALL_INSTANCE)?;
        let setter = self.accessors.create_setter(&field)?;
        setter(&Value::Object(target.clone()), value.into())
    }

    /// Read instance property `name` of `target`
    pub fn get_property_value(&self, target: &ObjectRef, name: &str) -> ReflectResult<Value> {
        let property =
            self.members
                .get_property(target.class(), name, BindingScope::ALL_INSTANCE)?;
        let getter = self.accessors.create_getter(&property)?;
        getter(&Value::Object(target.clone()))
    }

    /// Write instance property `name` of `target`
    pub fn set_property_value(
        &self,
        target: &ObjectRef,
        name: &str,
        value: impl Into<Value>,
    ) -> ReflectResult<()> {
        let property =
            self.members
                .get_property(target.class(), name, BindingScope::ALL_INSTANCE)?;
        let setter = self.accessors.create_setter(&property)?;
        setter(&Value::Object(target.clone()), value.into())
    }

    /// Read static field `name` of `ty` or an ancestor
    pub fn get_static_field_value(&self, ty: &Arc<TypeDef>, name: &str) -> ReflectResult<Value> {
        let field = self.members.get_field(ty, name, BindingScope::ALL_STATIC)?;
        let getter = self.accessors.create_getter(&field)?;
        getter(&Value::Null)
    }

    /// Write static field `name` of `ty` or an ancestor
    pub fn set_static_field_value(
        &self,
        ty: &Arc<TypeDef>,
        name: &str,
        value: impl Into<Value>,
    ) -> ReflectResult<()> {
        let field = self.members.get_field(ty, name, BindingScope::ALL_STATIC)?;
        let setter = self.accessors.create_setter(&field)?;
        setter(&Value::Null, value.into())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Typed getter for field or property `name` of `ty`. Fields win over
    /// properties of the same name.
    pub fn create_getter<V: FromValue>(
        &self,
        ty: &Arc<TypeDef>,
        name: &str,
    ) -> ReflectResult<Getter<V>> {
        let member = self.value_member(ty, name)?;
        self.accessors.typed_getter::<V>(&member)
    }

    /// Typed setter for field or property `name` of `ty`
    pub fn create_setter<V: IntoValue>(
        &self,
        ty: &Arc<TypeDef>,
        name: &str,
    ) -> ReflectResult<Setter<V>> {
        let member = self.value_member(ty, name)?;
        self.accessors.typed_setter::<V>(&member)
    }

    /// Untyped getter for a resolved field or property
    pub fn create_getter_for(&self, member: &Arc<MemberDescriptor>) -> ReflectResult<DynGetter> {
        self.accessors.create_getter(member)
    }

    /// Untyped setter for a resolved field or property
    pub fn create_setter_for(&self, member: &Arc<MemberDescriptor>) -> ReflectResult<DynSetter> {
        self.accessors.create_setter(member)
    }

    /// Cached accessor entry for a resolved field or property
    pub fn accessor_entry(
        &self,
        member: &Arc<MemberDescriptor>,
    ) -> ReflectResult<Arc<AccessorEntry>> {
        self.accessors.entry(member)
    }

    fn value_member(&self, ty: &Arc<TypeDef>, name: &str) -> ReflectResult<Arc<MemberDescriptor>> {
        match self.members.get_field(ty, name, BindingScope::ALL) {
            Err(ReflectError::MemberNotFound { .. }) => {
                self.members.get_property(ty, name, BindingScope::ALL)
            }
            found => found,
        }
    }

    // ========================================================================
    // Invocation
    // ========================================================================

    /// Call instance method `name` on `target`
    pub fn invoke_method(
        &self,
        target: &ObjectRef,
        name: &str,
        args: Vec<Value>,
    ) -> ReflectResult<Value> {
        self.dispatcher.invoke(&self.members, target, name, args)
    }

    /// Call static method `name` of `ty`
    pub fn invoke_static_method(
        &self,
        ty: &Arc<TypeDef>,
        name: &str,
        args: Vec<Value>,
    ) -> ReflectResult<Value> {
        self.dispatcher.invoke_static(&self.members, ty, name, args)
    }

    /// Create an instance of `ty` through its best-matching constructor
    pub fn create_instance(&self, ty: &Arc<TypeDef>, args: Vec<Value>) -> ReflectResult<ObjectRef> {
        self.instances.create(&self.members, ty, args)
    }

    /// Cached binding for an instance call of `name` on objects of `ty`
    /// with arguments shaped like `args`
    pub fn bind_method(
        &self,
        ty: &Arc<TypeDef>,
        name: &str,
        args: &[Value],
    ) -> ReflectResult<Arc<MethodBinding>> {
        self.dispatcher.bind(&self.members, ty, name, false, args)
    }

    /// Cached binding for a static call of `name` on `ty`
    pub fn bind_static_method(
        &self,
        ty: &Arc<TypeDef>,
        name: &str,
        args: &[Value],
    ) -> ReflectResult<Arc<MethodBinding>> {
        self.dispatcher.bind(&self.members, ty, name, true, args)
    }

    /// Cached constructor binding for `ty` and arguments shaped like `args`
    pub fn bind_constructor(
        &self,
        ty: &Arc<TypeDef>,
        args: &[Value],
    ) -> ReflectResult<Arc<ConstructorBinding>> {
        self.instances.bind(&self.members, ty, args)
    }

    // ========================================================================
    // Attributes and type relations
    // ========================================================================

    /// Attribute of type `A` on a type or member
    pub fn get_attribute<'a, A: Attribute>(
        &self,
        target: impl Into<AttributeTarget<'a>>,
        include_inherited: bool,
    ) -> Option<Arc<A>> {
        self.attributes.get::<A>(target.into(), include_inherited)
    }

    /// Whether a type or member carries an attribute of type `A`
    pub fn has_attribute<'a, A: Attribute>(
        &self,
        target: impl Into<AttributeTarget<'a>>,
        include_inherited: bool,
    ) -> bool {
        self.attributes.has::<A>(target.into(), include_inherited)
    }

    /// Whether `sub` is `base` or derives from it
    pub fn is_subclass_of(&self, sub: &TypeDef, base: &TypeDef) -> bool {
        sub.is_subclass_of(base.id())
    }

    /// Whether `value` is an object of `ty` or a subclass
    pub fn is_instance_of(&self, value: &Value, ty: &TypeDef) -> bool {
        value
            .as_object()
            .is_some_and(|obj| obj.class().is_subclass_of(ty.id()))
    }

    // ========================================================================
    // State
    // ========================================================================

    /// Capability probe state
    pub fn capability_state(&self) -> CapabilityState {
        self.probe.state()
    }

    /// Whether accessors and invokers use the compiled backend, probing on
    /// first call
    pub fn codegen_available(&self) -> bool {
        self.probe.codegen_available()
    }

    /// Statistics for every cache
    pub fn stats(&self) -> ReflectorStats {
        ReflectorStats {
            types: self.types.stats(),
            members: self.members.stats(),
            attributes: self.attributes.stats(),
            accessors: self.accessors.stats(),
            constructors: self.instances.stats(),
            invocations: self.dispatcher.stats(),
        }
    }

    /// Clear every cache. The capability probe outcome survives; it
    /// describes the process, not the cached metadata. Accessors and
    /// bindings already handed out keep working.
    pub fn reset_caches(&self) {
        self.types.reset();
        self.members.reset();
        self.attributes.reset();
        self.accessors.reset();
        self.instances.reset();
        self.dispatcher.reset();
        debug!("reflection caches reset");
    }
}

impl fmt::Debug for Reflector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reflector")
            .field("config", &self.config)
            .field("probe", &self.probe)
            .finish()
    }
}
