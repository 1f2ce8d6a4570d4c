//! Method invocation
//!
//! Candidates are the methods of the requested name visible from the
//! receiver's runtime class (or the named type for static calls), filtered
//! to the call's instance/static mode and arity. The winner and its invoker
//! are cached per `(type, name, mode, argument signature)`.

use std::fmt;
use std::sync::Arc;

use raya_meta::{ArgType, ClassId, ObjectRef, TypeDef, Value};
use tracing::trace;

use crate::cache::{get_or_add, CacheCounters, CacheStats, FxDashMap};
use crate::capability::CapabilityProbe;
use crate::descriptor::{MemberDescriptor, MemberKind};
use crate::error::{ReflectError, ReflectResult};
use crate::members::MemberCache;
use crate::overload::{self, Choice};
use crate::scope::BindingScope;
use crate::synth::{compiled, raw, MethodInvoker};

/// Method chosen for one call shape. A binding keeps working after the
/// dispatcher is reset.
#[derive(Clone)]
pub struct MethodBinding {
    /// Chosen method
    pub descriptor: Arc<MemberDescriptor>,
    signature: Vec<ArgType>,
    invoker: MethodInvoker,
}

impl MethodBinding {
    /// Argument signature the binding was chosen for
    pub fn signature(&self) -> &[ArgType] {
        &self.signature
    }

    /// Run the method. `target` is null for static methods; `args` must
    /// have the signature the binding was chosen for.
    pub fn invoke(&self, target: &Value, args: Vec<Value>) -> ReflectResult<Value> {
        check_signature(&self.descriptor, &self.signature, &args)?;
        (self.invoker)(target, args)
    }
}

/// Reject arguments whose runtime shape differs from the bound signature
pub(crate) fn check_signature(
    descriptor: &MemberDescriptor,
    signature: &[ArgType],
    args: &[Value],
) -> ReflectResult<()> {
    let actual = overload::signature(args);
    if actual == signature {
        return Ok(());
    }
    Err(ReflectError::mismatch(
        &descriptor.qualified_name(),
        format!("{signature:?}"),
        format!("{actual:?}"),
    ))
}

impl fmt::Debug for MethodBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodBinding")
            .field("descriptor", &self.descriptor)
            .field("signature", &self.signature)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CallKey {
    owner: ClassId,
    name: Arc<str>,
    is_static: bool,
    signature: Vec<ArgType>,
}

/// Overload selection and invoker cache
pub struct InvocationDispatcher {
    probe: Arc<CapabilityProbe>,
    bindings: FxDashMap<CallKey, Arc<MethodBinding>>,
    counters: CacheCounters,
}

impl InvocationDispatcher {
    /// Create a dispatcher sharing `probe` with the accessor factory
    pub fn new(probe: Arc<CapabilityProbe>) -> Self {
        Self {
            probe,
            bindings: FxDashMap::default(),
            counters: CacheCounters::default(),
        }
    }

    /// Method that a call on `ty` with `args` would run
    pub fn bind(
        &self,
        members: &MemberCache,
        ty: &Arc<TypeDef>,
        name: &str,
        is_static: bool,
        args: &[Value],
    ) -> ReflectResult<Arc<MethodBinding>> {
        let signature = overload::signature(args);
        let key = CallKey {
            owner: ty.id(),
            name: Arc::from(name),
            is_static,
            signature: signature.clone(),
        };
        get_or_add(&self.bindings, &self.counters, key, || {
            trace!(owner = ty.full_name(), name, is_static, "call binding miss");
            let scope = if is_static {
                BindingScope::ALL_STATIC
            } else {
                BindingScope::ALL_INSTANCE
            };
            let group = members.get_methods(ty, name, scope)?;
            let descriptor = match overload::select(group.iter(), args) {
                Choice::Found(winner) => winner.clone(),
                Choice::NoMatch => {
                    return Err(ReflectError::not_found(ty.full_name(), name, MemberKind::Method))
                }
                Choice::Ambiguous(candidates) => {
                    return Err(ReflectError::AmbiguousMatch {
                        type_name: ty.full_name().to_string(),
                        member: name.to_string(),
                        kind: MemberKind::Method,
                        candidates,
                    })
                }
            };
            let invoker = if self.probe.codegen_available() {
                compiled::method_invoker(&descriptor, &signature)
            } else {
                raw::method_invoker(&descriptor)
            }
            .ok_or_else(|| ReflectError::not_found(ty.full_name(), name, MemberKind::Method))?;
            Ok(Arc::new(MethodBinding {
                descriptor,
                signature: signature.clone(),
                invoker,
            }))
        })
    }

    /// Call instance method `name` on `target`
    pub fn invoke(
        &self,
        members: &MemberCache,
        target: &ObjectRef,
        name: &str,
        args: Vec<Value>,
    ) -> ReflectResult<Value> {
        let binding = self.bind(members, target.class(), name, false, &args)?;
        (binding.invoker)(&Value::Object(target.clone()), args)
    }

    /// Call static method `name` declared on `ty` or one of its ancestors
    pub fn invoke_static(
        &self,
        members: &MemberCache,
        ty: &Arc<TypeDef>,
        name: &str,
        args: Vec<Value>,
    ) -> ReflectResult<Value> {
        let binding = self.bind(members, ty, name, true, &args)?;
        (binding.invoker)(&Value::Null, args)
    }

    /// Cache statistics
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.bindings.len())
    }

    /// Drop every cached binding
    pub fn reset(&self) {
        self.bindings.clear();
        self.counters.reset();
    }
}

impl fmt::Debug for InvocationDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationDispatcher")
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodegenPolicy;
    use raya_meta::{Exception, Instance, MethodDef, TypeBuilder, TypeRef};

    fn calculator() -> Arc<TypeDef> {
        TypeBuilder::new("math.Calculator")
            .method(
                MethodDef::new("Add", |_, args| {
                    let (a, b) = (args[0].as_i32().unwrap_or(0), args[1].as_i32().unwrap_or(0));
                    Ok(Value::I32(a + b))
                })
                .param(TypeRef::I32)
                .param(TypeRef::I32)
                .returns(TypeRef::I32),
            )
            .method(
                MethodDef::new("Add", |_, args| {
                    let (a, b) = (args[0].as_f64().unwrap_or(0.0), args[1].as_f64().unwrap_or(0.0));
                    Ok(Value::F64(a + b))
                })
                .param(TypeRef::F64)
                .param(TypeRef::F64)
                .returns(TypeRef::F64),
            )
            .method(
                MethodDef::new("Divide", |_, args| {
                    let (a, b) = (args[0].as_i32().unwrap_or(0), args[1].as_i32().unwrap_or(0));
                    if b == 0 {
                        return Err(Exception::new("ArithmeticError", "division by zero"));
                    }
                    Ok(Value::I32(a / b))
                })
                .param(TypeRef::I32)
                .param(TypeRef::I32)
                .returns(TypeRef::I32),
            )
            .method(
                MethodDef::new("Pi", |_, _| Ok(Value::F64(std::f64::consts::PI)))
                    .returns(TypeRef::F64)
                    .as_static(),
            )
            .build()
    }

    fn dispatcher(policy: CodegenPolicy) -> InvocationDispatcher {
        InvocationDispatcher::new(Arc::new(CapabilityProbe::new(policy)))
    }

    #[test]
    fn test_exact_overload_wins() {
        let ty = calculator();
        let calc = Instance::new(&ty);
        let members = MemberCache::new();
        for policy in [CodegenPolicy::Enabled, CodegenPolicy::Disabled] {
            let dispatcher = dispatcher(policy);
            let result = dispatcher
                .invoke(&members, &calc, "Add", vec![Value::I32(2), Value::I32(3)])
                .unwrap();
            assert_eq!(result, Value::I32(5));
            let widened = dispatcher
                .invoke(&members, &calc, "Add", vec![Value::F64(0.5), Value::I32(3)])
                .unwrap();
            assert_eq!(widened, Value::F64(3.5));
        }
    }

    #[test]
    fn test_exception_is_wrapped() {
        let ty = calculator();
        let calc = Instance::new(&ty);
        let members = MemberCache::new();
        let err = dispatcher(CodegenPolicy::Auto)
            .invoke(&members, &calc, "Divide", vec![Value::I32(10), Value::I32(0)])
            .unwrap_err();
        match err {
            ReflectError::InvocationTarget { member, source } => {
                assert_eq!(member, "math.Calculator.Divide");
                assert_eq!(source.class, "ArithmeticError");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_static_and_instance_modes_are_separate() {
        let ty = calculator();
        let calc = Instance::new(&ty);
        let members = MemberCache::new();
        let dispatcher = dispatcher(CodegenPolicy::Auto);

        let pi = dispatcher.invoke_static(&members, &ty, "Pi", Vec::new()).unwrap();
        assert_eq!(pi, Value::F64(std::f64::consts::PI));
        assert!(matches!(
            dispatcher.invoke(&members, &calc, "Pi", Vec::new()),
            Err(ReflectError::MemberNotFound { .. })
        ));
        assert!(matches!(
            dispatcher.invoke_static(&members, &ty, "Add", vec![Value::I32(1), Value::I32(1)]),
            Err(ReflectError::MemberNotFound { .. })
        ));
    }

    #[test]
    fn test_wrong_arity_is_not_found() {
        let ty = calculator();
        let calc = Instance::new(&ty);
        let members = MemberCache::new();
        assert!(matches!(
            dispatcher(CodegenPolicy::Auto).invoke(&members, &calc, "Add", vec![Value::I32(1)]),
            Err(ReflectError::MemberNotFound { .. })
        ));
    }

    #[test]
    fn test_binding_cached_per_signature() {
        let ty = calculator();
        let calc = Instance::new(&ty);
        let members = MemberCache::new();
        let dispatcher = dispatcher(CodegenPolicy::Auto);
        dispatcher
            .invoke(&members, &calc, "Add", vec![Value::I32(1), Value::I32(2)])
            .unwrap();
        dispatcher
            .invoke(&members, &calc, "Add", vec![Value::I32(3), Value::I32(4)])
            .unwrap();
        dispatcher
            .invoke(&members, &calc, "Add", vec![Value::F64(1.0), Value::F64(2.0)])
            .unwrap();
        let stats = dispatcher.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.hits, 1);
    }
}
