//! Instance factory
//!
//! Picks a constructor by overload resolution and caches the choice, with
//! its invoker, per `(type, argument signature)`.

use std::fmt;
use std::sync::Arc;

use raya_meta::{ArgType, ClassId, ObjectRef, TypeDef, Value};
use tracing::trace;

use crate::cache::{get_or_add, CacheCounters, CacheStats, FxDashMap};
use crate::capability::CapabilityProbe;
use crate::descriptor::{MemberDescriptor, MemberKind, CONSTRUCTOR_NAME};
use crate::dispatch::check_signature;
use crate::error::{ReflectError, ReflectResult};
use crate::members::MemberCache;
use crate::overload::{self, Choice};
use crate::scope::BindingScope;
use crate::synth::{compiled, raw, ConstructorInvoker};

/// Constructor chosen for one argument signature. A binding keeps working
/// after the factory is reset.
#[derive(Clone)]
pub struct ConstructorBinding {
    /// Chosen constructor, `None` for the implicit parameterless one
    pub descriptor: Option<Arc<MemberDescriptor>>,
    signature: Vec<ArgType>,
    invoker: ConstructorInvoker,
}

impl ConstructorBinding {
    /// Argument signature the binding was chosen for
    pub fn signature(&self) -> &[ArgType] {
        &self.signature
    }

    /// Allocate an instance and run the constructor. `args` must have the
    /// signature the binding was chosen for.
    pub fn create(&self, args: Vec<Value>) -> ReflectResult<ObjectRef> {
        if let Some(descriptor) = &self.descriptor {
            check_signature(descriptor, &self.signature, &args)?;
        } else if !args.is_empty() {
            return Err(ReflectError::mismatch(
                CONSTRUCTOR_NAME,
                "[]",
                format!("{:?}", overload::signature(&args)),
            ));
        }
        (self.invoker)(args)
    }
}

impl fmt::Debug for ConstructorBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorBinding")
            .field("descriptor", &self.descriptor)
            .field("signature", &self.signature)
            .finish()
    }
}

type BindingKey = (ClassId, Vec<ArgType>);

/// Constructor selection cache
pub struct InstanceFactory {
    probe: Arc<CapabilityProbe>,
    bindings: FxDashMap<BindingKey, Arc<ConstructorBinding>>,
    counters: CacheCounters,
}

impl InstanceFactory {
    /// Create a factory sharing `probe` with the accessor factory
    pub fn new(probe: Arc<CapabilityProbe>) -> Self {
        Self {
            probe,
            bindings: FxDashMap::default(),
            counters: CacheCounters::default(),
        }
    }

    /// Constructor that [`create`](Self::create) would run for `args`
    pub fn bind(
        &self,
        members: &MemberCache,
        ty: &Arc<TypeDef>,
        args: &[Value],
    ) -> ReflectResult<Arc<ConstructorBinding>> {
        let signature = overload::signature(args);
        let key = (ty.id(), signature.clone());
        get_or_add(&self.bindings, &self.counters, key, || {
            trace!(owner = ty.full_name(), ?signature, "constructor binding miss");
            let not_found =
                || ReflectError::not_found(ty.full_name(), CONSTRUCTOR_NAME, MemberKind::Constructor);
            if ty.is_abstract() {
                return Err(not_found());
            }
            let candidates = members.get_constructors(ty, BindingScope::ALL_INSTANCE)?;
            let descriptor = if ty.constructors().is_empty() {
                if !args.is_empty() {
                    return Err(not_found());
                }
                None
            } else {
                match overload::select(candidates.iter(), args) {
                    Choice::Found(winner) => Some(winner.clone()),
                    Choice::NoMatch => return Err(not_found()),
                    Choice::Ambiguous(candidates) => {
                        return Err(ReflectError::AmbiguousMatch {
                            type_name: ty.full_name().to_string(),
                            member: CONSTRUCTOR_NAME.to_string(),
                            kind: MemberKind::Constructor,
                            candidates,
                        })
                    }
                }
            };
            let invoker = if self.probe.codegen_available() {
                compiled::constructor_invoker(ty, descriptor.as_ref(), &signature)
            } else {
                raw::constructor_invoker(ty, descriptor.as_ref())
            }
            .ok_or_else(not_found)?;
            Ok(Arc::new(ConstructorBinding {
                descriptor,
                signature: signature.clone(),
                invoker,
            }))
        })
    }

    /// Allocate an instance of `ty` and run the best constructor for `args`
    pub fn create(
        &self,
        members: &MemberCache,
        ty: &Arc<TypeDef>,
        args: Vec<Value>,
    ) -> ReflectResult<ObjectRef> {
        let binding = self.bind(members, ty, &args)?;
        (binding.invoker)(args)
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

impl fmt::Debug for InstanceFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceFactory")
            .field("bindings", &self.bindings.len())
            .finish()
    }
}
