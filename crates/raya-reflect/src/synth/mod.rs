//! Accessor and invoker synthesis
//!
//! Two backends build the same closures:
//!
//! - [`compiled`] specialises each closure when it is created: slot
//!   indexes, native bodies and argument conversions are captured once.
//! - [`raw`] captures only the member descriptor and re-reads the
//!   definition and the declared types on every call.
//!
//! Both backends must be observably identical. The capability probe
//! decides which one the caches use.

pub(crate) mod compiled;
pub(crate) mod raw;

use std::sync::Arc;

use raya_meta::{ArgType, ClassId, ObjectRef, TypeRef, Value};

use crate::descriptor::MemberDescriptor;
use crate::error::{ReflectError, ReflectResult};

/// Untyped getter: reads a member of `target` (ignored for statics)
pub type DynGetter = Arc<dyn Fn(&Value) -> ReflectResult<Value> + Send + Sync>;

/// Untyped setter: writes a member of `target` (ignored for statics)
pub type DynSetter = Arc<dyn Fn(&Value, Value) -> ReflectResult<()> + Send + Sync>;

/// Method invoker: `(target, args)`, target is null for static methods
pub type MethodInvoker = Arc<dyn Fn(&Value, Vec<Value>) -> ReflectResult<Value> + Send + Sync>;

/// Constructor invoker: allocates an instance and runs the constructor body
pub type ConstructorInvoker = Arc<dyn Fn(Vec<Value>) -> ReflectResult<ObjectRef> + Send + Sync>;

pub(crate) fn getter_fn(
    f: impl Fn(&Value) -> ReflectResult<Value> + Send + Sync + 'static,
) -> DynGetter {
    Arc::new(f)
}

pub(crate) fn setter_fn(
    f: impl Fn(&Value, Value) -> ReflectResult<()> + Send + Sync + 'static,
) -> DynSetter {
    Arc::new(f)
}

pub(crate) fn method_fn(
    f: impl Fn(&Value, Vec<Value>) -> ReflectResult<Value> + Send + Sync + 'static,
) -> MethodInvoker {
    Arc::new(f)
}

pub(crate) fn constructor_fn(
    f: impl Fn(Vec<Value>) -> ReflectResult<ObjectRef> + Send + Sync + 'static,
) -> ConstructorInvoker {
    Arc::new(f)
}

/// Argument conversion decided from a call signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Conversion {
    Identity,
    I32ToI64,
    I32ToF64,
    I64ToF64,
}

impl Conversion {
    pub(crate) fn plan(param: &TypeRef, arg: ArgType) -> Self {
        match (param, arg) {
            (TypeRef::I64, ArgType::I32) => Conversion::I32ToI64,
            (TypeRef::F64, ArgType::I32) => Conversion::I32ToF64,
            (TypeRef::F64, ArgType::I64) => Conversion::I64ToF64,
            _ => Conversion::Identity,
        }
    }

    pub(crate) fn apply(self, value: Value) -> Value {
        match (self, value) {
            (Conversion::I32ToI64, Value::I32(v)) => Value::I64(v as i64),
            (Conversion::I32ToF64, Value::I32(v)) => Value::F64(v as f64),
            (Conversion::I64ToF64, Value::I64(v)) => Value::F64(v as f64),
            (_, v) => v,
        }
    }
}

/// The object behind `target`, provided it is an instance of `owner`
pub(crate) fn instance_target<'v>(
    target: &'v Value,
    owner: ClassId,
    owner_name: &str,
    member: &str,
) -> ReflectResult<&'v ObjectRef> {
    match target {
        Value::Object(obj) if obj.class().is_subclass_of(owner) => Ok(obj),
        other => Err(ReflectError::mismatch(member, owner_name, other.type_name())),
    }
}

/// Convert `value` for storage in a member of type `ty`
pub(crate) fn coerce_to(member: &str, ty: &TypeRef, value: Value) -> ReflectResult<Value> {
    ty.coerce(value)
        .map_err(|rejected| ReflectError::mismatch(member, ty, rejected.type_name()))
}

/// Slot writes only fail when a slot index is out of range
pub(crate) fn slot_error(member: &str, message: String) -> ReflectError {
    ReflectError::SlotOutOfRange {
        member: member.to_string(),
        message,
    }
}

pub(crate) fn missing_definition(descriptor: &MemberDescriptor) -> ReflectError {
    ReflectError::not_found(
        descriptor.declaring_type().full_name(),
        descriptor.name(),
        descriptor.kind(),
    )
}
