//! Raw-introspection backend
//!
//! Each closure holds only the member descriptor. Every call looks the
//! definition up again on the declaring type and converts values against
//! the declared types, so nothing is specialised ahead of time.

use std::sync::Arc;

use raya_meta::{Instance, TypeDef, Value};

use super::{
    coerce_to, constructor_fn, getter_fn, instance_target, method_fn, missing_definition,
    setter_fn, slot_error, ConstructorInvoker, DynGetter, DynSetter, MethodInvoker,
};
use crate::descriptor::{MemberDescriptor, MemberKind};
use crate::error::{guard, ReflectResult};

/// Build a getter, or `None` when the member cannot be read
pub(crate) fn getter(descriptor: &Arc<MemberDescriptor>) -> Option<DynGetter> {
    if !descriptor.is_readable() {
        return None;
    }
    let descriptor = descriptor.clone();
    Some(getter_fn(move |target| read(&descriptor, target)))
}

/// Build a setter, or `None` when the member cannot be written
pub(crate) fn setter(descriptor: &Arc<MemberDescriptor>) -> Option<DynSetter> {
    if !descriptor.is_writable() {
        return None;
    }
    let descriptor = descriptor.clone();
    Some(setter_fn(move |target, value| write(&descriptor, target, value)))
}

/// Build a method invoker that converts arguments on every call
pub(crate) fn method_invoker(descriptor: &Arc<MemberDescriptor>) -> Option<MethodInvoker> {
    descriptor.method_def()?;
    let descriptor = descriptor.clone();
    Some(method_fn(move |target, args| {
        let method = descriptor
            .method_def()
            .ok_or_else(|| missing_definition(&descriptor))?;
        let member = descriptor.qualified_name();
        let args = convert_args(&descriptor, &member, args)?;
        guard(&member, || (method.body)(target, &args))
    }))
}

/// Build a constructor invoker. `None` for `descriptor` means the implicit
/// parameterless constructor of `class`.
pub(crate) fn constructor_invoker(
    class: &Arc<TypeDef>,
    descriptor: Option<&Arc<MemberDescriptor>>,
) -> Option<ConstructorInvoker> {
    let class = class.clone();
    let Some(descriptor) = descriptor else {
        return Some(constructor_fn(move |_| Ok(Instance::new(&class))));
    };
    descriptor.constructor_def()?;
    let descriptor = descriptor.clone();
    Some(constructor_fn(move |args| {
        let ctor = descriptor
            .constructor_def()
            .ok_or_else(|| missing_definition(&descriptor))?;
        let member = descriptor.qualified_name();
        let args = convert_args(&descriptor, &member, args)?;
        let obj = Instance::new(&class);
        guard(&member, || (ctor.body)(&obj, &args))?;
        Ok(obj)
    }))
}

fn read(descriptor: &MemberDescriptor, target: &Value) -> ReflectResult<Value> {
    let declaring = descriptor.declaring_type();
    let member = descriptor.qualified_name();
    match descriptor.kind() {
        MemberKind::Field => {
            let field = descriptor
                .field_def()
                .ok_or_else(|| missing_definition(descriptor))?;
            if field.is_static {
                return Ok(declaring.static_value(field.slot()).unwrap_or_default());
            }
            let obj = instance_target(target, declaring.id(), declaring.full_name(), &member)?;
            Ok(obj.get_slot(field.slot()).unwrap_or_default())
        }
        MemberKind::Property => {
            let property = descriptor
                .property_def()
                .ok_or_else(|| missing_definition(descriptor))?;
            let native = property
                .getter
                .as_ref()
                .ok_or_else(|| missing_definition(descriptor))?;
            if property.is_static {
                return guard(&member, || native(&Value::Null));
            }
            instance_target(target, declaring.id(), declaring.full_name(), &member)?;
            guard(&member, || native(target))
        }
        MemberKind::Method | MemberKind::Constructor => Err(missing_definition(descriptor)),
    }
}

fn write(descriptor: &MemberDescriptor, target: &Value, value: Value) -> ReflectResult<()> {
    let declaring = descriptor.declaring_type();
    let member = descriptor.qualified_name();
    match descriptor.kind() {
        MemberKind::Field => {
            let field = descriptor
                .field_def()
                .ok_or_else(|| missing_definition(descriptor))?;
            if field.is_static {
                let value = coerce_to(&member, &field.ty, value)?;
                return declaring
                    .set_static_value(field.slot(), value)
                    .map_err(|msg| slot_error(&member, msg));
            }
            let obj = instance_target(target, declaring.id(), declaring.full_name(), &member)?;
            let value = coerce_to(&member, &field.ty, value)?;
            obj.set_slot(field.slot(), value)
                .map_err(|msg| slot_error(&member, msg))
        }
        MemberKind::Property => {
            let property = descriptor
                .property_def()
                .ok_or_else(|| missing_definition(descriptor))?;
            let native = property
                .setter
                .as_ref()
                .ok_or_else(|| missing_definition(descriptor))?;
            if property.is_static {
                let value = coerce_to(&member, &property.ty, value)?;
                return guard(&member, || native(&Value::Null, value));
            }
            instance_target(target, declaring.id(), declaring.full_name(), &member)?;
            let value = coerce_to(&member, &property.ty, value)?;
            guard(&member, || native(target, value))
        }
        MemberKind::Method | MemberKind::Constructor => Err(missing_definition(descriptor)),
    }
}

fn convert_args(
    descriptor: &MemberDescriptor,
    member: &str,
    args: Vec<Value>,
) -> ReflectResult<Vec<Value>> {
    descriptor
        .params()
        .iter()
        .zip(args)
        .map(|(param, value)| coerce_to(member, param, value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use raya_meta::{ConstructorDef, FieldDef, MethodDef, PropertyDef, TypeBuilder, TypeRef};

    use crate::error::ReflectError;

    fn gauge() -> Arc<TypeDef> {
        TypeBuilder::new("t.Gauge")
            .field(FieldDef::new("level", TypeRef::I64))
            .field(FieldDef::new("max", TypeRef::I64).as_readonly().initial_value(100i64))
            .property(
                PropertyDef::new("sink", TypeRef::I32).setter(|_, _| Ok(())),
            )
            .method(
                MethodDef::new("half", |_, args| {
                    Ok(Value::F64(args[0].as_f64().unwrap_or(0.0) / 2.0))
                })
                .param(TypeRef::F64)
                .returns(TypeRef::F64)
                .as_static(),
            )
            .constructor(
                ConstructorDef::new(|_, _| panic!("constructor failed")).param(TypeRef::I32),
            )
            .build()
    }

    #[test]
    fn test_field_roundtrip() {
        let ty = gauge();
        let level = Arc::new(MemberDescriptor::field(&ty, 0));
        let target = Value::Object(Instance::new(&ty));
        setter(&level).unwrap()(&target, Value::I32(9)).unwrap();
        assert_eq!(getter(&level).unwrap()(&target).unwrap(), Value::I64(9));
    }

    #[test]
    fn test_rejected_value_leaves_field_untouched() {
        let ty = gauge();
        let level = Arc::new(MemberDescriptor::field(&ty, 0));
        let obj = Instance::new(&ty);
        let target = Value::Object(obj.clone());
        let err = setter(&level).unwrap()(&target, Value::str("high")).unwrap_err();
        assert!(matches!(err, ReflectError::TypeMismatch { .. }));
        assert_eq!(obj.get_slot(0), Some(Value::I64(0)));
    }

    #[test]
    fn test_access_follows_descriptor() {
        let ty = gauge();
        assert!(setter(&Arc::new(MemberDescriptor::field(&ty, 1))).is_none());
        let sink = Arc::new(MemberDescriptor::property(&ty, 0));
        assert!(getter(&sink).is_none());
        assert!(setter(&sink).is_some());
    }

    #[test]
    fn test_static_method_converts_per_call() {
        let ty = gauge();
        let half = Arc::new(MemberDescriptor::method(&ty, 0));
        let invoke = method_invoker(&half).unwrap();
        assert_eq!(invoke(&Value::Null, vec![Value::I32(3)]).unwrap(), Value::F64(1.5));
    }

    #[test]
    fn test_constructor_panic_is_wrapped() {
        let ty = gauge();
        let ctor = Arc::new(MemberDescriptor::constructor(&ty, 0));
        let create = constructor_invoker(&ty, Some(&ctor)).unwrap();
        let err = create(vec![Value::I32(1)]).unwrap_err();
        match err {
            ReflectError::InvocationTarget { source, .. } => assert_eq!(source.class, "panic"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
