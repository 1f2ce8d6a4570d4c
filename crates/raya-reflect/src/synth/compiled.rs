//! Compiled backend: closures specialised at creation time

use std::sync::Arc;

use raya_meta::{ArgType, Instance, TypeDef, Value};

use super::{
    coerce_to, constructor_fn, getter_fn, instance_target, method_fn, setter_fn, slot_error,
    ConstructorInvoker, Conversion, DynGetter, DynSetter, MethodInvoker,
};
use crate::descriptor::{MemberDescriptor, MemberKind};
use crate::error::guard;

/// Build a getter, or `None` when the member cannot be read
pub(crate) fn getter(descriptor: &Arc<MemberDescriptor>) -> Option<DynGetter> {
    let member = descriptor.qualified_name();
    let declaring = descriptor.declaring_type().clone();
    match descriptor.kind() {
        MemberKind::Field => {
            let slot = descriptor.field_def()?.slot();
            if descriptor.is_static() {
                return Some(getter_fn(move |_| {
                    Ok(declaring.static_value(slot).unwrap_or_default())
                }));
            }
            let owner = declaring.id();
            let owner_name = declaring.full_name().to_string();
            Some(getter_fn(move |target| {
                let obj = instance_target(target, owner, &owner_name, &member)?;
                Ok(obj.get_slot(slot).unwrap_or_default())
            }))
        }
        MemberKind::Property => {
            let native = descriptor.property_def()?.getter.clone()?;
            if descriptor.is_static() {
                return Some(getter_fn(move |_| guard(&member, || native(&Value::Null))));
            }
            let owner = declaring.id();
            let owner_name = declaring.full_name().to_string();
            Some(getter_fn(move |target| {
                instance_target(target, owner, &owner_name, &member)?;
                guard(&member, || native(target))
            }))
        }
        MemberKind::Method | MemberKind::Constructor => None,
    }
}

/// Build a setter, or `None` when the member cannot be written
pub(crate) fn setter(descriptor: &Arc<MemberDescriptor>) -> Option<DynSetter> {
    let member = descriptor.qualified_name();
    let declaring = descriptor.declaring_type().clone();
    let ty = descriptor.value_type().clone();
    match descriptor.kind() {
        MemberKind::Field => {
            let field = descriptor.field_def()?;
            if field.is_readonly {
                return None;
            }
            let slot = field.slot();
            let owner_name = declaring.full_name().to_string();
            if descriptor.is_static() {
                return Some(setter_fn(move |_, value| {
                    let value = coerce_to(&member, &ty, value)?;
                    declaring
                        .set_static_value(slot, value)
                        .map_err(|msg| slot_error(&member, msg))
                }));
            }
            let owner = declaring.id();
            Some(setter_fn(move |target, value| {
                let obj = instance_target(target, owner, &owner_name, &member)?;
                let value = coerce_to(&member, &ty, value)?;
                obj.set_slot(slot, value)
                    .map_err(|msg| slot_error(&member, msg))
            }))
        }
        MemberKind::Property => {
            let native = descriptor.property_def()?.setter.clone()?;
            if descriptor.is_static() {
                return Some(setter_fn(move |_, value| {
                    let value = coerce_to(&member, &ty, value)?;
                    guard(&member, || native(&Value::Null, value))
                }));
            }
            let owner = declaring.id();
            let owner_name = declaring.full_name().to_string();
            Some(setter_fn(move |target, value| {
                instance_target(target, owner, &owner_name, &member)?;
                let value = coerce_to(&member, &ty, value)?;
                guard(&member, || native(target, value))
            }))
        }
        MemberKind::Method | MemberKind::Constructor => None,
    }
}

/// Build an invoker for `descriptor` specialised to the argument types in
/// `signature`. The caller has already checked that the arguments are
/// assignable.
pub(crate) fn method_invoker(
    descriptor: &Arc<MemberDescriptor>,
    signature: &[ArgType],
) -> Option<MethodInvoker> {
    let method = descriptor.method_def()?;
    let body = method.body.clone();
    let plan = conversion_plan(descriptor, signature);
    let member = descriptor.qualified_name();
    Some(method_fn(move |target, args| {
        let args = apply_plan(&plan, args);
        guard(&member, || body(target, &args))
    }))
}

/// Build a constructor invoker. `None` for `descriptor` means the implicit
/// parameterless constructor of `class`.
pub(crate) fn constructor_invoker(
    class: &Arc<TypeDef>,
    descriptor: Option<&Arc<MemberDescriptor>>,
    signature: &[ArgType],
) -> Option<ConstructorInvoker> {
    let class = class.clone();
    let Some(descriptor) = descriptor else {
        return Some(constructor_fn(move |_| Ok(Instance::new(&class))));
    };
    let body = descriptor.constructor_def()?.body.clone();
    let plan = conversion_plan(descriptor, signature);
    let member = descriptor.qualified_name();
    Some(constructor_fn(move |args| {
        let args = apply_plan(&plan, args);
        let obj = Instance::new(&class);
        guard(&member, || body(&obj, &args))?;
        Ok(obj)
    }))
}

fn conversion_plan(descriptor: &MemberDescriptor, signature: &[ArgType]) -> Arc<[Conversion]> {
    descriptor
        .params()
        .iter()
        .zip(signature)
        .map(|(param, arg)| Conversion::plan(param, *arg))
        .collect()
}

fn apply_plan(plan: &[Conversion], args: Vec<Value>) -> Vec<Value> {
    args.into_iter()
        .zip(plan)
        .map(|(value, conversion)| conversion.apply(value))
        .collect()
}
