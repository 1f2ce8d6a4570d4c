//! Cache property tests
//!
//! Covers the guarantees every cache gives regardless of backend:
//! - Idempotent lookups
//! - Shadowing through the most-derived-first walk
//! - Get/set round trips
//! - Identical results with compiled and raw-introspection accessors
//! - Distinguishable error kinds
//! - Cached attribute outcomes
//!
//! # Running Tests
//! ```bash
//! cargo test -p raya-reflect --test cache_properties
//! ```

mod common;

use std::error::Error as _;
use std::sync::Arc;

use common::{setup, Marker};
use raya_meta::{Instance, MethodDef, TypeBuilder, TypeRef, Value};
use raya_reflect::{BindingScope, CodegenPolicy, MemberKind, ReflectError, Reflector};

// ===== Idempotence =====

#[test]
fn test_get_field_is_idempotent() {
    let (reflector, fx) = setup(CodegenPolicy::Auto);

    let first = reflector.get_field(&fx.widget, "Count", BindingScope::DEFAULT).unwrap();
    let second = reflector.get_field(&fx.widget, "Count", BindingScope::DEFAULT).unwrap();

    assert_eq!(first, second);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(reflector.stats().members.computed, 1);
    assert_eq!(reflector.stats().members.hits, 1);
}

#[test]
fn test_different_scopes_are_different_entries() {
    let (reflector, fx) = setup(CodegenPolicy::Auto);

    let public = reflector.get_field(&fx.widget, "Count", BindingScope::DEFAULT).unwrap();
    let everything = reflector.get_field(&fx.widget, "Count", BindingScope::ALL).unwrap();

    // Same logical member, cached under two keys.
    assert_eq!(public, everything);
    assert_eq!(reflector.stats().members.entries, 2);
}

// ===== Shadowing =====

#[test]
fn test_derived_field_shadows_base_field() {
    let (reflector, fx) = setup(CodegenPolicy::Auto);
    let obj = reflector.create_instance(&fx.derived, Vec::new()).unwrap();

    assert_eq!(reflector.get_field_value(&obj, "X").unwrap(), Value::str("d"));

    let base_x = reflector.get_field(&fx.base, "X", BindingScope::ALL_INSTANCE).unwrap();
    let read_base = reflector.create_getter_for(&base_x).unwrap();
    assert_eq!(read_base(&Value::Object(obj.clone())).unwrap(), Value::str("b"));

    // Writing through the base descriptor leaves the shadowing field alone.
    let write_base = reflector.create_setter_for(&base_x).unwrap();
    write_base(&Value::Object(obj.clone()), Value::str("b2")).unwrap();
    assert_eq!(reflector.get_field_value(&obj, "X").unwrap(), Value::str("d"));
    assert_eq!(read_base(&Value::Object(obj)).unwrap(), Value::str("b2"));
}

#[test]
fn test_private_ancestor_field_needs_non_public_scope() {
    let (reflector, fx) = setup(CodegenPolicy::Auto);

    let err = reflector
        .get_field(&fx.derived, "secret", BindingScope::DEFAULT)
        .unwrap_err();
    assert!(matches!(err, ReflectError::MemberNotFound { kind: MemberKind::Field, .. }));

    let secret = reflector
        .get_field(&fx.derived, "secret", BindingScope::ALL_INSTANCE)
        .unwrap();
    assert_eq!(secret.declaring_type().full_name(), "demo.Base");

    let declared_only = BindingScope::ALL_INSTANCE | BindingScope::DECLARED_ONLY;
    assert!(reflector.get_field(&fx.derived, "secret", declared_only).is_err());
}

// ===== Round trip =====

#[test]
fn test_field_round_trips() {
    for policy in [CodegenPolicy::Enabled, CodegenPolicy::Disabled] {
        let (reflector, fx) = setup(policy);
        let obj = Value::Object(reflector.create_instance(&fx.widget, Vec::new()).unwrap());

        let set_count = reflector.create_setter::<i32>(&fx.widget, "Count").unwrap();
        let get_count = reflector.create_getter::<i32>(&fx.widget, "Count").unwrap();
        for v in [0, -1, 7, i32::MIN, i32::MAX] {
            set_count(&obj, v).unwrap();
            assert_eq!(get_count(&obj).unwrap(), v);
        }

        let set_name = reflector.create_setter::<String>(&fx.widget, "Name").unwrap();
        let get_name = reflector.create_getter::<String>(&fx.widget, "Name").unwrap();
        for v in ["", "Bob", "ünïcødé"] {
            set_name(&obj, v.to_string()).unwrap();
            assert_eq!(get_name(&obj).unwrap(), v);
        }

        let set_ratio = reflector.create_setter::<f64>(&fx.widget, "Ratio").unwrap();
        let get_ratio = reflector.create_getter::<f64>(&fx.widget, "Ratio").unwrap();
        for v in [0.0, -2.5, f64::MAX] {
            set_ratio(&obj, v).unwrap();
            assert_eq!(get_ratio(&obj).unwrap(), v);
        }
    }
}

#[test]
fn test_property_round_trip() {
    let (reflector, fx) = setup(CodegenPolicy::Auto);
    let obj = Value::Object(reflector.create_instance(&fx.widget, Vec::new()).unwrap());

    let set_title = reflector.create_setter::<String>(&fx.widget, "Title").unwrap();
    let get_title = reflector.create_getter::<String>(&fx.widget, "Title").unwrap();
    set_title(&obj, "Dashboard".to_string()).unwrap();
    assert_eq!(get_title(&obj).unwrap(), "Dashboard");
}

// ===== Fallback equivalence =====

/// Run the same accessor and invocation sequence and render every outcome
fn observe(reflector: &Reflector) -> Vec<String> {
    let fx_widget = reflector.resolve_type("ui.Widget").unwrap();
    let fx_calc = reflector.resolve_type("math.Calculator").unwrap();
    let fx_base = reflector.resolve_type("demo.Base").unwrap();
    let widget = reflector.create_instance(&fx_widget, Vec::new()).unwrap();
    let calc = reflector.create_instance(&fx_calc, Vec::new()).unwrap();

    let mut seen = Vec::new();
    seen.push(format!("{:?}", reflector.get_field_value(&widget, "Count")));
    seen.push(format!("{:?}", reflector.set_field_value(&widget, "Count", 9)));
    seen.push(format!("{:?}", reflector.get_field_value(&widget, "Count")));
    seen.push(format!("{:?}", reflector.set_field_value(&widget, "Count", "nine")));
    seen.push(format!("{:?}", reflector.set_field_value(&widget, "Ratio", 3)));
    seen.push(format!("{:?}", reflector.get_field_value(&widget, "Ratio")));
    seen.push(format!("{:?}", reflector.set_field_value(&widget, "Serial", 1i64)));
    seen.push(format!("{:?}", reflector.set_property_value(&widget, "Title", "T")));
    seen.push(format!("{:?}", reflector.get_property_value(&widget, "Title")));
    seen.push(format!("{:?}", reflector.set_static_field_value(&fx_base, "Created", 3)));
    seen.push(format!("{:?}", reflector.get_static_field_value(&fx_base, "Created")));
    seen.push(format!(
        "{:?}",
        reflector.invoke_method(&calc, "Add", vec![Value::I32(2), Value::I32(3)])
    ));
    seen.push(format!(
        "{:?}",
        reflector.invoke_method(&calc, "Add", vec![Value::I32(2), Value::F64(0.5)])
    ));
    seen.push(format!(
        "{:?}",
        reflector.invoke_method(&calc, "Divide", vec![Value::I32(10), Value::I32(0)])
    ));
    seen.push(format!(
        "{:?}",
        reflector.invoke_static_method(&fx_calc, "Square", vec![Value::I64(3)])
    ));
    let wrong_target = reflector
        .create_getter_for(&reflector.get_field(&fx_widget, "Count", BindingScope::ALL).unwrap())
        .unwrap()(&Value::Object(calc));
    seen.push(format!("{:?}", wrong_target));
    seen
}

#[test]
fn test_compiled_and_raw_accessors_agree() {
    let (fast, fx_fast) = setup(CodegenPolicy::Enabled);
    let (slow, fx_slow) = setup(CodegenPolicy::Disabled);

    assert_eq!(observe(&fast), observe(&slow));

    let fast_entry = fast
        .accessor_entry(&fast.get_field(&fx_fast.widget, "Count", BindingScope::ALL).unwrap())
        .unwrap();
    let slow_entry = slow
        .accessor_entry(&slow.get_field(&fx_slow.widget, "Count", BindingScope::ALL).unwrap())
        .unwrap();
    assert!(fast_entry.is_compiled());
    assert!(!slow_entry.is_compiled());
}

// ===== Error kinds =====

#[test]
fn test_unknown_type_is_type_not_found() {
    let (reflector, _) = setup(CodegenPolicy::Auto);
    assert!(matches!(
        reflector.resolve_type("Nonexistent.Type"),
        Err(ReflectError::TypeNotFound { .. })
    ));
}

#[test]
fn test_unknown_field_is_member_not_found() {
    let (reflector, fx) = setup(CodegenPolicy::Auto);
    let err = reflector
        .get_field(&fx.widget, "doesNotExist", BindingScope::DEFAULT)
        .unwrap_err();
    match err {
        ReflectError::MemberNotFound { type_name, member, kind } => {
            assert_eq!(type_name, "ui.Widget");
            assert_eq!(member, "doesNotExist");
            assert_eq!(kind, MemberKind::Field);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_tied_constructors_are_ambiguous() {
    let (reflector, fx) = setup(CodegenPolicy::Auto);
    let err = reflector
        .create_instance(&fx.vector, vec![Value::I32(1), Value::I32(2)])
        .unwrap_err();
    assert!(matches!(
        err,
        ReflectError::AmbiguousMatch { kind: MemberKind::Constructor, candidates: 2, .. }
    ));

    // An exact match breaks the tie.
    assert!(reflector
        .create_instance(&fx.vector, vec![Value::I64(1), Value::F64(2.0)])
        .is_ok());
}

#[test]
fn test_tied_methods_are_ambiguous() {
    for policy in [CodegenPolicy::Enabled, CodegenPolicy::Disabled] {
        let (reflector, fx) = setup(policy);
        let calc = reflector.create_instance(&fx.calculator, Vec::new()).unwrap();

        let err = reflector
            .invoke_method(&calc, "Mix", vec![Value::I32(1), Value::I32(2)])
            .unwrap_err();
        match err {
            ReflectError::AmbiguousMatch { type_name, member, kind, candidates } => {
                assert_eq!(type_name, "math.Calculator");
                assert_eq!(member, "Mix");
                assert_eq!(kind, MemberKind::Method);
                assert_eq!(candidates, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(reflector.stats().invocations.entries, 0);

        let exact = reflector
            .invoke_method(&calc, "Mix", vec![Value::F64(1.0), Value::I64(2)])
            .unwrap();
        assert_eq!(exact, Value::str("f64,i64"));
        assert_eq!(reflector.stats().invocations.entries, 1);
    }
}

#[test]
fn test_deep_subclass_argument_prefers_typed_overload() {
    let (reflector, _) = setup(CodegenPolicy::Auto);
    let root = TypeBuilder::new("deep.Root").build();
    let mut chain = vec![root.clone()];
    for depth in 1..=6 {
        let parent = chain[depth - 1].clone();
        chain.push(TypeBuilder::new(&format!("deep.Level{depth}")).extends(&parent).build());
    }
    let host = TypeBuilder::new("deep.Host")
        .method(MethodDef::new("Take", |_, _| Ok(Value::str("any"))).param(TypeRef::Any))
        .method(MethodDef::new("Take", |_, _| Ok(Value::str("root"))).param(root.type_ref()))
        .build();
    let obj = Instance::new(&host);

    for ty in &chain {
        let arg = Value::Object(Instance::new(ty));
        let taken = reflector.invoke_method(&obj, "Take", vec![arg]).unwrap();
        assert_eq!(taken, Value::str("root"), "argument of {}", ty.full_name());
    }
    assert_eq!(
        reflector.invoke_method(&obj, "Take", vec![Value::I32(1)]).unwrap(),
        Value::str("any")
    );
}

#[test]
fn test_rejected_write_is_type_mismatch_without_mutation() {
    let (reflector, fx) = setup(CodegenPolicy::Auto);
    let obj = reflector.create_instance(&fx.widget, Vec::new()).unwrap();

    let err = reflector.set_field_value(&obj, "Count", "five").unwrap_err();
    assert!(matches!(err, ReflectError::TypeMismatch { .. }));
    assert_eq!(reflector.get_field_value(&obj, "Count").unwrap(), Value::I32(5));
}

#[test]
fn test_readonly_field_refuses_setter() {
    let (reflector, fx) = setup(CodegenPolicy::Auto);
    assert!(matches!(
        reflector.create_setter::<i64>(&fx.widget, "Serial"),
        Err(ReflectError::UnsupportedAccess { kind: MemberKind::Field, .. })
    ));
    let serial = reflector.create_getter::<i64>(&fx.widget, "Serial").unwrap();
    let obj = Value::Object(Instance::new(&fx.widget));
    assert_eq!(serial(&obj).unwrap(), 42);
}

#[test]
fn test_failed_lookup_does_not_poison_cache() {
    let (reflector, fx) = setup(CodegenPolicy::Auto);
    assert!(reflector.get_field(&fx.widget, "Nmae", BindingScope::DEFAULT).is_err());
    assert!(reflector.get_field(&fx.widget, "Name", BindingScope::DEFAULT).is_ok());
    assert_eq!(reflector.stats().members.entries, 1);
}

#[test]
fn test_invocation_error_keeps_cause() {
    let (reflector, fx) = setup(CodegenPolicy::Auto);
    let calc = reflector.create_instance(&fx.calculator, Vec::new()).unwrap();

    let err = reflector.invoke_method(&calc, "Crash", Vec::new()).unwrap_err();
    let cause = err.source().unwrap().to_string();
    assert!(cause.contains("calculator exploded"), "cause was {cause}");
}

// ===== Attribute caching =====

#[test]
fn test_absent_attribute_is_cached() {
    let (reflector, fx) = setup(CodegenPolicy::Auto);

    assert!(reflector.get_attribute::<Marker>(&fx.unmarked, true).is_none());
    assert!(reflector.get_attribute::<Marker>(&fx.unmarked, true).is_none());

    let stats = reflector.stats().attributes;
    assert_eq!(stats.computed, 1);
    assert_eq!(stats.hits, 1);
}

#[test]
fn test_type_attribute_inherits() {
    let (reflector, fx) = setup(CodegenPolicy::Auto);

    assert!(reflector.has_attribute::<Marker>(&fx.base, false));
    assert!(!reflector.has_attribute::<Marker>(&fx.derived, false));
    assert_eq!(
        reflector.get_attribute::<Marker>(&fx.derived, true).as_deref(),
        Some(&Marker)
    );
}

// ===== Constructor lookup =====

#[test]
fn test_constructor_lookup_by_signature() {
    let (reflector, fx) = setup(CodegenPolicy::Auto);

    let all = reflector.get_constructors(&fx.point, BindingScope::DEFAULT).unwrap();
    assert_eq!(all.len(), 2);

    let pair = reflector
        .get_constructor(&fx.point, &[TypeRef::I32, TypeRef::I32], BindingScope::DEFAULT)
        .unwrap();
    assert_eq!(pair.params().len(), 2);
    assert!(reflector
        .get_constructor(&fx.point, &[TypeRef::F64], BindingScope::DEFAULT)
        .is_err());

    // Constructors are not inherited.
    let derived = reflector.get_constructors(&fx.derived, BindingScope::DEFAULT).unwrap();
    assert!(derived.is_empty());
}
