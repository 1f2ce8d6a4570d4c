//! Shared fixture types for the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use raya_meta::{
    Attribute, ConstructorDef, Exception, FieldDef, MethodDef, Module, ModuleRegistry, TypeBuilder,
    TypeDef, TypeRef, Value, Visibility,
};
use raya_reflect::{CodegenPolicy, ReflectConfig, Reflector};

/// Marker attribute placed on `demo.Base`
#[derive(Debug, PartialEq)]
pub struct Marker;
impl Attribute for Marker {}

/// Fixture types, all loaded into module `demo`
pub struct Fixtures {
    pub base: Arc<TypeDef>,
    pub derived: Arc<TypeDef>,
    pub widget: Arc<TypeDef>,
    pub point: Arc<TypeDef>,
    pub vector: Arc<TypeDef>,
    pub calculator: Arc<TypeDef>,
    pub unmarked: Arc<TypeDef>,
}

pub fn fixtures() -> Fixtures {
    let base = TypeBuilder::new("demo.Base")
        .attribute(Marker)
        .field(FieldDef::new("X", TypeRef::String).initial_value("b"))
        .field(
            FieldDef::new("secret", TypeRef::I32)
                .initial_value(1)
                .visibility(Visibility::Private),
        )
        .field(FieldDef::new("Created", TypeRef::I64).as_static())
        .build();

    let derived = TypeBuilder::new("demo.Derived")
        .extends(&base)
        .field(FieldDef::new("X", TypeRef::String).initial_value("d"))
        .build();

    let widget = TypeBuilder::new("ui.Widget")
        .field(FieldDef::new("Count", TypeRef::I32).initial_value(5))
        .field(FieldDef::new("Name", TypeRef::String))
        .field(FieldDef::new("Ratio", TypeRef::F64))
        .field(FieldDef::new("Serial", TypeRef::I64).as_readonly().initial_value(42i64))
        .auto_property("Title", TypeRef::String)
        .build();

    let point = TypeBuilder::new("geo.Point")
        .field(FieldDef::new("X", TypeRef::I32))
        .field(FieldDef::new("Y", TypeRef::I32))
        .constructor(ConstructorDef::new(|_, _| Ok(())))
        .constructor(
            ConstructorDef::new(|obj, args| {
                obj.set_field("X", args[0].clone()).map_err(Exception::argument)?;
                obj.set_field("Y", args[1].clone()).map_err(Exception::argument)?;
                Ok(())
            })
            .param(TypeRef::I32)
            .param(TypeRef::I32),
        )
        .build();

    let vector = TypeBuilder::new("geo.Vector")
        .constructor(
            ConstructorDef::new(|_, _| Ok(()))
                .param(TypeRef::I64)
                .param(TypeRef::F64),
        )
        .constructor(
            ConstructorDef::new(|_, _| Ok(()))
                .param(TypeRef::F64)
                .param(TypeRef::I64),
        )
        .build();

    let calculator = TypeBuilder::new("math.Calculator")
        .method(
            MethodDef::new("Add", |_, args| {
                Ok(Value::I32(int(&args[0]) + int(&args[1])))
            })
            .param(TypeRef::I32)
            .param(TypeRef::I32)
            .returns(TypeRef::I32),
        )
        .method(
            MethodDef::new("Add", |_, args| {
                Ok(Value::F64(float(&args[0]) + float(&args[1])))
            })
            .param(TypeRef::F64)
            .param(TypeRef::F64)
            .returns(TypeRef::F64),
        )
        .method(
            MethodDef::new("Divide", |_, args| {
                let divisor = int(&args[1]);
                if divisor == 0 {
                    return Err(Exception::new("ArithmeticError", "division by zero"));
                }
                Ok(Value::I32(int(&args[0]) / divisor))
            })
            .param(TypeRef::I32)
            .param(TypeRef::I32)
            .returns(TypeRef::I32),
        )
        .method(
            MethodDef::new("Mix", |_, _| Ok(Value::str("i64,f64")))
                .param(TypeRef::I64)
                .param(TypeRef::F64)
                .returns(TypeRef::String),
        )
        .method(
            MethodDef::new("Mix", |_, _| Ok(Value::str("f64,i64")))
                .param(TypeRef::F64)
                .param(TypeRef::I64)
                .returns(TypeRef::String),
        )
        .method(
            MethodDef::new("Crash", |_, _| panic!("calculator exploded")).returns(TypeRef::Void),
        )
        .method(
            MethodDef::new("Square", |_, args| Ok(Value::F64(float(&args[0]) * float(&args[0]))))
                .param(TypeRef::F64)
                .returns(TypeRef::F64)
                .as_static(),
        )
        .build();

    let unmarked = TypeBuilder::new("demo.Unmarked").build();

    Fixtures {
        base,
        derived,
        widget,
        point,
        vector,
        calculator,
        unmarked,
    }
}

fn int(value: &Value) -> i32 {
    value.as_i32().unwrap_or_default()
}

fn float(value: &Value) -> f64 {
    value.as_f64().unwrap_or_default()
}

/// A private registry holding every fixture type in module `demo`
pub fn registry(fx: &Fixtures) -> Arc<ModuleRegistry> {
    let registry = Arc::new(ModuleRegistry::new());
    registry.load(
        Module::new("demo")
            .with_type(fx.base.clone())
            .with_type(fx.derived.clone())
            .with_type(fx.widget.clone())
            .with_type(fx.point.clone())
            .with_type(fx.vector.clone())
            .with_type(fx.calculator.clone())
            .with_type(fx.unmarked.clone()),
    );
    registry
}

/// Fresh fixtures and a reflector over them
pub fn setup(policy: CodegenPolicy) -> (Reflector, Fixtures) {
    let fx = fixtures();
    let config = ReflectConfig::default().with_codegen(policy);
    (Reflector::new(registry(&fx), config), fx)
}
