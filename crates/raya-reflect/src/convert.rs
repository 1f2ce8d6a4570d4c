//! Conversions between [`Value`] and Rust types for typed accessors

use std::sync::Arc;

use raya_meta::{ObjectRef, TypeRef, Value};

/// Types a typed getter can produce
pub trait FromValue: Sized + Send + Sync + 'static {
    /// Convert a value read from a member, handing it back when it does
    /// not convert
    fn from_value(value: Value) -> Result<Self, Value>;

    /// Whether every value a member of type `ty` can hold converts to `Self`
    fn readable_from(ty: &TypeRef) -> bool;

    /// Label used in type-mismatch errors
    fn type_label() -> &'static str;
}

/// Types a typed setter can accept
pub trait IntoValue: Send + Sync + 'static {
    /// Convert to a value to store
    fn into_value(self) -> Value;

    /// Whether values of `Self` may be stored in a member of type `ty`.
    /// Object references are checked again against the runtime class on
    /// every write.
    fn writable_to(ty: &TypeRef) -> bool;
}

macro_rules! impl_numeric {
    ($t:ty, $label:literal, $get:ident, $variant:ident, [$($reads:ident),*], [$($writes:ident),*]) => {
        impl FromValue for $t {
            fn from_value(value: Value) -> Result<Self, Value> {
                value.$get().ok_or(value)
            }

            fn readable_from(ty: &TypeRef) -> bool {
                matches!(ty, $(TypeRef::$reads)|*)
            }

            fn type_label() -> &'static str {
                $label
            }
        }

        impl IntoValue for $t {
            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn writable_to(ty: &TypeRef) -> bool {
                matches!(ty, TypeRef::Any $(| TypeRef::$writes)*)
            }
        }
    };
}

impl_numeric!(i32, "i32", as_i32, I32, [I32], [I32, I64, F64]);
impl_numeric!(i64, "i64", as_i64, I64, [I32, I64], [I64, F64]);
impl_numeric!(f64, "f64", as_f64, F64, [I32, I64, F64], [F64]);
impl_numeric!(bool, "bool", as_bool, Bool, [Bool], [Bool]);

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, Value> {
        value.as_str().map(str::to_string).ok_or(value)
    }

    fn readable_from(ty: &TypeRef) -> bool {
        matches!(ty, TypeRef::String)
    }

    fn type_label() -> &'static str {
        "string"
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn writable_to(ty: &TypeRef) -> bool {
        matches!(ty, TypeRef::Any | TypeRef::String)
    }
}

impl FromValue for Arc<str> {
    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(other),
        }
    }

    fn readable_from(ty: &TypeRef) -> bool {
        matches!(ty, TypeRef::String)
    }

    fn type_label() -> &'static str {
        "string"
    }
}

impl IntoValue for Arc<str> {
    fn into_value(self) -> Value {
        Value::Str(self)
    }

    fn writable_to(ty: &TypeRef) -> bool {
        matches!(ty, TypeRef::Any | TypeRef::String)
    }
}

impl FromValue for ObjectRef {
    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Object(obj) => Ok(obj),
            other => Err(other),
        }
    }

    fn readable_from(ty: &TypeRef) -> bool {
        matches!(ty, TypeRef::Class(_))
    }

    fn type_label() -> &'static str {
        "object"
    }
}

impl IntoValue for ObjectRef {
    fn into_value(self) -> Value {
        Value::Object(self)
    }

    fn writable_to(ty: &TypeRef) -> bool {
        matches!(ty, TypeRef::Any | TypeRef::Class(_))
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, Value> {
        Ok(value)
    }

    fn readable_from(_ty: &TypeRef) -> bool {
        true
    }

    fn type_label() -> &'static str {
        "value"
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }

    fn writable_to(ty: &TypeRef) -> bool {
        !matches!(ty, TypeRef::Void)
    }
}
