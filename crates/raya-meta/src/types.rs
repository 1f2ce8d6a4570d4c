//! Declared types, class identity and member visibility

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::value::Value;

/// Global counter for generating unique class IDs
static NEXT_CLASS_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a class for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u64);

impl ClassId {
    /// Allocate a fresh class ID
    pub fn next() -> Self {
        ClassId(NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric ID
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Reference to a class by identity, usable before the class is built
/// (a class may declare a field of its own type).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassRef {
    /// Class identity
    pub id: ClassId,
    /// Qualified class name (for diagnostics)
    pub name: Arc<str>,
}

/// Declared type of a field, property, parameter or return value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// Accepts any value
    Any,
    /// No value (method return only)
    Void,
    /// `bool`
    Bool,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `f64`
    F64,
    /// `string`
    String,
    /// Instance of the class or one of its subclasses
    Class(ClassRef),
}

/// Cost of passing a value to a parameter typed `Any`. Overload ranking
/// keeps `Any` parameters in a tier of their own, below every typed match.
pub const ANY_CONVERSION_COST: u32 = 4;

impl TypeRef {
    /// Zero value used to initialise slots of this type
    pub fn default_value(&self) -> Value {
        match self {
            TypeRef::Bool => Value::Bool(false),
            TypeRef::I32 => Value::I32(0),
            TypeRef::I64 => Value::I64(0),
            TypeRef::F64 => Value::F64(0.0),
            TypeRef::Any | TypeRef::Void | TypeRef::String | TypeRef::Class(_) => Value::Null,
        }
    }

    /// Check if this type holds references (and therefore accepts null)
    pub fn is_reference(&self) -> bool {
        matches!(self, TypeRef::Any | TypeRef::String | TypeRef::Class(_))
    }

    /// Cost of converting `value` to this type.
    ///
    /// `Some(0)` is an exact match, `Some(n)` an implicit widening of
    /// distance `n`, and `None` means the value is not assignable.
    pub fn conversion_cost(&self, value: &Value) -> Option<u32> {
        match (self, value) {
            (TypeRef::Any, _) => Some(ANY_CONVERSION_COST),
            (TypeRef::Void, _) => None,
            (TypeRef::Bool, Value::Bool(_)) => Some(0),
            (TypeRef::I32, Value::I32(_)) => Some(0),
            (TypeRef::I64, Value::I64(_)) => Some(0),
            (TypeRef::I64, Value::I32(_)) => Some(1),
            (TypeRef::F64, Value::F64(_)) => Some(0),
            (TypeRef::F64, Value::I64(_)) => Some(1),
            (TypeRef::F64, Value::I32(_)) => Some(2),
            (TypeRef::String, Value::Str(_)) => Some(0),
            (TypeRef::String | TypeRef::Class(_), Value::Null) => Some(1),
            (TypeRef::Class(class), Value::Object(obj)) => obj.class().distance_to(class.id),
            _ => None,
        }
    }

    /// Check if `value` can be stored in a slot of this type
    pub fn accepts(&self, value: &Value) -> bool {
        self.conversion_cost(value).is_some()
    }

    /// Convert `value` to this type, applying numeric widening.
    ///
    /// A value that is not assignable is handed back as the error.
    pub fn coerce(&self, value: Value) -> Result<Value, Value> {
        if self.conversion_cost(&value).is_none() {
            return Err(value);
        }
        Ok(match (self, value) {
            (TypeRef::I64, Value::I32(v)) => Value::I64(v as i64),
            (TypeRef::F64, Value::I32(v)) => Value::F64(v as f64),
            (TypeRef::F64, Value::I64(v)) => Value::F64(v as f64),
            (_, v) => v,
        })
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Any => write!(f, "any"),
            TypeRef::Void => write!(f, "void"),
            TypeRef::Bool => write!(f, "bool"),
            TypeRef::I32 => write!(f, "i32"),
            TypeRef::I64 => write!(f, "i64"),
            TypeRef::F64 => write!(f, "f64"),
            TypeRef::String => write!(f, "string"),
            TypeRef::Class(class) => write!(f, "{}", class.name),
        }
    }
}

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Visible everywhere
    #[default]
    Public,
    /// Visible to the declaring class and its subclasses
    Protected,
    /// Visible to the declaring class only
    Private,
}

impl Visibility {
    /// Check for public visibility
    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}
