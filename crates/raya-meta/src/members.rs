//! Member definitions: fields, properties, methods, constructors and the
//! attributes attached to them.
//!
//! Definitions are created with consuming builder methods and handed to a
//! [`TypeBuilder`](crate::TypeBuilder), which assigns storage slots and
//! freezes them into an immutable [`TypeDef`](crate::TypeDef).

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::error::Exception;
use crate::object::ObjectRef;
use crate::types::{TypeRef, Visibility};
use crate::value::Value;

/// Native method body: `(this, args) -> result`. `this` is `Null` for static methods.
pub type NativeMethod = Arc<dyn Fn(&Value, &[Value]) -> Result<Value, Exception> + Send + Sync>;

/// Native property getter: `(this) -> value`
pub type NativeGetter = Arc<dyn Fn(&Value) -> Result<Value, Exception> + Send + Sync>;

/// Native property setter: `(this, value)`
pub type NativeSetter = Arc<dyn Fn(&Value, Value) -> Result<(), Exception> + Send + Sync>;

/// Native constructor body, run on a freshly allocated instance
pub type NativeConstructor =
    Arc<dyn Fn(&ObjectRef, &[Value]) -> Result<(), Exception> + Send + Sync>;

// ============================================================================
// Attributes
// ============================================================================

/// Metadata that can be attached to types and members.
///
/// `INHERITED = false` keeps the attribute from being found through the
/// ancestor chain of a type or the overridden chain of a member.
pub trait Attribute: Any + Send + Sync {
    /// Whether lookups that include inherited attributes may find this one
    const INHERITED: bool = true;
}

/// Attribute instances attached to one type or member
#[derive(Clone, Default)]
pub struct AttributeSet {
    entries: Vec<(Arc<dyn Any + Send + Sync>, bool)>,
}

impl AttributeSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an attribute
    pub fn push<A: Attribute>(&mut self, attribute: A) {
        self.entries.push((Arc::new(attribute), A::INHERITED));
    }

    /// Find the first attribute of type `A`
    pub fn find<A: Attribute>(&self) -> Option<Arc<A>> {
        self.find_raw(TypeId::of::<A>(), false)
            .and_then(|found| found.downcast::<A>().ok())
    }

    /// Find the first attribute whose concrete type is `type_id`.
    ///
    /// With `inherited_only`, attributes declared non-inheritable are skipped.
    pub fn find_raw(
        &self,
        type_id: TypeId,
        inherited_only: bool,
    ) -> Option<Arc<dyn Any + Send + Sync>> {
        self.entries
            .iter()
            .find(|(attr, inherited)| (**attr).type_id() == type_id && (*inherited || !inherited_only))
            .map(|(attr, _)| attr.clone())
    }

    /// Number of attached attributes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no attributes are attached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttributeSet({})", self.entries.len())
    }
}

// ============================================================================
// Fields
// ============================================================================

/// Field definition
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name
    pub name: Arc<str>,
    /// Declared type
    pub ty: TypeRef,
    /// Visibility
    pub visibility: Visibility,
    /// Whether the field lives in static storage
    pub is_static: bool,
    /// Whether the field rejects writes through reflection
    pub is_readonly: bool,
    /// Value the slot starts with (the type's default when absent)
    pub initial_value: Option<Value>,
    /// Attached attributes
    pub attributes: AttributeSet,
    pub(crate) slot: usize,
}

impl FieldDef {
    /// Create a public instance field
    pub fn new(name: &str, ty: TypeRef) -> Self {
        Self {
            name: Arc::from(name),
            ty,
            visibility: Visibility::Public,
            is_static: false,
            is_readonly: false,
            initial_value: None,
            attributes: AttributeSet::new(),
            slot: 0,
        }
    }

    /// Set the initial value
    pub fn initial_value(mut self, value: impl Into<Value>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    /// Mark as static field
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as readonly
    pub fn as_readonly(mut self) -> Self {
        self.is_readonly = true;
        self
    }

    /// Set visibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Attach an attribute
    pub fn with_attribute<A: Attribute>(mut self, attribute: A) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Storage slot: an index into instance slots, or into the declaring
    /// type's static storage for static fields
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Value a freshly allocated slot holds
    pub fn initial(&self) -> Value {
        self.initial_value
            .clone()
            .unwrap_or_else(|| self.ty.default_value())
    }
}

// ============================================================================
// Properties
// ============================================================================

/// Property definition backed by native accessors
#[derive(Clone)]
pub struct PropertyDef {
    /// Property name
    pub name: Arc<str>,
    /// Declared type
    pub ty: TypeRef,
    /// Visibility
    pub visibility: Visibility,
    /// Whether the property is static
    pub is_static: bool,
    /// Whether the property overrides an ancestor property of the same name
    pub is_override: bool,
    /// Getter (absent for set-only properties)
    pub getter: Option<NativeGetter>,
    /// Setter (absent for get-only properties)
    pub setter: Option<NativeSetter>,
    /// Attached attributes
    pub attributes: AttributeSet,
}

impl PropertyDef {
    /// Create a public instance property with no accessors
    pub fn new(name: &str, ty: TypeRef) -> Self {
        Self {
            name: Arc::from(name),
            ty,
            visibility: Visibility::Public,
            is_static: false,
            is_override: false,
            getter: None,
            setter: None,
            attributes: AttributeSet::new(),
        }
    }

    /// Set the getter
    pub fn getter<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, Exception> + Send + Sync + 'static,
    {
        self.getter = Some(Arc::new(f));
        self
    }

    /// Set the setter
    pub fn setter<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, Value) -> Result<(), Exception> + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(f));
        self
    }

    /// Mark as static property
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as overriding an ancestor property
    pub fn as_override(mut self) -> Self {
        self.is_override = true;
        self
    }

    /// Set visibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Attach an attribute
    pub fn with_attribute<A: Attribute>(mut self, attribute: A) -> Self {
        self.attributes.push(attribute);
        self
    }
}

impl fmt::Debug for PropertyDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDef")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .field("readable", &self.getter.is_some())
            .field("writable", &self.setter.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Methods
// ============================================================================

/// Method definition backed by a native body
#[derive(Clone)]
pub struct MethodDef {
    /// Method name
    pub name: Arc<str>,
    /// Parameter types, in order
    pub params: Vec<TypeRef>,
    /// Return type
    pub return_type: TypeRef,
    /// Visibility
    pub visibility: Visibility,
    /// Whether the method is static
    pub is_static: bool,
    /// Whether the method overrides an ancestor method with the same signature
    pub is_override: bool,
    /// Implementation
    pub body: NativeMethod,
    /// Attached attributes
    pub attributes: AttributeSet,
}

impl MethodDef {
    /// Create a public instance method taking no parameters and returning `void`
    pub fn new<F>(name: &str, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, Exception> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            params: Vec::new(),
            return_type: TypeRef::Void,
            visibility: Visibility::Public,
            is_static: false,
            is_override: false,
            body: Arc::new(body),
            attributes: AttributeSet::new(),
        }
    }

    /// Append a parameter
    pub fn param(mut self, ty: TypeRef) -> Self {
        self.params.push(ty);
        self
    }

    /// Set the return type
    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.return_type = ty;
        self
    }

    /// Mark as static method
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as overriding an ancestor method
    pub fn as_override(mut self) -> Self {
        self.is_override = true;
        self
    }

    /// Set visibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Attach an attribute
    pub fn with_attribute<A: Attribute>(mut self, attribute: A) -> Self {
        self.attributes.push(attribute);
        self
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("return_type", &self.return_type)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Constructors
// ============================================================================

/// Constructor definition backed by a native body
#[derive(Clone)]
pub struct ConstructorDef {
    /// Parameter types, in order
    pub params: Vec<TypeRef>,
    /// Visibility
    pub visibility: Visibility,
    /// Initialiser run on the new instance
    pub body: NativeConstructor,
    /// Attached attributes
    pub attributes: AttributeSet,
}

impl ConstructorDef {
    /// Create a public constructor taking no parameters
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&ObjectRef, &[Value]) -> Result<(), Exception> + Send + Sync + 'static,
    {
        Self {
            params: Vec::new(),
            visibility: Visibility::Public,
            body: Arc::new(body),
            attributes: AttributeSet::new(),
        }
    }

    /// Append a parameter
    pub fn param(mut self, ty: TypeRef) -> Self {
        self.params.push(ty);
        self
    }

    /// Set visibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Attach an attribute
    pub fn with_attribute<A: Attribute>(mut self, attribute: A) -> Self {
        self.attributes.push(attribute);
        self
    }
}

impl fmt::Debug for ConstructorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDef")
            .field("params", &self.params)
            .field("visibility", &self.visibility)
            .finish_non_exhaustive()
    }
}
