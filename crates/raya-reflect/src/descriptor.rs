//! Member descriptors
//!
//! A [`MemberDescriptor`] is the immutable, cached result of a member
//! lookup. It names its declaring type and the position of the definition
//! in that type, so two descriptors for the same member compare equal no
//! matter which lookup produced them.

use std::fmt;
use std::sync::Arc;

use raya_meta::{
    AttributeSet, ClassId, ConstructorDef, FieldDef, MethodDef, PropertyDef, TypeDef, TypeRef,
    Visibility,
};

/// Kind of member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Instance or static field
    Field,
    /// Property with native accessors
    Property,
    /// Method
    Method,
    /// Constructor
    Constructor,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MemberKind::Field => "field",
            MemberKind::Property => "property",
            MemberKind::Method => "method",
            MemberKind::Constructor => "constructor",
        };
        write!(f, "{}", name)
    }
}

/// Identity of a member: declaring class, kind and definition index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberId {
    /// Declaring class
    pub class: ClassId,
    /// Member kind
    pub kind: MemberKind,
    /// Index into the declaring class's definitions of that kind
    pub index: usize,
}

/// Resolved member metadata
pub struct MemberDescriptor {
    declaring: Arc<TypeDef>,
    kind: MemberKind,
    index: usize,
    name: Arc<str>,
    is_static: bool,
    visibility: Visibility,
    value_type: TypeRef,
    params: Vec<TypeRef>,
}

/// Candidate set returned for overloadable members
pub type MemberGroup = Arc<[Arc<MemberDescriptor>]>;

/// Name under which constructors are cached and reported
pub const CONSTRUCTOR_NAME: &str = ".ctor";

impl MemberDescriptor {
    pub(crate) fn field(declaring: &Arc<TypeDef>, index: usize) -> Self {
        let def = &declaring.fields()[index];
        Self {
            declaring: declaring.clone(),
            kind: MemberKind::Field,
            index,
            name: def.name.clone(),
            is_static: def.is_static,
            visibility: def.visibility,
            value_type: def.ty.clone(),
            params: Vec::new(),
        }
    }

    pub(crate) fn property(declaring: &Arc<TypeDef>, index: usize) -> Self {
        let def = &declaring.properties()[index];
        Self {
            declaring: declaring.clone(),
            kind: MemberKind::Property,
            index,
            name: def.name.clone(),
            is_static: def.is_static,
            visibility: def.visibility,
            value_type: def.ty.clone(),
            params: Vec::new(),
        }
    }

    pub(crate) fn method(declaring: &Arc<TypeDef>, index: usize) -> Self {
        let def = &declaring.methods()[index];
        Self {
            declaring: declaring.clone(),
            kind: MemberKind::Method,
            index,
            name: def.name.clone(),
            is_static: def.is_static,
            visibility: def.visibility,
            value_type: def.return_type.clone(),
            params: def.params.clone(),
        }
    }

    pub(crate) fn constructor(declaring: &Arc<TypeDef>, index: usize) -> Self {
        let def = &declaring.constructors()[index];
        Self {
            declaring: declaring.clone(),
            kind: MemberKind::Constructor,
            index,
            name: Arc::from(CONSTRUCTOR_NAME),
            is_static: false,
            visibility: def.visibility,
            value_type: declaring.type_ref(),
            params: def.params.clone(),
        }
    }

    /// Member identity
    pub fn id(&self) -> MemberId {
        MemberId {
            class: self.declaring.id(),
            kind: self.kind,
            index: self.index,
        }
    }

    /// Declaring type (the level of the hierarchy that defines the member)
    pub fn declaring_type(&self) -> &Arc<TypeDef> {
        &self.declaring
    }

    /// Member kind
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Definition index within the declaring type
    pub fn index(&self) -> usize {
        self.index
    }

    /// Member name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the member is static
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Field/property type, method return type, or the constructed type
    pub fn value_type(&self) -> &TypeRef {
        &self.value_type
    }

    /// Ordered parameter types (methods and constructors)
    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    /// Qualified `Type.member` label for diagnostics
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.declaring.full_name(), self.name)
    }

    /// Field definition, for field descriptors
    pub fn field_def(&self) -> Option<&FieldDef> {
        match self.kind {
            MemberKind::Field => self.declaring.fields().get(self.index),
            _ => None,
        }
    }

    /// Property definition, for property descriptors
    pub fn property_def(&self) -> Option<&PropertyDef> {
        match self.kind {
            MemberKind::Property => self.declaring.properties().get(self.index),
            _ => None,
        }
    }

    /// Method definition, for method descriptors
    pub fn method_def(&self) -> Option<&MethodDef> {
        match self.kind {
            MemberKind::Method => self.declaring.methods().get(self.index),
            _ => None,
        }
    }

    /// Constructor definition, for constructor descriptors
    pub fn constructor_def(&self) -> Option<&ConstructorDef> {
        match self.kind {
            MemberKind::Constructor => self.declaring.constructors().get(self.index),
            _ => None,
        }
    }

    /// Attributes attached to the member
    pub fn attributes(&self) -> &AttributeSet {
        match self.kind {
            MemberKind::Field => &self.declaring.fields()[self.index].attributes,
            MemberKind::Property => &self.declaring.properties()[self.index].attributes,
            MemberKind::Method => &self.declaring.methods()[self.index].attributes,
            MemberKind::Constructor => &self.declaring.constructors()[self.index].attributes,
        }
    }

    /// Whether values can be read through an accessor
    pub fn is_readable(&self) -> bool {
        match self.kind {
            MemberKind::Field => true,
            MemberKind::Property => self.property_def().is_some_and(|p| p.getter.is_some()),
            MemberKind::Method | MemberKind::Constructor => false,
        }
    }

    /// Whether values can be written through an accessor
    pub fn is_writable(&self) -> bool {
        match self.kind {
            MemberKind::Field => self.field_def().is_some_and(|f| !f.is_readonly),
            MemberKind::Property => self.property_def().is_some_and(|p| p.setter.is_some()),
            MemberKind::Method | MemberKind::Constructor => false,
        }
    }
}

impl PartialEq for MemberDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for MemberDescriptor {}

impl std::hash::Hash for MemberDescriptor {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("member", &self.qualified_name())
            .field("kind", &self.kind)
            .field("is_static", &self.is_static)
            .field("visibility", &self.visibility)
            .field("value_type", &self.value_type)
            .field("params", &self.params)
            .finish()
    }
}
