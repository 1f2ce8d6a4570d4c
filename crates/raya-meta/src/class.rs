//! Type definitions and the builder that freezes them
//!
//! A [`TypeDef`] is immutable once built, apart from its static field
//! storage. Instance fields are laid out root-first: a subclass's own
//! fields follow every inherited slot, so a field that shadows an
//! ancestor field of the same name occupies a distinct slot.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Exception;
use crate::members::{Attribute, AttributeSet, ConstructorDef, FieldDef, MethodDef, PropertyDef};
use crate::types::{ClassId, ClassRef, TypeRef, Visibility};
use crate::value::Value;

/// Class definition metadata
pub struct TypeDef {
    id: ClassId,
    full_name: Arc<str>,
    parent: Option<Arc<TypeDef>>,
    is_abstract: bool,
    fields: Vec<FieldDef>,
    properties: Vec<PropertyDef>,
    methods: Vec<MethodDef>,
    constructors: Vec<ConstructorDef>,
    attributes: AttributeSet,
    /// Number of instance slots, including inherited ones
    instance_slot_count: usize,
    /// Static fields (class-level, shared across all instances)
    statics: RwLock<Vec<Value>>,
}

impl TypeDef {
    /// Unique class identity
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Qualified name, e.g. `geo.Point`
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Simple name (the segment after the last `.`)
    pub fn name(&self) -> &str {
        self.full_name
            .rsplit_once('.')
            .map_or(&*self.full_name, |(_, name)| name)
    }

    /// Namespace (everything before the last `.`), empty for root names
    pub fn namespace(&self) -> &str {
        self.full_name.rsplit_once('.').map_or("", |(ns, _)| ns)
    }

    /// Parent class, if any
    pub fn parent(&self) -> Option<&Arc<TypeDef>> {
        self.parent.as_ref()
    }

    /// Whether the class cannot be instantiated
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Fields declared on this class (not inherited)
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Properties declared on this class
    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    /// Methods declared on this class
    pub fn methods(&self) -> &[MethodDef] {
        &self.methods
    }

    /// Constructors declared on this class
    pub fn constructors(&self) -> &[ConstructorDef] {
        &self.constructors
    }

    /// Attributes attached to the class itself
    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Total instance slots, including inherited fields
    pub fn instance_slot_count(&self) -> usize {
        self.instance_slot_count
    }

    /// Reference to this class usable in declared types
    pub fn class_ref(&self) -> ClassRef {
        ClassRef {
            id: self.id,
            name: self.full_name.clone(),
        }
    }

    /// Declared type accepting instances of this class
    pub fn type_ref(&self) -> TypeRef {
        TypeRef::Class(self.class_ref())
    }

    /// The inheritance chain, starting with this class and ending at the root
    pub fn ancestors(&self) -> impl Iterator<Item = &TypeDef> {
        std::iter::successors(Some(self), |ty| ty.parent.as_deref())
    }

    /// Number of inheritance steps from this class up to `ancestor`, or
    /// `None` when `ancestor` is not in the chain
    pub fn distance_to(&self, ancestor: ClassId) -> Option<u32> {
        self.ancestors()
            .position(|ty| ty.id == ancestor)
            .map(|depth| depth as u32)
    }

    /// Check if this class is `ancestor` or derives from it
    pub fn is_subclass_of(&self, ancestor: ClassId) -> bool {
        self.distance_to(ancestor).is_some()
    }

    /// Field declared at this level with the given name
    pub fn declared_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| &*f.name == name)
    }

    /// Property declared at this level with the given name
    pub fn declared_property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| &*p.name == name)
    }

    /// Most-derived instance field with the given name
    pub fn find_instance_field(&self, name: &str) -> Option<&FieldDef> {
        self.ancestors()
            .flat_map(|ty| ty.fields.iter())
            .find(|f| !f.is_static && &*f.name == name)
    }

    /// Read a static field slot
    pub fn static_value(&self, slot: usize) -> Option<Value> {
        self.statics.read().get(slot).cloned()
    }

    /// Write a static field slot
    pub fn set_static_value(&self, slot: usize, value: Value) -> Result<(), String> {
        let mut statics = self.statics.write();
        match statics.get_mut(slot) {
            Some(entry) => {
                *entry = value;
                Ok(())
            }
            None => Err(format!(
                "Static slot {} out of bounds ({} has {} static fields)",
                slot,
                self.full_name,
                statics.len()
            )),
        }
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("id", &self.id)
            .field("full_name", &self.full_name)
            .field("parent", &self.parent.as_ref().map(|p| p.full_name()))
            .field("fields", &self.fields.len())
            .field("properties", &self.properties.len())
            .field("methods", &self.methods.len())
            .field("constructors", &self.constructors.len())
            .finish()
    }
}

/// Builder for [`TypeDef`]
pub struct TypeBuilder {
    id: ClassId,
    full_name: Arc<str>,
    parent: Option<Arc<TypeDef>>,
    is_abstract: bool,
    fields: Vec<FieldDef>,
    properties: Vec<PropertyDef>,
    methods: Vec<MethodDef>,
    constructors: Vec<ConstructorDef>,
    attributes: AttributeSet,
}

impl TypeBuilder {
    /// Start a new root class
    pub fn new(full_name: &str) -> Self {
        Self {
            id: ClassId::next(),
            full_name: Arc::from(full_name),
            parent: None,
            is_abstract: false,
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            attributes: AttributeSet::new(),
        }
    }

    /// Set the parent class
    pub fn extends(mut self, parent: &Arc<TypeDef>) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Mark the class abstract
    pub fn as_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Add a field
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a property
    pub fn property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    /// Add a property backed by a private field named `<name>`
    pub fn auto_property(mut self, name: &str, ty: TypeRef) -> Self {
        let slot = self.next_instance_slot();
        let backing = format!("<{}>", name);
        self.fields
            .push(FieldDef::new(&backing, ty.clone()).visibility(Visibility::Private));

        let read_name: Arc<str> = Arc::from(name);
        let write_name = read_name.clone();
        let property = PropertyDef::new(name, ty)
            .getter(move |this| {
                this.as_object()
                    .and_then(|obj| obj.get_slot(slot))
                    .ok_or_else(|| {
                        Exception::argument(format!("{} read on a non-instance", read_name))
                    })
            })
            .setter(move |this, value| {
                let obj = this.as_object().ok_or_else(|| {
                    Exception::argument(format!("{} written on a non-instance", write_name))
                })?;
                obj.set_slot(slot, value).map_err(Exception::argument)
            });
        self.properties.push(property);
        self
    }

    /// Add a method
    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    /// Add a constructor
    pub fn constructor(mut self, constructor: ConstructorDef) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Attach an attribute to the class
    pub fn attribute<A: Attribute>(mut self, attribute: A) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Reference to the class being built, for self-typed members
    pub fn class_ref(&self) -> ClassRef {
        ClassRef {
            id: self.id,
            name: self.full_name.clone(),
        }
    }

    /// Slot the next instance field added to this builder will occupy
    pub fn next_instance_slot(&self) -> usize {
        let inherited = self.parent.as_ref().map_or(0, |p| p.instance_slot_count);
        inherited + self.fields.iter().filter(|f| !f.is_static).count()
    }

    /// Slot of the most-derived instance field called `name`, looking at
    /// fields added so far and then the parent chain
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        let inherited = self.parent.as_ref().map_or(0, |p| p.instance_slot_count);
        let own = self
            .fields
            .iter()
            .filter(|f| !f.is_static)
            .position(|f| &*f.name == name)
            .map(|index| inherited + index);
        own.or_else(|| {
            self.parent
                .as_ref()
                .and_then(|p| p.find_instance_field(name))
                .map(|f| f.slot)
        })
    }

    /// Assign storage slots and freeze the definition
    pub fn build(self) -> Arc<TypeDef> {
        let mut next_instance = self.parent.as_ref().map_or(0, |p| p.instance_slot_count);
        let mut statics = Vec::new();
        let mut fields = self.fields;
        for field in fields.iter_mut() {
            if field.is_static {
                field.slot = statics.len();
                statics.push(field.initial());
            } else {
                field.slot = next_instance;
                next_instance += 1;
            }
        }

        Arc::new(TypeDef {
            id: self.id,
            full_name: self.full_name,
            parent: self.parent,
            is_abstract: self.is_abstract,
            fields,
            properties: self.properties,
            methods: self.methods,
            constructors: self.constructors,
            attributes: self.attributes,
            instance_slot_count: next_instance,
            statics: RwLock::new(statics),
        })
    }
}
