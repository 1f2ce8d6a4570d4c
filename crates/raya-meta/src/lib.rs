//! Raya Meta - the host object model
//!
//! This crate defines the runtime type system that `raya-reflect` looks
//! members up in:
//! - **Values**: dynamically typed [`Value`]s and declared [`TypeRef`]s
//! - **Types**: immutable [`TypeDef`]s built with [`TypeBuilder`], carrying
//!   fields, properties, methods, constructors and attributes
//! - **Instances**: slot-based [`Instance`] objects
//! - **Modules**: named sets of types held by a [`ModuleRegistry`]
//!
//! # Example
//!
//! ```rust,ignore
//! use raya_meta::{FieldDef, Instance, Module, ModuleRegistry, TypeBuilder, TypeRef};
//!
//! let widget = TypeBuilder::new("ui.Widget")
//!     .field(FieldDef::new("Count", TypeRef::I32).initial_value(5))
//!     .build();
//! ModuleRegistry::global().load(Module::new("ui").with_type(widget.clone()));
//!
//! let obj = Instance::new(&widget);
//! assert_eq!(obj.get_field("Count"), Some(5.into()));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod class;
pub mod error;
pub mod members;
pub mod module;
pub mod object;
pub mod types;
pub mod value;

pub use class::{TypeBuilder, TypeDef};
pub use error::Exception;
pub use members::{
    Attribute, AttributeSet, ConstructorDef, FieldDef, MethodDef, NativeConstructor, NativeGetter,
    NativeMethod, NativeSetter, PropertyDef,
};
pub use module::{Module, ModuleId, ModuleRegistry};
pub use object::{Instance, ObjectRef};
pub use types::{ClassId, ClassRef, TypeRef, Visibility, ANY_CONVERSION_COST};
pub use value::{ArgType, Value};
