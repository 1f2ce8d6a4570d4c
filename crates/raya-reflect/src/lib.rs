//! Raya Reflect - cached reflective member access
//!
//! Looks up types, fields, properties, methods, constructors and attributes
//! of the [`raya_meta`] object model by name, and caches every result:
//! - **Types**: [`TypeResolver`] scans each loaded module once
//! - **Members**: [`MemberCache`] walks the inheritance chain, most-derived
//!   member first
//! - **Attributes**: [`AttributeCache`] remembers absent results too
//! - **Accessors**: [`AccessorFactory`] builds getters and setters, compiled
//!   when the [`CapabilityProbe`] allows it and raw-introspection otherwise
//! - **Construction and calls**: [`InstanceFactory`] and
//!   [`InvocationDispatcher`] pick overloads by conversion cost
//!
//! All caches are safe to share between threads. Concurrent first lookups
//! of one key may compute twice; every caller receives the single
//! published result. [`Reflector`] ties the caches together.
//!
//! # Example
//!
//! ```rust,ignore
//! use raya_meta::{FieldDef, Module, ModuleRegistry, TypeBuilder, TypeRef};
//! use raya_reflect::Reflector;
//!
//! let registry = std::sync::Arc::new(ModuleRegistry::new());
//! registry.load(Module::new("ui").with_type(
//!     TypeBuilder::new("ui.Widget")
//!         .field(FieldDef::new("Count", TypeRef::I32).initial_value(5))
//!         .build(),
//! ));
//!
//! let reflector = Reflector::with_registry(registry);
//! let widget = reflector.resolve_type("ui.Widget")?;
//! let obj = reflector.create_instance(&widget, vec![])?;
//! let count = reflector.create_getter::<i32>(&widget, "Count")?;
//! assert_eq!(count(&obj.into())?, 5);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod accessor;
pub mod attributes;
pub mod cache;
pub mod capability;
pub mod config;
pub mod convert;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod factory;
pub mod members;
mod overload;
pub mod reflector;
pub mod resolver;
pub mod scope;
pub mod synth;

pub use accessor::{AccessorEntry, AccessorFactory, Accessors, Getter, Setter};
pub use attributes::{AttributeCache, AttributeTarget};
pub use cache::CacheStats;
pub use capability::{CapabilityProbe, CapabilityState};
pub use config::{CodegenPolicy, ReflectConfig};
pub use convert::{FromValue, IntoValue};
pub use descriptor::{MemberDescriptor, MemberGroup, MemberId, MemberKind, CONSTRUCTOR_NAME};
pub use dispatch::{InvocationDispatcher, MethodBinding};
pub use error::{ConfigError, ReflectError, ReflectResult};
pub use factory::{ConstructorBinding, InstanceFactory};
pub use members::MemberCache;
pub use reflector::{Reflector, ReflectorStats};
pub use resolver::TypeResolver;
pub use scope::BindingScope;
pub use synth::{ConstructorInvoker, DynGetter, DynSetter, MethodInvoker};
