//! Object instances

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::class::TypeDef;
use crate::value::Value;

/// Global counter for generating unique object IDs
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Shared handle to an instance
pub type ObjectRef = Arc<Instance>;

/// Object instance (heap-allocated)
pub struct Instance {
    id: u64,
    class: Arc<TypeDef>,
    slots: RwLock<Vec<Value>>,
}

impl Instance {
    /// Allocate an instance of `class` with every field at its initial value.
    ///
    /// No constructor runs; use the reflector's instance factory for that.
    pub fn new(class: &Arc<TypeDef>) -> ObjectRef {
        let mut slots = vec![Value::Null; class.instance_slot_count()];
        for level in class.ancestors() {
            for field in level.fields().iter().filter(|f| !f.is_static) {
                slots[field.slot()] = field.initial();
            }
        }
        Arc::new(Self {
            id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
            class: class.clone(),
            slots: RwLock::new(slots),
        })
    }

    /// Unique object ID
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Runtime (most-derived) class
    pub fn class(&self) -> &Arc<TypeDef> {
        &self.class
    }

    /// Get a slot value by index
    pub fn get_slot(&self, slot: usize) -> Option<Value> {
        self.slots.read().get(slot).cloned()
    }

    /// Set a slot value by index
    pub fn set_slot(&self, slot: usize, value: Value) -> Result<(), String> {
        let mut slots = self.slots.write();
        let len = slots.len();
        match slots.get_mut(slot) {
            Some(entry) => {
                *entry = value;
                Ok(())
            }
            None => Err(format!(
                "Slot index {} out of bounds (object has {} slots)",
                slot, len
            )),
        }
    }

    /// Read the most-derived instance field called `name`
    pub fn get_field(&self, name: &str) -> Option<Value> {
        let field = self.class.find_instance_field(name)?;
        self.get_slot(field.slot())
    }

    /// Write the most-derived instance field called `name`, widening the
    /// value to the field's declared type
    pub fn set_field(&self, name: &str, value: impl Into<Value>) -> Result<(), String> {
        let field = self
            .class
            .find_instance_field(name)
            .ok_or_else(|| format!("{} has no field '{}'", self.class.full_name(), name))?;
        let coerced = field.ty.coerce(value.into()).map_err(|rejected| {
            format!(
                "Cannot store {} in field '{}' of type {}",
                rejected.type_name(),
                name,
                field.ty
            )
        })?;
        self.set_slot(field.slot(), coerced)
    }

    /// Number of slots
    pub fn slot_count(&self) -> usize {
        self.slots.read().len()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("class", &self.class.full_name())
            .field("slots", &*self.slots.read())
            .finish()
    }
}
