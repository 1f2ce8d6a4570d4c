//! Capability probe
//!
//! Decides once whether compiled accessors may be synthesized. The state
//! only moves forward: `Unprobed → Probing → CodegenAvailable |
//! CodegenUnavailable`, and the terminal state holds for the life of the
//! probe. Concurrent first callers block on the single probe run and all
//! observe its outcome.
//!
//! An unavailable outcome is not an error: accessors fall back to raw
//! introspection, which behaves identically and is only slower.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use raya_meta::{FieldDef, Instance, TypeBuilder, TypeRef, Value};
use tracing::debug;

use crate::config::CodegenPolicy;
use crate::descriptor::MemberDescriptor;
use crate::synth::compiled;

/// Probe state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CapabilityState {
    /// Nobody has asked yet
    Unprobed = 0,
    /// The probe is running
    Probing = 1,
    /// Compiled accessors are in use
    CodegenAvailable = 2,
    /// Raw-introspection accessors are in use
    CodegenUnavailable = 3,
}

impl CapabilityState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => CapabilityState::Unprobed,
            1 => CapabilityState::Probing,
            2 => CapabilityState::CodegenAvailable,
            _ => CapabilityState::CodegenUnavailable,
        }
    }

    /// Whether the probe has finished
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CapabilityState::CodegenAvailable | CapabilityState::CodegenUnavailable
        )
    }
}

/// One-shot codegen capability probe
pub struct CapabilityProbe {
    policy: CodegenPolicy,
    state: AtomicU8,
    outcome: OnceCell<bool>,
}

impl CapabilityProbe {
    /// Create an unprobed probe
    pub fn new(policy: CodegenPolicy) -> Self {
        Self {
            policy,
            state: AtomicU8::new(CapabilityState::Unprobed as u8),
            outcome: OnceCell::new(),
        }
    }

    /// Configured policy
    pub fn policy(&self) -> CodegenPolicy {
        self.policy
    }

    /// Current state, without triggering the probe
    pub fn state(&self) -> CapabilityState {
        CapabilityState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whether compiled accessors may be used, probing on first call
    pub fn codegen_available(&self) -> bool {
        *self.outcome.get_or_init(|| {
            self.state
                .store(CapabilityState::Probing as u8, Ordering::Release);
            let available = match self.policy {
                CodegenPolicy::Enabled => true,
                CodegenPolicy::Disabled => false,
                CodegenPolicy::Auto => trial_synthesis(),
            };
            let terminal = if available {
                CapabilityState::CodegenAvailable
            } else {
                CapabilityState::CodegenUnavailable
            };
            self.state.store(terminal as u8, Ordering::Release);
            debug!(policy = ?self.policy, state = ?terminal, "capability probe finished");
            available
        })
    }
}

impl fmt::Debug for CapabilityProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityProbe")
            .field("policy", &self.policy)
            .field("state", &self.state())
            .finish()
    }
}

/// Synthesize a compiled getter/setter pair for a throwaway type and run
/// it. Any panic or wrong result means the environment cannot be trusted
/// with compiled accessors.
fn trial_synthesis() -> bool {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let probe_type = TypeBuilder::new("$reflect.Probe")
            .field(FieldDef::new("value", TypeRef::I32))
            .build();
        let descriptor = Arc::new(MemberDescriptor::field(&probe_type, 0));
        let (Some(getter), Some(setter)) = (
            compiled::getter(&descriptor),
            compiled::setter(&descriptor),
        ) else {
            return false;
        };

        let target = Value::Object(Instance::new(&probe_type));
        setter(&target, Value::I32(42)).is_ok()
            && matches!(getter(&target), Ok(Value::I32(42)))
    }));
    outcome.unwrap_or(false)
}
