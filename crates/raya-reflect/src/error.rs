//! Reflection errors

use std::panic::{self, AssertUnwindSafe};

use raya_meta::Exception;

use crate::descriptor::MemberKind;

/// Result type for reflection operations
pub type ReflectResult<T> = Result<T, ReflectError>;

/// Reflection error kinds. Every kind is a distinct variant so callers can
/// branch on it; none of them is retried internally.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReflectError {
    /// No loaded module defines the requested type name
    #[error("Type not found: {name}")]
    TypeNotFound {
        /// Requested name
        name: String,
    },

    /// No member matches the requested name, scope or arity
    #[error("No {kind} '{member}' on {type_name}")]
    MemberNotFound {
        /// Type searched
        type_name: String,
        /// Member name
        member: String,
        /// Member kind searched for
        kind: MemberKind,
    },

    /// Two or more candidates tie under overload resolution
    #[error("Ambiguous match for {kind} '{member}' on {type_name}: {candidates} candidates tie")]
    AmbiguousMatch {
        /// Type searched
        type_name: String,
        /// Member name
        member: String,
        /// Member kind
        kind: MemberKind,
        /// Number of tied candidates
        candidates: usize,
    },

    /// Value (or target) not assignable to the member's declared type
    #[error("Type mismatch for '{member}': expected {expected}, got {got}")]
    TypeMismatch {
        /// Member being accessed
        member: String,
        /// Expected type
        expected: String,
        /// Supplied type
        got: String,
    },

    /// The invoked member threw
    #[error("'{member}' threw {source}")]
    InvocationTarget {
        /// Member that threw
        member: String,
        /// The original exception
        #[source]
        source: Exception,
    },

    /// A member's storage slot lies outside the object or static storage.
    /// The type layout and the instance disagree; no valid call reaches it.
    #[error("Storage slot for '{member}' is out of range: {message}")]
    SlotOutOfRange {
        /// Member being accessed
        member: String,
        /// Slot diagnostics from the object model
        message: String,
    },

    /// The member exists but does not support the requested access
    /// (writing a readonly field, reading a set-only property)
    #[error("{kind} '{member}' on {type_name} does not support {access}")]
    UnsupportedAccess {
        /// Declaring type
        type_name: String,
        /// Member name
        member: String,
        /// Member kind
        kind: MemberKind,
        /// The refused access
        access: &'static str,
    },
}

impl ReflectError {
    /// Build a [`ReflectError::TypeMismatch`]
    pub fn mismatch(member: &str, expected: impl ToString, got: impl ToString) -> Self {
        ReflectError::TypeMismatch {
            member: member.to_string(),
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }

    /// Build a [`ReflectError::MemberNotFound`]
    pub fn not_found(type_name: &str, member: &str, kind: MemberKind) -> Self {
        ReflectError::MemberNotFound {
            type_name: type_name.to_string(),
            member: member.to_string(),
            kind,
        }
    }
}

/// Run a member body, surfacing both returned exceptions and panics as
/// [`ReflectError::InvocationTarget`].
pub(crate) fn guard<T>(
    member: &str,
    body: impl FnOnce() -> Result<T, Exception>,
) -> ReflectResult<T> {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(ReflectError::InvocationTarget {
            member: member.to_string(),
            source,
        }),
        Err(payload) => Err(ReflectError::InvocationTarget {
            member: member.to_string(),
            source: Exception::from_panic(payload.as_ref()),
        }),
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Malformed TOML
    #[error("Invalid reflect configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Unknown codegen policy name
    #[error("Unknown codegen policy '{0}' (expected auto, enabled or disabled)")]
    UnknownPolicy(String),
}
