//! Binding scopes
//!
//! A scope selects which members a lookup may see:
//! {public, non-public} × {instance, static} × {declared-only, inherited}.

use std::fmt;
use std::ops::BitOr;

use raya_meta::Visibility;

/// Binding scope flags (bitflags)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingScope(u8);

impl BindingScope {
    /// Nothing matches
    pub const NONE: Self = Self(0x00);
    /// Public members
    pub const PUBLIC: Self = Self(0x01);
    /// Protected and private members
    pub const NON_PUBLIC: Self = Self(0x02);
    /// Instance members
    pub const INSTANCE: Self = Self(0x04);
    /// Static members
    pub const STATIC: Self = Self(0x08);
    /// Only members declared on the search root, not inherited ones
    pub const DECLARED_ONLY: Self = Self(0x10);

    // Common combinations
    /// PUBLIC | INSTANCE | STATIC
    pub const DEFAULT: Self = Self(0x0D);
    /// PUBLIC | NON_PUBLIC | INSTANCE
    pub const ALL_INSTANCE: Self = Self(0x07);
    /// PUBLIC | NON_PUBLIC | STATIC
    pub const ALL_STATIC: Self = Self(0x0B);
    /// PUBLIC | NON_PUBLIC | INSTANCE | STATIC
    pub const ALL: Self = Self(0x0F);

    /// Create from raw bits
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Get raw bits
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Check if the scope contains every flag of `other`
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Union of scopes
    pub const fn union(&self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether the walk continues past the search root
    pub const fn includes_inherited(&self) -> bool {
        !self.contains(Self::DECLARED_ONLY)
    }

    /// Check if a member with this visibility and storage is in scope
    pub fn admits(&self, visibility: Visibility, is_static: bool) -> bool {
        let visible = if visibility.is_public() {
            self.contains(Self::PUBLIC)
        } else {
            self.contains(Self::NON_PUBLIC)
        };
        let storage = if is_static {
            self.contains(Self::STATIC)
        } else {
            self.contains(Self::INSTANCE)
        };
        visible && storage
    }
}

impl Default for BindingScope {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl BitOr for BindingScope {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(BindingScope, &str); 5] = [
            (BindingScope::PUBLIC, "PUBLIC"),
            (BindingScope::NON_PUBLIC, "NON_PUBLIC"),
            (BindingScope::INSTANCE, "INSTANCE"),
            (BindingScope::STATIC, "STATIC"),
            (BindingScope::DECLARED_ONLY, "DECLARED_ONLY"),
        ];
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", names.join(" | "))
        }
    }
}
