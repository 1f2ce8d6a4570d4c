//! Reflector configuration
//!
//! Can be configured in `raya.toml`:
//!
//! ```toml
//! [reflect]
//! codegen = "auto"   # "auto" | "enabled" | "disabled"
//! ```
//!
//! or through the `RAYA_REFLECT_CODEGEN` environment variable.

use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

/// How the capability probe decides whether compiled accessors may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodegenPolicy {
    /// Run the trial synthesis and trust its outcome
    #[default]
    Auto,
    /// Skip the trial and record codegen as available
    Enabled,
    /// Restricted environment: record codegen as unavailable without trying
    Disabled,
}

impl FromStr for CodegenPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "enabled" | "on" | "1" => Ok(Self::Enabled),
            "disabled" | "off" | "0" => Ok(Self::Disabled),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Reflector settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReflectConfig {
    /// Capability probe policy
    #[serde(default)]
    pub codegen: CodegenPolicy,
}

/// The subset of `raya.toml` this crate reads
#[derive(Debug, Default, Deserialize)]
struct Manifest {
    #[serde(default)]
    reflect: ReflectConfig,
}

impl ReflectConfig {
    /// Environment variable overriding [`ReflectConfig::codegen`]
    pub const CODEGEN_ENV: &'static str = "RAYA_REFLECT_CODEGEN";

    /// Set the codegen policy
    pub fn with_codegen(mut self, policy: CodegenPolicy) -> Self {
        self.codegen = policy;
        self
    }

    /// Parse the `[reflect]` table of a `raya.toml` document. A missing
    /// table yields the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let manifest: Manifest = toml::from_str(content)?;
        Ok(manifest.reflect)
    }

    /// Defaults, overridden by the environment. An unparseable value is
    /// reported and ignored.
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var(Self::CODEGEN_ENV) {
            Ok(raw) => match raw.parse() {
                Ok(policy) => config.with_codegen(policy),
                Err(err) => {
                    tracing::warn!(%err, "ignoring {}", Self::CODEGEN_ENV);
                    config
                }
            },
            Err(_) => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policy() {
        assert_eq!("auto".parse::<CodegenPolicy>().unwrap(), CodegenPolicy::Auto);
        assert_eq!(" OFF ".parse::<CodegenPolicy>().unwrap(), CodegenPolicy::Disabled);
        assert_eq!("enabled".parse::<CodegenPolicy>().unwrap(), CodegenPolicy::Enabled);
        assert!("sometimes".parse::<CodegenPolicy>().is_err());
    }

    #[test]
    fn test_from_toml() {
        let config = ReflectConfig::from_toml_str(
            r#"
            [package]
            name = "app"

            [reflect]
            codegen = "disabled"
            "#,
        )
        .unwrap();
        assert_eq!(config.codegen, CodegenPolicy::Disabled);
    }

    #[test]
    fn test_from_toml_without_table() {
        let config = ReflectConfig::from_toml_str("[package]\nname = \"app\"\n").unwrap();
        assert_eq!(config, ReflectConfig::default());
    }

    #[test]
    fn test_from_toml_rejects_unknown_policy() {
        assert!(ReflectConfig::from_toml_str("[reflect]\ncodegen = \"maybe\"\n").is_err());
    }
}
