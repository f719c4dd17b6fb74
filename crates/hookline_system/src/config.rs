//! Runtime configuration.
//!
//! [`RuntimeConfig`] carries the deployment-wide settings of a
//! [`HookRuntime`](crate::runtime::HookRuntime). It can be built in code,
//! deserialized from a host configuration file, or read from the environment.
//!
//! # Environment
//!
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `HOOKLINE_FAILURE_POLICY` | `abort`, `skip` | `abort` |
//! | `HOOKLINE_CATCH_PANICS` | `true`, `false` | `true` |
//!
//! # Example
//!
//! ```
//! use hookline_system::config::{FailurePolicy, RuntimeConfig};
//!
//! let config = RuntimeConfig::default().with_failure_policy(FailurePolicy::Skip);
//! assert_eq!(config.failure_policy, FailurePolicy::Skip);
//! ```

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable selecting the [`FailurePolicy`].
pub const FAILURE_POLICY_ENV: &str = "HOOKLINE_FAILURE_POLICY";

/// Environment variable toggling panic isolation.
pub const CATCH_PANICS_ENV: &str = "HOOKLINE_CATCH_PANICS";

// ─────────────────────────────────────────────────────────────────────────────
// FailurePolicy
// ─────────────────────────────────────────────────────────────────────────────

/// What the pipeline does when an extension's `transform` fails.
///
/// The policy applies uniformly to every extension in every chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the chain and return the failure to the caller.
    #[default]
    Abort,
    /// Log and record the failure, then continue with the unchanged state.
    Skip,
}

impl FailurePolicy {
    /// Stable string form used in configuration.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Abort => "abort",
            Self::Skip => "skip",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => Err(ConfigError::InvalidValue {
                key: FAILURE_POLICY_ENV,
                value: other.to_string(),
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ConfigError
// ─────────────────────────────────────────────────────────────────────────────

/// Errors produced while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A setting had an unrecognized value.
    #[error("invalid value '{value}' for {key}")]
    InvalidValue {
        /// The setting name.
        key: &'static str,
        /// The rejected value.
        value: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// RuntimeConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Deployment-wide runtime settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Handling of `transform` failures.
    pub failure_policy: FailurePolicy,
    /// Whether panics inside `transform` are caught and treated as failures.
    pub catch_panics: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Abort,
            catch_panics: true,
        }
    }
}

impl RuntimeConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads settings from the process environment, falling back to defaults
    /// for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, falling back to defaults for missing
    /// keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(FAILURE_POLICY_ENV) {
            config.failure_policy = value.parse()?;
        }

        if let Some(value) = lookup(CATCH_PANICS_ENV) {
            config.catch_panics = match value.trim() {
                "true" | "1" => true,
                "false" | "0" => false,
                other => {
                    return Err(ConfigError::InvalidValue {
                        key: CATCH_PANICS_ENV,
                        value: other.to_string(),
                    });
                }
            };
        }

        Ok(config)
    }

    /// Sets the failure policy.
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Enables or disables panic isolation.
    #[must_use]
    pub fn with_catch_panics(mut self, enabled: bool) -> Self {
        self.catch_panics = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_abort_and_catch_panics() {
        let config = RuntimeConfig::default();
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert!(config.catch_panics);
    }

    #[test]
    fn lookup_overrides_defaults() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[
            (FAILURE_POLICY_ENV, "skip"),
            (CATCH_PANICS_ENV, "false"),
        ]))
        .unwrap();

        assert_eq!(config.failure_policy, FailurePolicy::Skip);
        assert!(!config.catch_panics);
    }

    #[test]
    fn missing_keys_keep_defaults() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn rejects_unknown_policy() {
        let err =
            RuntimeConfig::from_lookup(lookup_from(&[(FAILURE_POLICY_ENV, "retry")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: FAILURE_POLICY_ENV,
                value: "retry".to_string(),
            }
        );
    }

    #[test]
    fn rejects_unknown_catch_panics_value() {
        let err =
            RuntimeConfig::from_lookup(lookup_from(&[(CATCH_PANICS_ENV, "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == CATCH_PANICS_ENV));
    }

    #[test]
    fn deserializes_partial_config() {
        let config: RuntimeConfig =
            serde_json::from_str(r#"{ "failure_policy": "skip" }"#).unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::Skip);
        assert!(config.catch_panics);
    }

    #[test]
    fn policy_round_trips_through_str() {
        for policy in [FailurePolicy::Abort, FailurePolicy::Skip] {
            assert_eq!(policy.as_str().parse::<FailurePolicy>().unwrap(), policy);
        }
    }
}
