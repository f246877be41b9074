use std::fmt;

use serde::Deserialize;

use crate::audit::DEFAULT_AUDIT_CAPACITY;
use crate::policy::PolicyKind;
use crate::validate::NameRules;

/// Environment variable selecting the authorization policy.
pub const POLICY_ENV: &str = "ORIGIN_GATE_POLICY";
/// Environment variable setting a display name length limit.
pub const MAX_NAME_LEN_ENV: &str = "ORIGIN_GATE_MAX_NAME_LEN";
/// Environment variable enabling control character rejection in names.
pub const REJECT_CONTROL_CHARS_ENV: &str = "ORIGIN_GATE_REJECT_CONTROL_CHARS";
/// Environment variable overriding the audit trail capacity.
pub const AUDIT_CAPACITY_ENV: &str = "ORIGIN_GATE_AUDIT_CAPACITY";

/// Deployment configuration for the server-only procedure.
///
/// Exactly one policy is active per deployment. The origin policy is the
/// default because it needs no secret material. Name restrictions are off
/// unless set.
///
/// # Examples
///
/// ```
/// use origin_gate::{Config, PolicyKind};
///
/// let config: Config = serde_json::from_str(r#"{ "policy": "token" }"#).unwrap();
/// assert_eq!(config.policy, PolicyKind::Token);
/// assert_eq!(config.max_name_len, None);
/// assert!(!config.reject_control_chars);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Which authorization policy guards the procedure
    pub policy: PolicyKind,
    /// Optional upper bound on display name length, in bytes
    pub max_name_len: Option<usize>,
    /// Reject display names containing control characters
    pub reject_control_chars: bool,
    /// Number of audit events kept in memory
    pub audit_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: PolicyKind::default(),
            max_name_len: None,
            reject_control_chars: false,
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
        }
    }
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// Unset variables fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(POLICY_ENV) {
            config.policy = raw
                .parse()
                .map_err(|reason| ConfigError::new(POLICY_ENV, reason))?;
        }

        if let Some(raw) = lookup(MAX_NAME_LEN_ENV) {
            config.max_name_len = Some(positive(MAX_NAME_LEN_ENV, &raw)?);
        }

        if let Some(raw) = lookup(REJECT_CONTROL_CHARS_ENV) {
            config.reject_control_chars = raw
                .trim()
                .parse()
                .map_err(|e: std::str::ParseBoolError| {
                    ConfigError::new(REJECT_CONTROL_CHARS_ENV, e.to_string())
                })?;
        }

        if let Some(raw) = lookup(AUDIT_CAPACITY_ENV) {
            config.audit_capacity = positive(AUDIT_CAPACITY_ENV, &raw)?;
        }

        Ok(config)
    }

    /// Checks values that deserialization alone cannot rule out.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `max_name_len` is `Some(0)` or
    /// `audit_capacity` is 0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_name_len == Some(0) {
            return Err(ConfigError::new("max_name_len", "must be greater than 0"));
        }
        if self.audit_capacity == 0 {
            return Err(ConfigError::new("audit_capacity", "must be greater than 0"));
        }
        Ok(())
    }

    /// Returns the display name restrictions this configuration selects.
    pub fn name_rules(&self) -> NameRules {
        NameRules {
            max_len: self.max_name_len,
            reject_control_chars: self.reject_control_chars,
        }
    }
}

fn positive(key: &'static str, raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(ConfigError::new(key, "must be greater than 0")),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::new(key, e.to_string())),
    }
}

/// A configuration value could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    key: &'static str,
    reason: String,
}

impl ConfigError {
    fn new(key: &'static str, reason: impl Into<String>) -> Self {
        Self {
            key,
            reason: reason.into(),
        }
    }

    /// Returns the offending configuration key.
    pub fn key(&self) -> &str {
        self.key
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.key, self.reason)
    }
}

impl std::error::Error for ConfigError {}
