//! Gateway configuration.
//!
//! Everything tunable lives in [`GatewayConfig`]; the defaults come from
//! [`constants`] so limits are declared exactly once.

pub mod constants;

use serde::{Deserialize, Serialize};

/// Runtime configuration for a [`crate::CommandGateway`].
///
/// Deserializable so embedders can load it from their own config files; all
/// fields fall back to the crate defaults when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Hard ceiling on a foreground wait, in milliseconds.
    pub max_timeout_ms: u64,
    /// No-new-output window before the foreground wait ends, in milliseconds.
    pub idle_timeout_ms: u64,
    /// Cap on wildcard expansion candidates validated per pattern.
    pub max_glob_matches: usize,
    /// Record gateway verdicts in the in-memory safety audit trail.
    pub audit_enabled: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_timeout_ms: constants::DEFAULT_MAX_TIMEOUT_MS,
            idle_timeout_ms: constants::DEFAULT_IDLE_TIMEOUT_MS,
            max_glob_matches: constants::MAX_GLOB_MATCHES,
            audit_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_track_constants() {
        let config = GatewayConfig::default();
        assert_eq!(config.max_timeout_ms, constants::DEFAULT_MAX_TIMEOUT_MS);
        assert_eq!(config.idle_timeout_ms, constants::DEFAULT_IDLE_TIMEOUT_MS);
        assert_eq!(config.max_glob_matches, constants::MAX_GLOB_MATCHES);
        assert!(config.audit_enabled);
    }

    #[test]
    fn partial_config_deserializes_with_defaults() {
        let config: GatewayConfig = serde_json::from_str(r#"{"max_timeout_ms": 1000}"#).unwrap();
        assert_eq!(config.max_timeout_ms, 1000);
        assert_eq!(config.idle_timeout_ms, constants::DEFAULT_IDLE_TIMEOUT_MS);
    }
}
