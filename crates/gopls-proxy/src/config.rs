//! Proxy configuration.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Verbosity of the proxy's logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the directive used to build a `tracing` filter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings read from `sugo.toml` or the client's `initializationOptions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyConfig {
    /// Write `.go` and `.go.map` next to the source on every save.
    pub auto_regenerate_on_save: bool,

    /// Logging verbosity.
    pub log_level: LogLevel,

    /// Path to the gopls binary, bypassing discovery.
    pub underlying_server_path_override: Option<Utf8PathBuf>,
}

/// A partial configuration: only the keys a client actually sent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigOverrides {
    auto_regenerate_on_save: Option<bool>,
    log_level: Option<LogLevel>,
    underlying_server_path_override: Option<Utf8PathBuf>,
}

impl ProxyConfig {
    /// Applies the keys present in `initializationOptions` on top of `self`.
    ///
    /// Unknown keys are ignored. A malformed options object leaves the
    /// configuration unchanged.
    pub fn merge_initialization_options(&mut self, options: &Value) {
        let overrides = match ConfigOverrides::deserialize(options) {
            Ok(overrides) => overrides,
            Err(e) => {
                tracing::warn!("ignoring malformed initializationOptions: {e}");
                return;
            }
        };
        if let Some(value) = overrides.auto_regenerate_on_save {
            self.auto_regenerate_on_save = value;
        }
        if let Some(value) = overrides.log_level {
            self.log_level = value;
        }
        if let Some(value) = overrides.underlying_server_path_override {
            self.underlying_server_path_override = Some(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = ProxyConfig::default();
        assert!(!config.auto_regenerate_on_save);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.underlying_server_path_override, None);
    }

    #[test]
    fn test_deserialize_camel_case() {
        let config: ProxyConfig = serde_json::from_value(json!({
            "autoRegenerateOnSave": true,
            "logLevel": "debug",
            "underlyingServerPathOverride": "/opt/gopls"
        }))
        .unwrap();
        assert!(config.auto_regenerate_on_save);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(
            config.underlying_server_path_override,
            Some(Utf8PathBuf::from("/opt/gopls"))
        );
    }

    #[test]
    fn test_merge_keeps_unsent_keys() {
        let mut config = ProxyConfig {
            auto_regenerate_on_save: true,
            log_level: LogLevel::Warn,
            underlying_server_path_override: None,
        };
        config.merge_initialization_options(&json!({ "logLevel": "error", "other": 1 }));
        assert!(config.auto_regenerate_on_save);
        assert_eq!(config.log_level, LogLevel::Error);
    }

    #[test]
    fn test_merge_ignores_malformed_options() {
        let mut config = ProxyConfig::default();
        config.merge_initialization_options(&json!({ "logLevel": "loud" }));
        assert_eq!(config, ProxyConfig::default());
    }
}
