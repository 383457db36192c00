//! Configuration loading.

use camino::{Utf8Path, Utf8PathBuf};
use gopls_proxy::ProxyConfig;
use std::fs;
use thiserror::Error;

/// Name of the configuration file looked up in the workspace root.
pub const CONFIG_FILE: &str = "sugo.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly given file does not exist.
    #[error("config file not found: {0}")]
    NotFound(Utf8PathBuf),

    /// The file could not be read.
    #[error("failed to read {path}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration.
    #[error("invalid config {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Loads the configuration.
///
/// An explicit path must exist. Otherwise `sugo.toml` in `root` is used when
/// present, and the defaults apply when it is not.
pub fn load(explicit: Option<&Utf8Path>, root: &Utf8Path) -> Result<ProxyConfig, ConfigError> {
    let path = match explicit {
        Some(path) if path.is_file() => path.to_path_buf(),
        Some(path) => return Err(ConfigError::NotFound(path.to_path_buf())),
        None => {
            let path = root.join(CONFIG_FILE);
            if !path.is_file() {
                return Ok(ProxyConfig::default());
            }
            path
        }
    };
    parse(&path)
}

fn parse(path: &Utf8Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gopls_proxy::LogLevel;
    use pretty_assertions::assert_eq;

    fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        (dir, root)
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let (_dir, root) = temp_root();
        assert_eq!(load(None, &root).unwrap(), ProxyConfig::default());
    }

    #[test]
    fn test_discovers_workspace_config() {
        let (_dir, root) = temp_root();
        fs::write(
            root.join(CONFIG_FILE),
            "autoRegenerateOnSave = true\nlogLevel = \"debug\"\nunderlyingServerPathOverride = \"/opt/gopls\"\n",
        )
        .unwrap();

        let config = load(None, &root).unwrap();
        assert!(config.auto_regenerate_on_save);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(
            config.underlying_server_path_override,
            Some(Utf8PathBuf::from("/opt/gopls"))
        );
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let (_dir, root) = temp_root();
        let missing = root.join("nope.toml");
        assert!(matches!(
            load(Some(&missing), &root),
            Err(ConfigError::NotFound(path)) if path == missing
        ));
    }

    #[test]
    fn test_invalid_level_is_a_parse_error() {
        let (_dir, root) = temp_root();
        let path = root.join("custom.toml");
        fs::write(&path, "logLevel = \"loud\"\n").unwrap();
        assert!(matches!(
            load(Some(&path), &root),
            Err(ConfigError::Parse { .. })
        ));
    }
}
