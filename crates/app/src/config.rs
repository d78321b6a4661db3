//! Mount configuration.
//!
//! Values come from, in decreasing priority: command-line flags, the
//! environment (through clap), an optional TOML file, and the defaults below.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use common::prelude::ListingPolicy;
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "s3fs";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountConfig {
    /// Region passed to the S3 client (falls back to the AWS environment)
    #[serde(default)]
    pub region: Option<String>,
    /// Default log level, `RUST_LOG` still takes precedence
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for daily-rolling log files (stdout only if unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Let other users see the mount (needs user_allow_other in /etc/fuse.conf)
    #[serde(default)]
    pub allow_other: bool,
    /// Attribute/entry TTL handed to the kernel
    #[serde(default = "default_attr_ttl_secs")]
    pub attr_ttl_secs: u64,
    /// Fail the mount instead of exposing an empty tree when listing fails
    #[serde(default)]
    pub strict_listing: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_attr_ttl_secs() -> u64 {
    1
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            region: None,
            log_level: default_log_level(),
            log_dir: None,
            allow_other: false,
            attr_ttl_secs: default_attr_ttl_secs(),
            strict_listing: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read config file {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("failed to parse config file {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("invalid log level '{0}'")]
    InvalidLogLevel(String),
}

impl MountConfig {
    /// Default config location, `~/.s3fs/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(format!(".{}", APP_NAME)).join(CONFIG_FILE_NAME))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default location is read
    /// if present and built-in defaults are used otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::from_file(path)
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        // Catch a bad level before logging is set up
        config.log_level()?;
        Ok(config)
    }

    pub fn log_level(&self) -> Result<tracing::Level, ConfigError> {
        tracing::Level::from_str(&self.log_level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }

    pub fn attr_ttl(&self) -> Duration {
        Duration::from_secs(self.attr_ttl_secs)
    }

    pub fn listing_policy(&self) -> ListingPolicy {
        if self.strict_listing {
            ListingPolicy::Strict
        } else {
            ListingPolicy::SoftFail
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = MountConfig::default();
        assert_eq!(config.log_level().unwrap(), tracing::Level::INFO);
        assert_eq!(config.attr_ttl(), Duration::from_secs(1));
        assert_eq!(config.listing_policy(), ListingPolicy::SoftFail);
        assert!(!config.allow_other);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "region = \"eu-west-1\"\nstrict_listing = true").unwrap();

        let config = MountConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.listing_policy(), ListingPolicy::Strict);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.attr_ttl_secs, 1);
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            MountConfig::load(Some(&missing)),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"chatty\"").unwrap();

        assert!(matches!(
            MountConfig::load(Some(file.path())),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "attr_ttl_secs = \"soon\"").unwrap();

        assert!(matches!(
            MountConfig::load(Some(file.path())),
            Err(ConfigError::Parse(_, _))
        ));
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = MountConfig {
            region: Some("us-west-2".to_string()),
            log_dir: Some(PathBuf::from("/var/log/s3fs")),
            allow_other: true,
            ..Default::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: MountConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
