pub use clap::Parser;

use std::path::PathBuf;

use s3fs::{ConfigError, MountConfig};

use super::Mount;

#[derive(Parser, Debug)]
#[command(name = "s3fs", version)]
#[command(about = "Mount an S3 bucket as a read-only, listing-only filesystem")]
pub struct Args {
    /// Path to a TOML config file (defaults to ~/.s3fs/config.toml when present)
    #[arg(long)]
    pub config_path: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG still applies
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(flatten)]
    pub mount: Mount,
}

impl Args {
    /// Load the config file and layer command-line overrides on top
    pub fn resolve_config(&self) -> Result<MountConfig, ConfigError> {
        let mut config = MountConfig::load(self.config_path.as_deref())?;

        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        self.mount.apply_overrides(&mut config);

        config.log_level()?;
        Ok(config)
    }
}
