pub mod utils;

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use utils::{shutdown_signal, BuildInfo};

const LOG_FILE_PREFIX: &str = "s3fs.log";

/// Logging setup for a mount process.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: tracing::Level,
    /// Directory for log files (stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

impl LogConfig {
    /// `RUST_LOG` wins over the configured level
    fn filter(&self) -> EnvFilter {
        EnvFilter::builder()
            .with_default_directive(self.log_level.into())
            .from_env_lossy()
    }
}

/// Daily-rolling file writer under `dir`, or None if the directory is unusable
fn file_writer(dir: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("Warning: logging to stdout only, cannot create {}: {}", dir.display(), e);
        return None;
    }
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    Some(tracing_appender::non_blocking(appender))
}

/// Install the global subscriber, the panic logger and log the build.
///
/// The returned guards flush buffered records when dropped; hold them until
/// the process is about to exit.
pub fn init_logging(config: &LogConfig) -> Vec<WorkerGuard> {
    let (stdout, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let mut guards = vec![stdout_guard];

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stdout)
        .with_filter(config.filter());

    let file_layer = config
        .log_dir
        .as_deref()
        .and_then(file_writer)
        .map(|(writer, guard)| {
            guards.push(guard);
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(config.filter())
        });

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    utils::register_panic_logger();
    utils::report_build_info();

    guards
}
