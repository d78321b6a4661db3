// CLI modules
mod cli;

use cli::args::{Args, Parser};
use cli::op::{Op, OpContext};
use cli::{Mount, EX_USAGE};
use s3fs::process::{init_logging, LogConfig};

#[tokio::main]
async fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version are not failures
            let code = if e.use_stderr() { EX_USAGE } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let config = match args.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EX_USAGE);
        }
    };

    let guards = init_logging(&LogConfig {
        log_level: config.log_level().unwrap_or(tracing::Level::INFO),
        log_dir: config.log_dir.clone(),
    });

    let ctx = OpContext::new(config);
    let code = match args.mount.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            Mount::exit_code(&e)
        }
    };

    // flush log writers before exiting
    drop(guards);
    std::process::exit(code);
}
