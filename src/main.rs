//! mkv-submerge
//!
//! Entry point: loads configuration, sets up logging and runs the
//! download-and-merge workflow over the configured directory.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{Level, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use mkv_submerge::cli::Args;
use mkv_submerge::config::Config;
use mkv_submerge::workflow::Workflow;

const DEFAULT_CONFIG_FILE: &str = "mkv-submerge.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration, then let the command line override it
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };
    config.apply_args(&args)?;

    if let Some(path) = &args.save_config {
        config.validate()?;
        config.save_to_file(path)?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    // Held until exit so buffered file logs are flushed
    let _guard = setup_logging(args.verbose, config.log_dir.as_deref())?;

    let workflow = Workflow::new(config)?;
    let summary = workflow.run().await?;

    if summary.errored > 0 || summary.merge_failed > 0 {
        info!("Some files could not be merged, rerun with --verbose for details");
    }

    Ok(())
}

fn setup_logging(verbose: bool, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false);

    let (file_layer, guard) = match log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir)?;
            let file_appender = rolling::daily(log_dir, "mkv-submerge.log");
            let (non_blocking_file, guard) = non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking_file)
                .with_target(false)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    if let Some(log_dir) = log_dir {
        info!("Logging to {}", log_dir.join("mkv-submerge.log").display());
    }

    Ok(guard)
}
