//! Sparkify CLI: build the star schema from song and log JSON.

use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};

use sparkify::{CliArgs, EtlConfig, init_tracing, run_etl};
use sparkify_core::is_yaml_file;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = CliArgs::parse();

    let mut config = match &args.config {
        Some(path) => {
            if !is_yaml_file(path) {
                warn!("Config file {} has no .yaml extension", path.display());
            }
            info!("Loading config from {}", path.display());
            match EtlConfig::from_file(path) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Failed to load config: {e}");
                    return ExitCode::FAILURE;
                }
            }
        }
        None => EtlConfig::default(),
    };

    // An explicit credentials file must exist even for local runs
    let credentials_required = args.credentials.is_some();
    if let Some(path) = args.credentials {
        config.credentials_file = path;
    }

    let credentials = match config.load_credentials(credentials_required) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load credentials: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run_etl(&config, credentials).await {
        Ok(summary) => {
            summary.log();
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ETL failed: {e}");
            ExitCode::FAILURE
        }
    }
}
