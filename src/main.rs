use clap::Parser;
use site_export::{load_config, setup_logging, Cli, CliRunner};
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Missing or malformed flags exit here with clap's usage message.
    let args = Cli::parse();

    if let Err(e) = setup_logging(args.verbose) {
        eprintln!("Failed to initialize logging: {e}");
    }

    info!("Starting site-export v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_config(&args).await {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let status = CliRunner::new(config).run(&args.website).await;
    info!("Site-export finished: {:?}", status);

    ExitCode::from(status.exit_code())
}
