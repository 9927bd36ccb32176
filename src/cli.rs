//! Command-line entry point: argument parsing, config loading and logging setup.

use crate::{Config, ExportService, PaperFormat, RunStatus, SiteTarget, Workspace};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "site-export")]
#[command(about = "Save a web page's rendered HTML, CSS, JavaScript and a PDF snapshot")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, help = "Your website")]
    pub website: String,

    #[arg(long, help = "Configuration file path (JSON)")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Output root directory (default: dist)")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, help = "Navigation timeout in seconds")]
    pub timeout: Option<u64>,

    #[arg(long, value_enum, help = "PDF paper format")]
    pub paper: Option<PaperFormat>,

    #[arg(long, help = "Chrome executable path")]
    pub chrome_path: Option<String>,

    #[arg(long, help = "Enable verbose logging")]
    pub verbose: bool,
}

impl Cli {
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(output_dir) = &self.output_dir {
            config.output_root = output_dir.clone();
        }
        if let Some(timeout) = self.timeout {
            config.navigation_timeout = Duration::from_secs(timeout);
        }
        if let Some(paper) = self.paper {
            config.pdf.paper = paper;
        }
        if let Some(chrome_path) = &self.chrome_path {
            config.chrome_path = Some(chrome_path.clone());
        }
    }
}

/// Reads the optional config file, applies flag overrides and validates.
pub async fn load_config(args: &Cli) -> anyhow::Result<Config> {
    let mut config = if let Some(config_path) = &args.config {
        let config_content = fs::read_to_string(config_path)
            .await
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        serde_json::from_str(&config_content)
            .with_context(|| format!("Failed to parse config {}", config_path.display()))?
    } else {
        Config::default()
    };

    args.apply_overrides(&mut config);
    config.validate()?;

    info!("Configuration loaded successfully");
    info!("Output root: {}", config.output_root.display());
    info!("Navigation timeout: {:?}", config.navigation_timeout);
    info!("Paper format: {:?}", config.pdf.paper);

    Ok(config)
}

pub struct CliRunner {
    pub config: Config,
}

impl CliRunner {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(&self, website: &str) -> RunStatus {
        let target = match SiteTarget::parse(website) {
            Ok(target) => target,
            Err(e) => {
                error!("{}", e);
                return RunStatus::Failure;
            }
        };

        let service = match ExportService::new(self.config.clone()) {
            Ok(service) => service,
            Err(e) => {
                error!("{}", e);
                return RunStatus::Failure;
            }
        };

        let workspace = Workspace::prepare(&self.config, &target).await;
        service.run(&target, workspace).await
    }
}

pub fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
}
