//! Configuration management with serde serialization/deserialization
//!
//! Every field has a default, so a JSON config file only needs to name the
//! settings it changes. Command-line flags are applied on top of the file.

use crate::ExportError;
use chromiumoxide::browser::BrowserConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for a site export run
///
/// # Examples
///
/// ```rust
/// use site_export::Config;
///
/// let config = Config {
///     output_root: "out".into(),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the status log and one subdirectory per site (default: `dist`)
    pub output_root: PathBuf,

    /// File name of the append-only status log inside `output_root` (default: `output`)
    pub status_log_name: String,

    /// Upper bound for navigation including the network-idle wait (default: 30 seconds)
    pub navigation_timeout: Duration,

    /// Heuristic deciding when navigation is complete
    pub network_idle: NetworkIdle,

    /// PDF snapshot settings
    pub pdf: PdfSettings,

    /// Browser viewport used while rendering
    pub viewport: Viewport,

    /// Path to Chrome/Chromium executable (default: auto-detect)
    pub chrome_path: Option<String>,

    /// Custom User-Agent for the browser and for script downloads
    pub user_agent: Option<String>,

    /// Per-request timeout for script downloads (default: none)
    pub script_fetch_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("dist"),
            status_log_name: "output".to_string(),
            navigation_timeout: Duration::from_secs(30),
            network_idle: NetworkIdle::default(),
            pdf: PdfSettings::default(),
            viewport: Viewport::default(),
            chrome_path: None,
            user_agent: None,
            script_fetch_timeout: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.status_log_name.trim().is_empty() {
            return Err(ExportError::ConfigurationError(
                "Status log name must not be empty".to_string(),
            ));
        }

        if self.navigation_timeout.is_zero() {
            return Err(ExportError::ConfigurationError(
                "Navigation timeout must be greater than 0".to_string(),
            ));
        }

        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(ExportError::ConfigurationError(
                "Viewport dimensions must be greater than 0".to_string(),
            ));
        }

        let scale = self.viewport.device_scale_factor;
        if scale.is_nan() || scale <= 0.0 {
            return Err(ExportError::ConfigurationError(
                "Device scale factor must be greater than 0".to_string(),
            ));
        }

        if matches!(self.script_fetch_timeout, Some(t) if t.is_zero()) {
            return Err(ExportError::ConfigurationError(
                "Script fetch timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn status_log_path(&self) -> PathBuf {
        self.output_root.join(&self.status_log_name)
    }
}

/// Network-idle wait condition
///
/// Navigation counts as complete once no more than `max_inflight` requests
/// have been open for an uninterrupted `quiet_window`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkIdle {
    pub max_inflight: usize,
    pub quiet_window: Duration,
}

impl Default for NetworkIdle {
    fn default() -> Self {
        Self {
            max_inflight: 0,
            quiet_window: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PdfSettings {
    pub paper: PaperFormat,
    /// CSS media type emulated before printing (default: `screen`)
    pub media_type: String,
    pub print_background: bool,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            paper: PaperFormat::A4,
            media_type: "screen".to_string(),
            print_background: false,
        }
    }
}

/// Named paper sizes for the PDF snapshot
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PaperFormat {
    Letter,
    Legal,
    Tabloid,
    Ledger,
    A3,
    A4,
    A5,
}

impl PaperFormat {
    /// Width and height in inches.
    pub fn dimensions(self) -> (f64, f64) {
        match self {
            PaperFormat::Letter => (8.5, 11.0),
            PaperFormat::Legal => (8.5, 14.0),
            PaperFormat::Tabloid => (11.0, 17.0),
            PaperFormat::Ledger => (17.0, 11.0),
            PaperFormat::A3 => (11.7, 16.54),
            PaperFormat::A4 => (8.27, 11.7),
            PaperFormat::A5 => (5.83, 8.27),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Viewport {
    /// Viewport width in pixels (default: 800)
    pub width: u32,

    /// Viewport height in pixels (default: 600)
    pub height: u32,

    /// CSS-to-device pixel ratio (default: 1.0)
    pub device_scale_factor: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            device_scale_factor: 1.0,
        }
    }
}

/// Generate Chrome command-line arguments based on configuration
///
/// ```rust
/// use site_export::{Config, get_chrome_args};
///
/// let args = get_chrome_args(&Config::default());
/// assert!(args.contains(&"--headless".to_string()));
/// ```
pub fn get_chrome_args(config: &Config) -> Vec<String> {
    let mut args = vec![
        "--headless".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--disable-extensions".to_string(),
        "--disable-default-apps".to_string(),
        "--disable-sync".to_string(),
        "--no-first-run".to_string(),
        "--hide-scrollbars".to_string(),
        "--mute-audio".to_string(),
        format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        ),
        format!(
            "--force-device-scale-factor={}",
            config.viewport.device_scale_factor
        ),
    ];

    if let Some(user_agent) = &config.user_agent {
        args.push(format!("--user-agent={user_agent}"));
    }

    args
}

pub fn create_browser_config(config: &Config) -> Result<BrowserConfig, ExportError> {
    let mut builder = BrowserConfig::builder()
        .window_size(config.viewport.width, config.viewport.height)
        .request_timeout(config.navigation_timeout)
        .args(get_chrome_args(config));

    if let Some(chrome_path) = &config.chrome_path {
        builder = builder.chrome_executable(chrome_path);
    }

    builder.build().map_err(ExportError::BrowserLaunchFailed)
}
