use thiserror::Error;

/// Everything that can go wrong while exporting a site.
///
/// Each variant carries the diagnostic reported by the collaborator that
/// failed (browser engine, file system, HTTP client).
#[derive(Debug, Clone, Error)]
pub enum ExportError {
    #[error("Missing required argument: website")]
    ArgumentMissing,

    #[error("Workspace initialization failed: {0}")]
    WorkspaceInitFailed(String),

    #[error("Browser launch failed: {0}")]
    BrowserLaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Stylesheet could not be loaded: {0}")]
    StyleExtractionWarning(String),

    #[error("Failed to fetch script {url}: {reason}")]
    ScriptFetchFailed { url: String, reason: String },

    #[error("PDF rendering failed: {0}")]
    PdfRenderFailed(String),

    #[error("Page error: {0}")]
    PageError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl ExportError {
    /// Only an unreadable stylesheet is recovered from; everything else ends the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ExportError::StyleExtractionWarning(_))
    }

    /// Short label used for metrics and structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ExportError::ArgumentMissing => "argument_missing",
            ExportError::WorkspaceInitFailed(_) => "workspace_init",
            ExportError::BrowserLaunchFailed(_) => "browser_launch",
            ExportError::NavigationFailed(_) => "navigation",
            ExportError::StyleExtractionWarning(_) => "style_extraction",
            ExportError::ScriptFetchFailed { .. } => "script_fetch",
            ExportError::PdfRenderFailed(_) => "pdf_render",
            ExportError::PageError(_) => "page",
            ExportError::IoError(_) => "io",
            ExportError::ConfigurationError(_) => "configuration",
        }
    }

    pub fn script_fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        ExportError::ScriptFetchFailed {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::ConfigurationError(err.to_string())
    }
}

impl From<reqwest::Error> for ExportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            return ExportError::ConfigurationError(err.to_string());
        }
        let url = err.url().map(|u| u.to_string()).unwrap_or_default();
        ExportError::script_fetch(url, err)
    }
}

impl From<chromiumoxide::error::CdpError> for ExportError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        ExportError::PageError(err.to_string())
    }
}
