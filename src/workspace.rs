//! Output directories and the shared status log.
//!
//! Directory creation failures stop the run. Status log failures only warn:
//! losing a progress line is not worth losing the export.

use crate::{Artifact, Config, ExportError, SiteTarget};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// One block of text appended to the status log.
#[derive(Debug, Clone, Copy)]
pub enum StatusEntry<'a> {
    RunHeader(&'a str),
    Scraping(&'a str),
    Exported(Artifact),
    Failure(&'a ExportError),
}

impl StatusEntry<'_> {
    pub fn render(&self) -> String {
        match self {
            StatusEntry::RunHeader(timestamp) => {
                format!("# Output - {timestamp}\n\n\n\n---\n\nMaking dist folder...")
            }
            StatusEntry::Scraping(url) => format!("\nScraping {url}..."),
            StatusEntry::Exported(Artifact::Html) => "\nExporting the source".to_string(),
            StatusEntry::Exported(Artifact::Styles) => "\nExporting the styles".to_string(),
            StatusEntry::Exported(Artifact::Scripts) => "\nExporting the JS".to_string(),
            StatusEntry::Exported(Artifact::Pdf) => "\nExporting the PDF\n\n".to_string(),
            StatusEntry::Failure(err) => format!("\nError: {err}\n\n"),
        }
    }
}

/// Human-readable local time for run headers, e.g. `3/7/2025, 4:05:09 PM`.
pub fn local_timestamp() -> String {
    Local::now().format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

/// Append-only progress file shared by every run.
#[derive(Debug, Clone)]
pub struct StatusLog {
    path: PathBuf,
}

impl StatusLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the file if needed and bumps its modification time.
    pub async fn touch(&self) -> std::io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let file = file.into_std().await;
        tokio::task::spawn_blocking(move || file.set_modified(SystemTime::now()))
            .await
            .map_err(std::io::Error::other)?
    }

    pub async fn append(&self, text: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await
    }

    pub async fn record(&self, entry: StatusEntry<'_>) {
        if let Err(e) = self.append(&entry.render()).await {
            warn!("Failed to append to status log {}: {}", self.path.display(), e);
        }
    }
}

/// Prepared output location for one site.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    site_dir: PathBuf,
    status_log: StatusLog,
}

impl Workspace {
    /// Creates `<root>` and `<root>/<site-id>`, then touches the status log and
    /// writes the run header.
    pub async fn prepare(config: &Config, target: &SiteTarget) -> Result<Self, ExportError> {
        let root = config.output_root.clone();
        fs::create_dir_all(&root).await.map_err(|e| {
            ExportError::WorkspaceInitFailed(format!("{}: {}", root.display(), e))
        })?;

        let site_dir = root.join(target.site_id());
        if !site_dir.starts_with(&root) {
            warn!(
                "Site directory {} is outside the output root {}",
                site_dir.display(),
                root.display()
            );
        }
        fs::create_dir_all(&site_dir).await.map_err(|e| {
            ExportError::WorkspaceInitFailed(format!("{}: {}", site_dir.display(), e))
        })?;

        let status_log = StatusLog::new(config.status_log_path());
        match status_log.touch().await {
            Ok(()) => debug!("Touched status log {}", status_log.path().display()),
            Err(e) => warn!(
                "Failed to touch status log {}: {}",
                status_log.path().display(),
                e
            ),
        }
        status_log
            .record(StatusEntry::RunHeader(&local_timestamp()))
            .await;

        Ok(Self {
            root,
            site_dir,
            status_log,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn site_dir(&self) -> &Path {
        &self.site_dir
    }

    pub fn status_log(&self) -> &StatusLog {
        &self.status_log
    }

    pub fn artifact_path(&self, artifact: Artifact) -> PathBuf {
        self.site_dir.join(artifact.file_name())
    }

    /// Writes (or overwrites) one artifact and returns its size in bytes.
    pub async fn write_artifact(
        &self,
        artifact: Artifact,
        contents: &[u8],
    ) -> Result<usize, ExportError> {
        let path = self.artifact_path(artifact);
        fs::write(&path, contents)
            .await
            .map_err(|e| ExportError::IoError(format!("{}: {}", path.display(), e)))?;
        debug!("Wrote {} ({} bytes)", path.display(), contents.len());
        Ok(contents.len())
    }
}
