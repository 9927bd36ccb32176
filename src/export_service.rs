//! Export driver running the capture pipeline for one site
//!
//! The pipeline is strictly sequential: navigate, then write `index.html`,
//! `styles.css`, `scripts.js` and `index.pdf` in that order, appending a line
//! to the status log after each file lands. Any error ends the run; files
//! already written stay on disk.

use crate::{
    assemble_scripts, assemble_stylesheet, fetch_scripts, format_bytes, format_duration,
    telemetry, Artifact, BrowserLauncher, ChromeLauncher, Config, ExportError, ExportStage,
    HttpScriptFetcher, PageSession, ScriptFetcher, SiteTarget, StatusEntry, Workspace,
};
use std::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Final outcome of a run, mapped onto the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failure,
}

impl RunStatus {
    pub fn exit_code(self) -> u8 {
        match self {
            RunStatus::Success => 0,
            RunStatus::Failure => 1,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, RunStatus::Success)
    }
}

/// What a run produced before it finished or stopped.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub stage: ExportStage,
    pub artifacts: Vec<(Artifact, usize)>,
    pub scripts: usize,
    pub stylesheet_warnings: usize,
}

impl Default for ExportSummary {
    fn default() -> Self {
        Self {
            stage: ExportStage::Init,
            artifacts: Vec::new(),
            scripts: 0,
            stylesheet_warnings: 0,
        }
    }
}

impl ExportSummary {
    pub fn total_bytes(&self) -> usize {
        self.artifacts.iter().map(|(_, bytes)| bytes).sum()
    }
}

/// Drives one browser through the export pipeline
///
/// # Examples
///
/// ```rust,no_run
/// use site_export::{Config, ExportService, SiteTarget, Workspace};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::default();
///     let target = SiteTarget::parse("https://example.com")?;
///     let workspace = Workspace::prepare(&config, &target).await;
///
///     let service = ExportService::new(config)?;
///     let status = service.run(&target, workspace).await;
///     std::process::exit(status.exit_code().into());
/// }
/// ```
pub struct ExportService<L = ChromeLauncher, F = HttpScriptFetcher> {
    config: Config,
    launcher: L,
    fetcher: F,
}

impl ExportService<ChromeLauncher, HttpScriptFetcher> {
    pub fn new(config: Config) -> Result<Self, ExportError> {
        let fetcher = HttpScriptFetcher::new(&config)?;
        let launcher = ChromeLauncher::new(config.clone());
        Ok(Self::with_collaborators(config, launcher, fetcher))
    }
}

impl<L, F> ExportService<L, F>
where
    L: BrowserLauncher,
    F: ScriptFetcher,
{
    pub fn with_collaborators(config: Config, launcher: L, fetcher: F) -> Self {
        Self {
            config,
            launcher,
            fetcher,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the export if the workspace was prepared; otherwise fails without
    /// touching the network.
    pub async fn run(
        &self,
        target: &SiteTarget,
        workspace: Result<Workspace, ExportError>,
    ) -> RunStatus {
        let started = Instant::now();

        let workspace = match workspace {
            Ok(workspace) => workspace,
            Err(err) => {
                error!("Error: {}", err);
                telemetry::record_run(started.elapsed(), Err(&err));
                return RunStatus::Failure;
            }
        };

        let run_id = Uuid::new_v4();
        let span = info_span!("export", %run_id, site = %target.site_id());

        async {
            match self.export(target, &workspace).await {
                Ok(summary) => {
                    telemetry::record_run(started.elapsed(), Ok(()));
                    info!(
                        "Exported {} files ({}, {} scripts) in {}",
                        summary.artifacts.len(),
                        format_bytes(summary.total_bytes()),
                        summary.scripts,
                        format_duration(started.elapsed())
                    );
                    RunStatus::Success
                }
                Err(err) => {
                    workspace
                        .status_log()
                        .record(StatusEntry::Failure(&err))
                        .await;
                    telemetry::record_run(started.elapsed(), Err(&err));
                    error!("Error: {}", err);
                    RunStatus::Failure
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Runs the pipeline against a prepared workspace. The browser is closed
    /// before this returns, whether or not the capture succeeded.
    pub async fn export(
        &self,
        target: &SiteTarget,
        workspace: &Workspace,
    ) -> Result<ExportSummary, ExportError> {
        let mut summary = ExportSummary::default();

        info!("Browser will go to: {}", target.url());
        workspace
            .status_log()
            .record(StatusEntry::Scraping(target.url()))
            .await;

        let mut session = self.launcher.launch().await?;
        let captured = self
            .capture(session.as_mut(), target, workspace, &mut summary)
            .await;
        session.close().await;

        let result = match captured {
            Ok(pdf) => {
                self.persist(workspace, Artifact::Pdf, &pdf, &mut summary)
                    .await
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => {
                summary.stage = summary.stage.next();
                Ok(summary)
            }
            Err(err) => {
                warn!(stage = summary.stage.as_str(), "Export stopped");
                Err(err)
            }
        }
    }

    /// Everything that needs the live page. Returns the rendered PDF so the
    /// caller can close the browser before writing it.
    async fn capture(
        &self,
        session: &mut dyn PageSession,
        target: &SiteTarget,
        workspace: &Workspace,
        summary: &mut ExportSummary,
    ) -> Result<Vec<u8>, ExportError> {
        session
            .navigate(
                target.url(),
                &self.config.network_idle,
                self.config.navigation_timeout,
            )
            .await?;
        summary.stage = ExportStage::Navigated;
        telemetry::record_stage(summary.stage);

        let html = session.content().await?;
        self.persist(workspace, Artifact::Html, html.as_bytes(), summary)
            .await?;

        let sheets = session.style_sheets().await?;
        for sheet in sheets.iter().filter(|sheet| sheet.error.is_some()) {
            let warning = ExportError::StyleExtractionWarning(format!(
                "{}: {}",
                sheet.href.as_deref().unwrap_or("<inline>"),
                sheet.error.as_deref().unwrap_or_default()
            ));
            warn!("{}", warning);
            telemetry::record_stylesheet_warning();
            summary.stylesheet_warnings += 1;
        }
        let css = assemble_stylesheet(&sheets);
        self.persist(workspace, Artifact::Styles, css.as_bytes(), summary)
            .await?;

        let sources = session.script_sources().await?;
        info!("Fetching {} external scripts", sources.len());
        let wrapped = fetch_scripts(&self.fetcher, &sources, target.url()).await?;
        summary.scripts = wrapped.len();
        let js = assemble_scripts(&wrapped);
        self.persist(workspace, Artifact::Scripts, js.as_bytes(), summary)
            .await?;

        let pdf = &self.config.pdf;
        session
            .render_pdf(&pdf.media_type, pdf.paper, pdf.print_background)
            .await
    }

    async fn persist(
        &self,
        workspace: &Workspace,
        artifact: Artifact,
        contents: &[u8],
        summary: &mut ExportSummary,
    ) -> Result<(), ExportError> {
        let bytes = workspace.write_artifact(artifact, contents).await?;
        workspace
            .status_log()
            .record(StatusEntry::Exported(artifact))
            .await;

        summary.stage = ExportStage::after(artifact);
        summary.artifacts.push((artifact, bytes));
        telemetry::record_stage(summary.stage);
        telemetry::record_artifact(artifact, bytes);

        info!(
            "Exported {} ({})",
            workspace.artifact_path(artifact).display(),
            format_bytes(bytes)
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeLauncher, FakePage, SessionRecorder};
    use crate::{MockScriptFetcher, StyleSheetText};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        config: Config,
        target: SiteTarget,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let config = Config {
                output_root: dir.path().join("dist"),
                ..Default::default()
            };
            Self {
                _dir: dir,
                config,
                target: SiteTarget::parse("https://example.com").unwrap(),
            }
        }

        async fn workspace(&self) -> Result<Workspace, ExportError> {
            Workspace::prepare(&self.config, &self.target).await
        }

        fn read(&self, relative: &str) -> String {
            std::fs::read_to_string(self.config.output_root.join(relative)).unwrap()
        }

        fn exists(&self, relative: &str) -> bool {
            self.config.output_root.join(relative).exists()
        }
    }

    fn echo_fetcher() -> MockScriptFetcher {
        let mut fetcher = MockScriptFetcher::new();
        fetcher
            .expect_fetch_text()
            .returning(|url| Ok(format!("/* {url} */")));
        fetcher
    }

    #[tokio::test]
    async fn test_full_run_writes_all_artifacts() {
        let fixture = Fixture::new();
        let recorder = SessionRecorder::default();
        let page = FakePage {
            html: "<html><body>hi</body></html>".to_string(),
            sheets: vec![StyleSheetText::readable("body { margin: 0px; }")],
            scripts: vec!["https://example.com/app.js".to_string()],
            pdf: b"%PDF-1.4 fake".to_vec(),
            ..Default::default()
        };
        let service = ExportService::with_collaborators(
            fixture.config.clone(),
            FakeLauncher::new(page, recorder.clone()),
            echo_fetcher(),
        );

        let status = service.run(&fixture.target, fixture.workspace().await).await;

        assert_eq!(status, RunStatus::Success);
        assert_eq!(fixture.read("example.com/index.html"), "<html><body>hi</body></html>");
        assert!(fixture.read("example.com/styles.css").ends_with("\n\nbody { margin: 0px; }"));
        assert_eq!(
            fixture.read("example.com/scripts.js"),
            "\n/** https://example.com/app.js\n*  https://example.com\n*/\n\n/* https://example.com/app.js */\n"
        );
        assert_eq!(
            std::fs::read(fixture.config.output_root.join("example.com/index.pdf")).unwrap(),
            b"%PDF-1.4 fake"
        );
        assert!(recorder.closed());
        assert_eq!(recorder.pdf_media().as_deref(), Some("screen"));

        let log = fixture.read("output");
        let stages = log.split("Making dist folder...").nth(1).unwrap();
        assert_eq!(
            stages,
            "\nScraping https://example.com...\nExporting the source\nExporting the styles\nExporting the JS\nExporting the PDF\n\n"
        );
    }

    #[tokio::test]
    async fn test_workspace_failure_skips_navigation() {
        let fixture = Fixture::new();
        std::fs::create_dir_all(fixture.config.output_root.parent().unwrap()).unwrap();
        std::fs::write(&fixture.config.output_root, b"file in the way").unwrap();
        let recorder = SessionRecorder::default();
        let service = ExportService::with_collaborators(
            fixture.config.clone(),
            FakeLauncher::new(FakePage::default(), recorder.clone()),
            MockScriptFetcher::new(),
        );

        let workspace = fixture.workspace().await;
        assert!(workspace.is_err());
        let status = service.run(&fixture.target, workspace).await;

        assert_eq!(status, RunStatus::Failure);
        assert!(!recorder.launched());
        assert!(!recorder.navigated());
    }

    #[tokio::test]
    async fn test_script_failure_skips_scripts_file_and_logs_error() {
        let fixture = Fixture::new();
        let recorder = SessionRecorder::default();
        let page = FakePage {
            scripts: vec![
                "https://example.com/a.js".to_string(),
                "https://cdn.example.com/b.js".to_string(),
                "https://example.com/c.js".to_string(),
            ],
            ..Default::default()
        };
        let mut fetcher = MockScriptFetcher::new();
        fetcher.expect_fetch_text().returning(|url| {
            if url.contains("cdn.") {
                Err(ExportError::script_fetch(url, "connection refused"))
            } else {
                Ok("ok();".to_string())
            }
        });
        let service = ExportService::with_collaborators(
            fixture.config.clone(),
            FakeLauncher::new(page, recorder.clone()),
            fetcher,
        );

        let status = service.run(&fixture.target, fixture.workspace().await).await;

        assert_eq!(status, RunStatus::Failure);
        assert!(fixture.exists("example.com/index.html"));
        assert!(fixture.exists("example.com/styles.css"));
        assert!(!fixture.exists("example.com/scripts.js"));
        assert!(!fixture.exists("example.com/index.pdf"));
        assert!(recorder.closed());

        let log = fixture.read("output");
        assert!(log.ends_with(
            "\nError: Failed to fetch script https://cdn.example.com/b.js: connection refused\n\n"
        ));
        assert!(!log.contains("Exporting the JS"));
    }

    #[tokio::test]
    async fn test_navigation_failure_closes_browser() {
        let fixture = Fixture::new();
        let recorder = SessionRecorder::default();
        let page = FakePage {
            navigate_error: Some(ExportError::NavigationFailed(
                "net::ERR_NAME_NOT_RESOLVED".to_string(),
            )),
            ..Default::default()
        };
        let service = ExportService::with_collaborators(
            fixture.config.clone(),
            FakeLauncher::new(page, recorder.clone()),
            MockScriptFetcher::new(),
        );

        let workspace = fixture.workspace().await.unwrap();
        let err = service.export(&fixture.target, &workspace).await.unwrap_err();

        assert!(matches!(err, ExportError::NavigationFailed(_)));
        assert!(recorder.closed());
        assert!(!fixture.exists("example.com/index.html"));
    }

    #[tokio::test]
    async fn test_blocked_stylesheet_still_reaches_pdf() {
        let fixture = Fixture::new();
        let recorder = SessionRecorder::default();
        let page = FakePage {
            sheets: vec![
                StyleSheetText::readable("a { color: red; }"),
                StyleSheetText::blocked("https://fonts.example.net/f.css", "SecurityError"),
            ],
            ..Default::default()
        };
        let service = ExportService::with_collaborators(
            fixture.config.clone(),
            FakeLauncher::new(page, recorder.clone()),
            MockScriptFetcher::new(),
        );

        let workspace = fixture.workspace().await.unwrap();
        let summary = service.export(&fixture.target, &workspace).await.unwrap();

        assert_eq!(summary.stage, ExportStage::Done);
        assert_eq!(summary.stylesheet_warnings, 1);
        assert!(fixture.read("example.com/styles.css").ends_with("a { color: red; }\n"));
        assert!(fixture.exists("example.com/index.pdf"));
    }

    #[tokio::test]
    async fn test_launch_failure_is_fatal() {
        let fixture = Fixture::new();
        let recorder = SessionRecorder::default();
        let service = ExportService::with_collaborators(
            fixture.config.clone(),
            FakeLauncher::failing(ExportError::BrowserLaunchFailed("no chrome".into()), recorder.clone()),
            MockScriptFetcher::new(),
        );

        let status = service.run(&fixture.target, fixture.workspace().await).await;

        assert_eq!(status, RunStatus::Failure);
        assert!(fixture.read("output").ends_with("\nError: Browser launch failed: no chrome\n\n"));
    }

    #[tokio::test]
    async fn test_rerun_overwrites_and_appends() {
        let fixture = Fixture::new();
        for html in ["<p>first</p>", "<p>second</p>"] {
            let page = FakePage {
                html: html.to_string(),
                ..Default::default()
            };
            let service = ExportService::with_collaborators(
                fixture.config.clone(),
                FakeLauncher::new(page, SessionRecorder::default()),
                MockScriptFetcher::new(),
            );
            let status = service.run(&fixture.target, fixture.workspace().await).await;
            assert!(status.is_success());
        }

        assert_eq!(fixture.read("example.com/index.html"), "<p>second</p>");
        let log = fixture.read("output");
        assert_eq!(log.matches("# Output - ").count(), 2);
        assert_eq!(log.matches("Exporting the PDF").count(), 2);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(RunStatus::Success.exit_code(), 0);
        assert_eq!(RunStatus::Failure.exit_code(), 1);
    }
}
