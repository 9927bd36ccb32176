//! Headless browser session used for one export
//!
//! The export driver only talks to the [`BrowserLauncher`] and [`PageSession`]
//! traits. [`ChromeLauncher`] implements them on top of chromiumoxide.

use crate::{
    create_browser_config, merge_activity, wait_until_idle, Config, ExportError, NetworkActivity,
    NetworkIdle, PaperFormat, StyleSheetText,
};
use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::emulation::SetEmulatedMediaParams;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams as NetworkEnableParams, EventLoadingFailed, EventLoadingFinished,
    EventRequestWillBeSent,
};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Reads every stylesheet's rules; sheets that throw report the error instead.
const STYLE_SHEETS_JS: &str = r#"(() => Array.from(document.styleSheets).map((sheet) => {
    try {
        return {
            href: sheet.href,
            css_text: Array.from(sheet.cssRules).map((rule) => rule.cssText).join("\n"),
            error: null,
        };
    } catch (e) {
        return { href: sheet.href, css_text: "", error: String(e) };
    }
}))()"#;

/// External script URLs in document order; inline scripts have an empty `src`.
const SCRIPT_SOURCES_JS: &str =
    r#"(() => Array.from(document.scripts).map((script) => script.src).filter((src) => src))()"#;

/// What the driver needs from an open browser page.
#[async_trait]
pub trait PageSession: Send {
    /// Loads `url` and waits for network idle, bounded by `timeout`.
    async fn navigate(
        &mut self,
        url: &str,
        idle: &NetworkIdle,
        timeout: Duration,
    ) -> Result<(), ExportError>;

    /// Serialized DOM after scripts have run.
    async fn content(&mut self) -> Result<String, ExportError>;

    async fn style_sheets(&mut self) -> Result<Vec<StyleSheetText>, ExportError>;

    async fn script_sources(&mut self) -> Result<Vec<String>, ExportError>;

    async fn render_pdf(
        &mut self,
        media_type: &str,
        paper: PaperFormat,
        print_background: bool,
    ) -> Result<Vec<u8>, ExportError>;

    /// Releases the browser. Must be safe to call more than once.
    async fn close(&mut self);
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn PageSession>, ExportError>;
}

/// Launches a local Chrome/Chromium per export.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    config: Config,
}

impl ChromeLauncher {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn PageSession>, ExportError> {
        let session = ChromeSession::launch(&self.config).await?;
        Ok(Box::new(session))
    }
}

/// One browser process with a single page.
///
/// `close` shuts the browser down; if a session is dropped without it the
/// handler task is aborted and chromiumoxide kills the child process.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    closed: bool,
}

impl ChromeSession {
    pub async fn launch(config: &Config) -> Result<Self, ExportError> {
        let browser_config = create_browser_config(config)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ExportError::BrowserLaunchFailed(e.to_string()))?;

        // The handler stream drives all CDP traffic and must be polled continuously.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
            debug!("Handler stream ended");
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(ExportError::BrowserLaunchFailed(e.to_string()));
            }
        };

        info!("Browser launched");
        Ok(Self {
            browser,
            page,
            handler,
            closed: false,
        })
    }

    async fn evaluate<T: DeserializeOwned>(&self, expression: &str) -> Result<T, ExportError> {
        let params = EvaluateParams::builder()
            .expression(expression)
            .return_by_value(true)
            .await_promise(true)
            .build()
            .map_err(ExportError::PageError)?;

        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|e| ExportError::PageError(e.to_string()))?;

        result
            .into_value::<T>()
            .map_err(|e| ExportError::PageError(e.to_string()))
    }
}

#[async_trait]
impl PageSession for ChromeSession {
    async fn navigate(
        &mut self,
        url: &str,
        idle: &NetworkIdle,
        timeout: Duration,
    ) -> Result<(), ExportError> {
        let nav_err = |e: chromiumoxide::error::CdpError| ExportError::NavigationFailed(e.to_string());

        self.page
            .execute(NetworkEnableParams::default())
            .await
            .map_err(nav_err)?;

        // Subscribe before navigating so the document request itself is counted.
        let started = self
            .page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(nav_err)?
            .map(|e| NetworkActivity::Started(e.request_id.inner().clone()));
        let finished = self
            .page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(nav_err)?
            .map(|e| NetworkActivity::Finished(e.request_id.inner().clone()));
        let failed = self
            .page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(nav_err)?
            .map(|e| NetworkActivity::Failed(e.request_id.inner().clone()));
        let activity = merge_activity(started, finished, failed);

        let page = &self.page;
        let navigation = async move {
            page.goto(url).await.map_err(nav_err)?;
            wait_until_idle(Box::pin(activity), idle).await;
            Ok::<(), ExportError>(())
        };

        match tokio::time::timeout(timeout, navigation).await {
            Ok(result) => result,
            Err(_) => Err(ExportError::NavigationFailed(format!(
                "timed out after {timeout:?} waiting for {url}"
            ))),
        }
    }

    async fn content(&mut self) -> Result<String, ExportError> {
        self.page
            .content()
            .await
            .map_err(|e| ExportError::PageError(e.to_string()))
    }

    async fn style_sheets(&mut self) -> Result<Vec<StyleSheetText>, ExportError> {
        self.evaluate(STYLE_SHEETS_JS).await
    }

    async fn script_sources(&mut self) -> Result<Vec<String>, ExportError> {
        self.evaluate(SCRIPT_SOURCES_JS).await
    }

    async fn render_pdf(
        &mut self,
        media_type: &str,
        paper: PaperFormat,
        print_background: bool,
    ) -> Result<Vec<u8>, ExportError> {
        self.page
            .execute(SetEmulatedMediaParams::builder().media(media_type).build())
            .await
            .map_err(|e| ExportError::PdfRenderFailed(e.to_string()))?;

        let (paper_width, paper_height) = paper.dimensions();
        let params = PrintToPdfParams::builder()
            .paper_width(paper_width)
            .paper_height(paper_height)
            .print_background(print_background)
            .build();

        self.page
            .pdf(params)
            .await
            .map_err(|e| ExportError::PdfRenderFailed(e.to_string()))
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Failed to wait for browser exit: {}", e);
        }
        self.handler.abort();
        info!("Browser closed");
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if !self.closed {
            warn!("Browser session dropped without close; aborting handler");
            self.handler.abort();
        }
    }
}
