//! In-memory browser used by the driver tests.

use crate::{BrowserLauncher, ExportError, NetworkIdle, PageSession, PaperFormat, StyleSheetText};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the fake page returns for each call.
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub html: String,
    pub sheets: Vec<StyleSheetText>,
    pub scripts: Vec<String>,
    pub pdf: Vec<u8>,
    pub navigate_error: Option<ExportError>,
}

#[derive(Debug, Default)]
struct RecorderState {
    launched: bool,
    navigated: bool,
    closed: bool,
    pdf_media: Option<String>,
}

/// Shared view of what the driver did to the fake browser.
#[derive(Debug, Clone, Default)]
pub struct SessionRecorder {
    state: Arc<Mutex<RecorderState>>,
}

impl SessionRecorder {
    pub fn launched(&self) -> bool {
        self.state.lock().unwrap().launched
    }

    pub fn navigated(&self) -> bool {
        self.state.lock().unwrap().navigated
    }

    pub fn closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    pub fn pdf_media(&self) -> Option<String> {
        self.state.lock().unwrap().pdf_media.clone()
    }
}

pub struct FakeLauncher {
    page: FakePage,
    recorder: SessionRecorder,
    launch_error: Option<ExportError>,
}

impl FakeLauncher {
    pub fn new(page: FakePage, recorder: SessionRecorder) -> Self {
        Self {
            page,
            recorder,
            launch_error: None,
        }
    }

    pub fn failing(error: ExportError, recorder: SessionRecorder) -> Self {
        Self {
            page: FakePage::default(),
            recorder,
            launch_error: Some(error),
        }
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn PageSession>, ExportError> {
        if let Some(err) = &self.launch_error {
            return Err(err.clone());
        }
        self.recorder.state.lock().unwrap().launched = true;
        Ok(Box::new(FakeSession {
            page: self.page.clone(),
            recorder: self.recorder.clone(),
        }))
    }
}

struct FakeSession {
    page: FakePage,
    recorder: SessionRecorder,
}

#[async_trait]
impl PageSession for FakeSession {
    async fn navigate(
        &mut self,
        _url: &str,
        _idle: &NetworkIdle,
        _timeout: Duration,
    ) -> Result<(), ExportError> {
        self.recorder.state.lock().unwrap().navigated = true;
        match &self.page.navigate_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn content(&mut self) -> Result<String, ExportError> {
        Ok(self.page.html.clone())
    }

    async fn style_sheets(&mut self) -> Result<Vec<StyleSheetText>, ExportError> {
        Ok(self.page.sheets.clone())
    }

    async fn script_sources(&mut self) -> Result<Vec<String>, ExportError> {
        Ok(self.page.scripts.clone())
    }

    async fn render_pdf(
        &mut self,
        media_type: &str,
        _paper: PaperFormat,
        _print_background: bool,
    ) -> Result<Vec<u8>, ExportError> {
        self.recorder.state.lock().unwrap().pdf_media = Some(media_type.to_string());
        Ok(self.page.pdf.clone())
    }

    async fn close(&mut self) {
        self.recorder.state.lock().unwrap().closed = true;
    }
}
