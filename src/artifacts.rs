//! The four files written per run and the text assembly behind them.

use serde::{Deserialize, Serialize};

/// Fixed preamble of `styles.css`.
pub const STYLESHEET_HEADER: &str = "/* styles.css */\n@tailwind base;\n@tailwind components;\n@tailwind utilities;\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Html,
    Styles,
    Scripts,
    Pdf,
}

impl Artifact {
    pub fn file_name(self) -> &'static str {
        match self {
            Artifact::Html => "index.html",
            Artifact::Styles => "styles.css",
            Artifact::Scripts => "scripts.js",
            Artifact::Pdf => "index.pdf",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Artifact::Html => "html",
            Artifact::Styles => "css",
            Artifact::Scripts => "js",
            Artifact::Pdf => "pdf",
        }
    }
}

/// Progress through a single export run.
///
/// The run only ever moves forward; `Failed` absorbs any error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Init,
    Navigated,
    HtmlExported,
    CssExported,
    ScriptsExported,
    PdfExported,
    Done,
    Failed,
}

impl ExportStage {
    pub fn next(self) -> Self {
        match self {
            ExportStage::Init => ExportStage::Navigated,
            ExportStage::Navigated => ExportStage::HtmlExported,
            ExportStage::HtmlExported => ExportStage::CssExported,
            ExportStage::CssExported => ExportStage::ScriptsExported,
            ExportStage::ScriptsExported => ExportStage::PdfExported,
            ExportStage::PdfExported | ExportStage::Done => ExportStage::Done,
            ExportStage::Failed => ExportStage::Failed,
        }
    }

    /// Stage reached once `artifact` is on disk.
    pub fn after(artifact: Artifact) -> Self {
        match artifact {
            Artifact::Html => ExportStage::HtmlExported,
            Artifact::Styles => ExportStage::CssExported,
            Artifact::Scripts => ExportStage::ScriptsExported,
            Artifact::Pdf => ExportStage::PdfExported,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExportStage::Init => "init",
            ExportStage::Navigated => "navigated",
            ExportStage::HtmlExported => "html_exported",
            ExportStage::CssExported => "css_exported",
            ExportStage::ScriptsExported => "scripts_exported",
            ExportStage::PdfExported => "pdf_exported",
            ExportStage::Done => "done",
            ExportStage::Failed => "failed",
        }
    }
}

/// Rules of one `document.styleSheets` entry as read inside the page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StyleSheetText {
    pub href: Option<String>,
    pub css_text: String,
    /// Set when reading `cssRules` threw, usually a cross-origin sheet.
    pub error: Option<String>,
}

impl StyleSheetText {
    pub fn readable(css_text: impl Into<String>) -> Self {
        Self {
            href: None,
            css_text: css_text.into(),
            error: None,
        }
    }

    pub fn blocked(href: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            css_text: String::new(),
            error: Some(error.into()),
        }
    }
}

/// Header plus every sheet's rules in document order, one sheet per segment.
pub fn assemble_stylesheet(sheets: &[StyleSheetText]) -> String {
    let body = sheets
        .iter()
        .map(|sheet| {
            if sheet.error.is_some() {
                ""
            } else {
                sheet.css_text.as_str()
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("{STYLESHEET_HEADER}{body}")
}

/// Wraps a script body in a comment recording where it came from.
pub fn wrap_script(src: &str, website: &str, source: &str) -> String {
    format!("\n/** {src}\n*  {website}\n*/\n\n{source}\n")
}

pub fn assemble_scripts(wrapped: &[String]) -> String {
    wrapped.join("\n")
}
