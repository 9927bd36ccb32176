//! # Site Export
//!
//! Saves a single web page as a set of static artifacts, rendered through
//! headless Chrome:
//!
//! ```text
//! dist/output                 append-only status log shared by all runs
//! dist/<site-id>/index.html   DOM serialized after scripts have run
//! dist/<site-id>/styles.css   every readable stylesheet, in document order
//! dist/<site-id>/scripts.js   every external script, with a provenance header
//! dist/<site-id>/index.pdf    A4 snapshot rendered with `screen` media
//! ```
//!
//! `<site-id>` is the target URL with its `http://` or `https://` prefix removed.
//!
//! ## Pipeline
//!
//! 1. [`SiteTarget::parse`] derives the site identifier.
//! 2. [`Workspace::prepare`] creates the directories and writes the run header.
//! 3. [`ExportService::run`] launches the browser, waits for network idle and
//!    writes the four artifacts, logging each one to the status file.
//!
//! Script bodies are downloaded concurrently; everything else is sequential.
//! The browser is closed on every path out of the pipeline.
//!
//! ## CLI Usage
//!
//! ```bash
//! site-export --website https://example.com
//! site-export -w https://example.com --output-dir exports --paper letter
//! ```

/// Configuration and settings
pub mod config;

/// Error types
pub mod error;

/// Target URL and site identifier
pub mod site;

/// Artifact names, run stages and text assembly
pub mod artifacts;

/// Output directories and the status log
pub mod workspace;

/// Network-idle wait used during navigation
pub mod network_idle;

/// Headless browser session
pub mod browser;

/// External script downloads
pub mod scripts;

/// Export driver
pub mod export_service;

/// Command-line interface implementation
pub mod cli;

/// Run metrics
pub mod telemetry;

/// Utility functions and helpers
pub mod utils;

#[cfg(test)]
mod test_support;


pub use artifacts::*;
pub use browser::*;
pub use cli::*;
pub use config::*;
pub use error::*;
pub use export_service::*;
pub use network_idle::*;
pub use scripts::*;
pub use site::*;
pub use utils::*;
pub use workspace::*;
