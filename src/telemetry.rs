//! Run metrics, emitted through the global `metrics` recorder.
//!
//! Nothing is exported unless the embedding process installs a recorder.

use crate::{Artifact, ExportError, ExportStage};
use std::time::Duration;

pub const STAGE_COMPLETED: &str = "site_export_stage_completed_total";
pub const RUNS: &str = "site_export_runs_total";
pub const ARTIFACT_BYTES: &str = "site_export_artifact_bytes";
pub const RUN_DURATION: &str = "site_export_run_duration_seconds";
pub const STYLESHEET_WARNINGS: &str = "site_export_stylesheet_warnings_total";

pub fn record_stage(stage: ExportStage) {
    metrics::counter!(STAGE_COMPLETED, 1, "stage" => stage.as_str());
}

pub fn record_artifact(artifact: Artifact, bytes: usize) {
    metrics::histogram!(ARTIFACT_BYTES, bytes as f64, "artifact" => artifact.label());
}

pub fn record_stylesheet_warning() {
    metrics::counter!(STYLESHEET_WARNINGS, 1);
}

pub fn record_run(duration: Duration, outcome: Result<(), &ExportError>) {
    let status = match outcome {
        Ok(()) => "success",
        Err(err) => err.kind(),
    };
    metrics::counter!(RUNS, 1, "status" => status);
    metrics::histogram!(RUN_DURATION, duration.as_secs_f64());
}
