use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::document::{ExtractionMode, FileType};

/// Mutable per-request record threaded through every stage and finalized
/// once before the result is returned.
///
/// `errors` and `warnings` are append-only for the lifetime of the request;
/// `total_chars` always equals the length of the text ultimately returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingMetrics {
    pub filename: String,
    pub content_type: String,
    pub file_type: Option<FileType>,
    pub extraction_mode: ExtractionMode,
    pub page_count: i64,
    pub total_chars: usize,
    pub processing_time_ms: u64,
    pub ocr_method: Option<String>,
    pub rows_sampled: usize,
    pub optimization_applied: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ProcessingMetrics {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            file_type: None,
            extraction_mode: ExtractionMode::Direct,
            page_count: 1,
            total_chars: 0,
            processing_time_ms: 0,
            ocr_method: None,
            rows_sampled: 0,
            optimization_applied: false,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn record_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Stamp the elapsed wall time. Called exactly once per request.
    pub fn finalize(&mut self, started: Instant) {
        self.processing_time_ms = started.elapsed().as_millis() as u64;
    }
}
