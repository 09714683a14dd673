use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use super::metrics::ProcessingMetrics;

/// Canonical document kinds the pipeline knows how to extract.
/// Unresolvable inputs fail with `UnsupportedFileType`, never a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
    Pptx,
    Csv,
    Xlsx,
    Json,
    Markdown,
    Html,
    Txt,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Docx => "docx",
            FileType::Pptx => "pptx",
            FileType::Csv => "csv",
            FileType::Xlsx => "xlsx",
            FileType::Json => "json",
            FileType::Markdown => "markdown",
            FileType::Html => "html",
            FileType::Txt => "txt",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which strategy produced the final text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionMode {
    Direct,
    #[serde(rename = "OCR")]
    Ocr,
    SmartSampling,
}

impl ExtractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMode::Direct => "Direct",
            ExtractionMode::Ocr => "OCR",
            ExtractionMode::SmartSampling => "SmartSampling",
        }
    }
}

/// One document to extract. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub content_base64: String,
    pub content_type: String,
    pub filename: String,
    pub force_ocr: bool,
    /// Cooperative cancellation bound, checked at stage boundaries.
    pub deadline: Option<Instant>,
}

impl ExtractionRequest {
    pub fn new(
        content_base64: impl Into<String>,
        content_type: impl Into<String>,
        filename: impl Into<String>,
        force_ocr: bool,
    ) -> Self {
        Self {
            content_base64: content_base64.into(),
            content_type: content_type.into(),
            filename: filename.into(),
            force_ocr,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Final result of one request: extracted text, the decoded byte size,
/// and the per-request metrics record.
#[derive(Debug)]
pub struct ExtractionOutput {
    pub text: String,
    pub size_bytes: usize,
    pub metrics: ProcessingMetrics,
}
