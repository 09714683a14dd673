//! docsift extracts plain text from uploaded documents: PDF, Office
//! formats, tabular data and markup. Scanned PDFs fall back to an ordered
//! OCR backend chain; large tabular inputs are deterministically sampled;
//! file-size and output-size quotas bound every request.
//!
//! The entry point is [`DocumentExtraction::process_document`].

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::use_cases::extraction::DocumentExtraction;
pub use application::use_cases::ocr_chain::{OcrBackend, OcrEngineChain, OcrFailure, OcrOutcome};
pub use application::use_cases::quota::QuotaEnforcer;
pub use domain::document::{ExtractionMode, ExtractionOutput, ExtractionRequest, FileType};
pub use domain::error::{AppError, QuotaKind, Result};
pub use domain::metrics::ProcessingMetrics;
pub use domain::quota::QuotaConfig;
pub use infrastructure::config::QuotaProvider;
pub use infrastructure::ocr::{CloudOcrBackend, TesseractBackend};

/// Install the global tracing subscriber, honoring `RUST_LOG`.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
