//! Extraction pipeline entry point. One call per document: decode, quota
//! checks, format dispatch, optional OCR, metrics finalization.

use base64::Engine as _;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::domain::document::{ExtractionOutput, ExtractionRequest, FileType};
use crate::domain::error::{AppError, Result};
use crate::domain::metrics::ProcessingMetrics;
use crate::infrastructure::config::QuotaProvider;
use crate::infrastructure::ocr::{CloudOcrBackend, TesseractBackend};

use super::format_detector;
use super::ocr_chain::OcrEngineChain;
use super::quota::QuotaEnforcer;

mod parsers;

pub struct DocumentExtraction {
    ocr_chain: Arc<OcrEngineChain>,
    quota: QuotaEnforcer,
}

impl DocumentExtraction {
    pub fn new(ocr_chain: Arc<OcrEngineChain>, quota: QuotaEnforcer) -> Self {
        Self { ocr_chain, quota }
    }

    /// Wire up the default backend chain (cloud first when configured,
    /// local tesseract as the terminal fallback) and file/env quotas.
    pub fn from_env() -> Result<Self> {
        let chain = OcrEngineChain::new(vec![
            Arc::new(CloudOcrBackend::from_env()),
            Arc::new(TesseractBackend::default()),
        ]);
        let provider = Arc::new(QuotaProvider::load()?);
        Ok(Self::new(Arc::new(chain), QuotaEnforcer::new(provider)))
    }

    pub async fn process_document(&self, request: &ExtractionRequest) -> Result<ExtractionOutput> {
        let started = Instant::now();
        let mut metrics = ProcessingMetrics::new(&request.filename, &request.content_type);

        let bytes = match base64::engine::general_purpose::STANDARD.decode(&request.content_base64)
        {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(filename = %request.filename, %err, "base64 decode failed");
                metrics.record_error(format!("base64 decode failed: {}", err));
                metrics.finalize(started);
                return Ok(ExtractionOutput {
                    text: String::new(),
                    size_bytes: 0,
                    metrics,
                });
            }
        };
        let size_bytes = bytes.len();

        check_deadline(request.deadline)?;
        self.quota.check_file_size(size_bytes, &mut metrics)?;

        let file_type = format_detector::detect(&request.content_type, &request.filename)?;
        metrics.file_type = Some(file_type);
        info!(
            filename = %request.filename,
            file_type = %file_type,
            size_bytes,
            "processing document"
        );

        let text = match file_type {
            FileType::Pdf => self.extract_pdf(&bytes, request, &mut metrics).await?,
            FileType::Docx => self.extract_docx(&bytes, &mut metrics),
            FileType::Pptx => self.extract_pptx(&bytes, &mut metrics),
            FileType::Xlsx => self.extract_xlsx(&bytes, &mut metrics),
            FileType::Csv => self.extract_csv(&bytes, &mut metrics),
            FileType::Json => self.extract_json(&bytes, &mut metrics),
            FileType::Markdown => self.extract_markdown(&bytes, &mut metrics),
            FileType::Html => self.extract_html(&bytes, &mut metrics),
            FileType::Txt => Self::extract_txt(&bytes),
        };

        metrics.total_chars = text.chars().count();
        self.quota
            .check_extracted_chars(metrics.total_chars, &mut metrics)?;

        if text.trim().chars().count() < 10 {
            metrics.record_warning("minimal content extracted".to_string());
        }

        metrics.finalize(started);
        Ok(ExtractionOutput {
            text,
            size_bytes,
            metrics,
        })
    }
}

fn check_deadline(deadline: Option<Instant>) -> Result<()> {
    match deadline {
        Some(deadline) if Instant::now() >= deadline => Err(AppError::Cancelled(
            "processing deadline reached".to_string(),
        )),
        _ => Ok(()),
    }
}
