use tracing::{debug, warn};

use crate::application::use_cases::extraction::{check_deadline, DocumentExtraction};
use crate::application::use_cases::sufficiency::{is_sufficient, DEFAULT_MIN_CHARS};
use crate::domain::document::{ExtractionMode, ExtractionRequest};
use crate::domain::error::Result;
use crate::domain::metrics::ProcessingMetrics;

impl DocumentExtraction {
    /// Embedded text layer first; the OCR chain only when that layer is
    /// missing, judged insufficient, or OCR is forced.
    pub(in crate::application::use_cases::extraction) async fn extract_pdf(
        &self,
        bytes: &[u8],
        request: &ExtractionRequest,
        metrics: &mut ProcessingMetrics,
    ) -> Result<String> {
        let direct = match lopdf::Document::load_mem(bytes) {
            Ok(document) => {
                let pages = document.get_pages();
                metrics.page_count = pages.len().max(1) as i64;

                let mut page_texts: Vec<String> = Vec::new();
                for page_number in pages.keys() {
                    match document.extract_text(&[*page_number]) {
                        Ok(text) => {
                            if !text.trim().is_empty() {
                                page_texts.push(text.trim().to_string());
                            }
                        }
                        Err(err) => {
                            metrics.record_error(format!(
                                "PDF page {} text extraction failed: {}",
                                page_number, err
                            ));
                        }
                    }
                }
                page_texts.join("\n\n")
            }
            Err(err) => {
                warn!(filename = %request.filename, %err, "PDF structure parse failed");
                metrics.record_error(format!("PDF parse failed: {}", err));
                String::new()
            }
        };

        if !request.force_ocr && is_sufficient(&direct, DEFAULT_MIN_CHARS) {
            metrics.extraction_mode = ExtractionMode::Direct;
            return Ok(direct);
        }

        debug!(
            filename = %request.filename,
            force_ocr = request.force_ocr,
            direct_chars = direct.chars().count(),
            "embedded text insufficient, running OCR chain"
        );
        check_deadline(request.deadline)?;
        metrics.extraction_mode = ExtractionMode::Ocr;
        self.ocr_chain
            .recognize(bytes, metrics, request.deadline)
            .await
    }
}
