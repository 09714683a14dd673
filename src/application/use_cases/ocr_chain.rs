//! Ordered OCR backend fallback chain.
//!
//! Each backend attempt is isolated: failures and empty results are
//! recorded as structured errors and fall through to the next backend.
//! Exhaustion is a degraded success, never an exception past the chain
//! boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::domain::error::{AppError, Result};
use crate::domain::metrics::ProcessingMetrics;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrPage {
    pub page_number: i64,
    pub text: String,
}

/// A successful backend attempt. Never partially filled: `text` is the
/// page-ordered concatenation of `pages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrOutcome {
    pub text: String,
    pub pages: Vec<OcrPage>,
    pub confidence: Option<f32>,
}

impl OcrOutcome {
    pub fn from_pages(pages: Vec<OcrPage>, confidence: Option<f32>) -> Self {
        let text = pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        Self {
            text,
            pages,
            confidence,
        }
    }
}

/// Typed failure reason for one backend attempt.
#[derive(Debug, Clone)]
pub enum OcrFailure {
    Unavailable(String),
    Http(String),
    Engine(String),
    EmptyResult,
}

impl fmt::Display for OcrFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OcrFailure::Unavailable(msg) => write!(f, "backend unavailable: {}", msg),
            OcrFailure::Http(msg) => write!(f, "request failed: {}", msg),
            OcrFailure::Engine(msg) => write!(f, "engine failed: {}", msg),
            OcrFailure::EmptyResult => write!(f, "OCR produced no text"),
        }
    }
}

#[async_trait]
pub trait OcrBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the backend has everything it needs to attempt recognition.
    /// Resolved once at chain construction, not probed per call.
    fn is_available(&self) -> bool;

    async fn recognize(&self, document: &[u8]) -> std::result::Result<OcrOutcome, OcrFailure>;
}

pub struct OcrEngineChain {
    backends: Vec<Arc<dyn OcrBackend>>,
}

impl OcrEngineChain {
    /// Build the chain's capability table: unavailable backends are absent,
    /// not retried per request.
    pub fn new(candidates: Vec<Arc<dyn OcrBackend>>) -> Self {
        let backends: Vec<Arc<dyn OcrBackend>> = candidates
            .into_iter()
            .filter(|backend| {
                if backend.is_available() {
                    true
                } else {
                    info!(backend = backend.name(), "OCR backend not configured, skipping");
                    false
                }
            })
            .collect();
        Self { backends }
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Try backends in order until one yields non-empty text. On total
    /// exhaustion returns empty text with `ocr_method == "failed"`.
    pub async fn recognize(
        &self,
        document: &[u8],
        metrics: &mut ProcessingMetrics,
        deadline: Option<Instant>,
    ) -> Result<String> {
        for backend in &self.backends {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Err(AppError::Cancelled(
                        "deadline reached before OCR attempt".to_string(),
                    ));
                }
            }

            match backend.recognize(document).await {
                Ok(outcome) if !outcome.text.trim().is_empty() => {
                    info!(
                        backend = backend.name(),
                        pages = outcome.pages.len(),
                        "OCR succeeded"
                    );
                    metrics.ocr_method = Some(backend.name().to_string());
                    if let Some(confidence) = outcome.confidence {
                        if confidence < 0.5 {
                            metrics.record_warning(format!(
                                "{}: low OCR confidence ({:.2})",
                                backend.name(),
                                confidence
                            ));
                        }
                    }
                    return Ok(outcome.text);
                }
                Ok(_) => {
                    // Empty or all-whitespace text is a failure for
                    // fall-through purposes.
                    warn!(backend = backend.name(), "OCR returned empty text");
                    metrics.record_error(format!("{}: {}", backend.name(), OcrFailure::EmptyResult));
                }
                Err(failure) => {
                    warn!(backend = backend.name(), %failure, "OCR backend failed");
                    metrics.record_error(format!("{}: {}", backend.name(), failure));
                }
            }
        }

        metrics.ocr_method = Some("failed".to_string());
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeBackend {
        name: &'static str,
        available: bool,
        result: std::result::Result<&'static str, &'static str>,
    }

    #[async_trait]
    impl OcrBackend for FakeBackend {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn recognize(&self, _document: &[u8]) -> std::result::Result<OcrOutcome, OcrFailure> {
            match self.result {
                Ok(text) => Ok(OcrOutcome::from_pages(
                    vec![OcrPage {
                        page_number: 1,
                        text: text.to_string(),
                    }],
                    None,
                )),
                Err(msg) => Err(OcrFailure::Engine(msg.to_string())),
            }
        }
    }

    fn chain(backends: Vec<FakeBackend>) -> OcrEngineChain {
        OcrEngineChain::new(
            backends
                .into_iter()
                .map(|b| Arc::new(b) as Arc<dyn OcrBackend>)
                .collect(),
        )
    }

    #[tokio::test]
    async fn unconfigured_backend_is_never_attempted() {
        let chain = chain(vec![
            FakeBackend {
                name: "cloud",
                available: false,
                result: Ok("cloud text"),
            },
            FakeBackend {
                name: "tesseract",
                available: true,
                result: Ok("local text"),
            },
        ]);
        assert_eq!(chain.backend_names(), vec!["tesseract"]);

        let mut metrics = ProcessingMetrics::new("scan.pdf", "application/pdf");
        let text = chain.recognize(b"pdf", &mut metrics, None).await.unwrap();
        assert_eq!(text, "local text");
        assert_eq!(metrics.ocr_method.as_deref(), Some("tesseract"));
        assert!(metrics.errors.is_empty());
    }

    #[tokio::test]
    async fn failed_backend_falls_through() {
        let chain = chain(vec![
            FakeBackend {
                name: "cloud",
                available: true,
                result: Err("connection refused"),
            },
            FakeBackend {
                name: "tesseract",
                available: true,
                result: Ok("local text"),
            },
        ]);

        let mut metrics = ProcessingMetrics::new("scan.pdf", "application/pdf");
        let text = chain.recognize(b"pdf", &mut metrics, None).await.unwrap();
        assert_eq!(text, "local text");
        assert_eq!(metrics.ocr_method.as_deref(), Some("tesseract"));
        assert_eq!(metrics.errors.len(), 1);
        assert!(metrics.errors[0].contains("cloud"));
    }

    #[tokio::test]
    async fn exhausted_chain_degrades_to_empty_text() {
        let chain = chain(vec![
            FakeBackend {
                name: "cloud",
                available: true,
                result: Err("timeout"),
            },
            FakeBackend {
                name: "tesseract",
                available: true,
                result: Ok("   "),
            },
        ]);

        let mut metrics = ProcessingMetrics::new("scan.pdf", "application/pdf");
        let text = chain.recognize(b"pdf", &mut metrics, None).await.unwrap();
        assert_eq!(text, "");
        assert_eq!(metrics.ocr_method.as_deref(), Some("failed"));
        // One structured error per failed attempt, whitespace counts as failure.
        assert_eq!(metrics.errors.len(), 2);
    }

    #[tokio::test]
    async fn expired_deadline_cancels_between_attempts() {
        let chain = chain(vec![FakeBackend {
            name: "tesseract",
            available: true,
            result: Ok("text"),
        }]);

        let mut metrics = ProcessingMetrics::new("scan.pdf", "application/pdf");
        let expired = Instant::now() - std::time::Duration::from_millis(1);
        let err = chain
            .recognize(b"pdf", &mut metrics, Some(expired))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Cancelled(_)));
    }
}
