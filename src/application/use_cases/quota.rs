use std::sync::Arc;
use tracing::warn;

use crate::domain::error::{AppError, QuotaKind, Result};
use crate::domain::metrics::ProcessingMetrics;
use crate::infrastructure::config::QuotaProvider;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Validates byte size before extraction and character count after it,
/// against the current config snapshot.
pub struct QuotaEnforcer {
    provider: Arc<QuotaProvider>,
}

impl QuotaEnforcer {
    pub fn new(provider: Arc<QuotaProvider>) -> Self {
        Self { provider }
    }

    /// Pre-extraction check. A hard violation fails before any extraction
    /// work occurs; the warn band records a warning and proceeds.
    pub fn check_file_size(&self, size_bytes: usize, metrics: &mut ProcessingMetrics) -> Result<()> {
        let quotas = self.provider.snapshot();
        let size_mb = size_bytes as f64 / BYTES_PER_MB;

        if size_mb > quotas.max_file_size_mb {
            let message = format!(
                "file is {:.1} MB, limit is {:.1} MB",
                size_mb, quotas.max_file_size_mb
            );
            metrics.record_error(message.clone());
            return Err(AppError::QuotaExceeded(QuotaKind::FileSize, message));
        }

        if size_mb > quotas.warn_file_size_mb {
            warn!(size_mb, "file size above warning threshold");
            metrics.record_warning(format!(
                "file is {:.1} MB, above warning threshold of {:.1} MB",
                size_mb, quotas.warn_file_size_mb
            ));
        }

        Ok(())
    }

    /// Post-extraction check. Extraction has already completed and run its
    /// bookkeeping when this fails.
    pub fn check_extracted_chars(
        &self,
        total_chars: usize,
        metrics: &mut ProcessingMetrics,
    ) -> Result<()> {
        let quotas = self.provider.snapshot();

        if total_chars > quotas.max_extracted_chars {
            let message = format!(
                "extracted {} characters, limit is {}",
                total_chars, quotas.max_extracted_chars
            );
            metrics.record_error(message.clone());
            return Err(AppError::QuotaExceeded(QuotaKind::ExtractedChars, message));
        }

        if total_chars > quotas.warn_extracted_chars {
            warn!(total_chars, "extracted size above warning threshold");
            metrics.record_warning(format!(
                "extracted {} characters, above warning threshold of {}",
                total_chars, quotas.warn_extracted_chars
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::quota::QuotaConfig;

    fn enforcer() -> QuotaEnforcer {
        let config = QuotaConfig {
            max_file_size_mb: 10.0,
            warn_file_size_mb: 5.0,
            max_extracted_chars: 1000,
            warn_extracted_chars: 500,
        };
        QuotaEnforcer::new(Arc::new(QuotaProvider::with_config(config).unwrap()))
    }

    #[test]
    fn oversized_file_is_rejected() {
        let mut metrics = ProcessingMetrics::new("big.pdf", "application/pdf");
        let size = (15.0 * 1024.0 * 1024.0) as usize;
        let err = enforcer().check_file_size(size, &mut metrics).unwrap_err();

        assert!(matches!(
            err,
            AppError::QuotaExceeded(QuotaKind::FileSize, _)
        ));
        assert_eq!(metrics.errors.len(), 1);
    }

    #[test]
    fn warn_band_records_warning_and_proceeds() {
        let mut metrics = ProcessingMetrics::new("mid.pdf", "application/pdf");
        let size = (7.0 * 1024.0 * 1024.0) as usize;

        enforcer().check_file_size(size, &mut metrics).unwrap();
        assert_eq!(metrics.warnings.len(), 1);
        assert!(metrics.errors.is_empty());
    }

    #[test]
    fn small_file_passes_silently() {
        let mut metrics = ProcessingMetrics::new("small.txt", "text/plain");
        enforcer().check_file_size(1024, &mut metrics).unwrap();
        assert!(metrics.warnings.is_empty());
        assert!(metrics.errors.is_empty());
    }

    #[test]
    fn char_quota_is_enforced_after_extraction() {
        let mut metrics = ProcessingMetrics::new("big.txt", "text/plain");
        metrics.total_chars = 2000;

        let err = enforcer()
            .check_extracted_chars(2000, &mut metrics)
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::QuotaExceeded(QuotaKind::ExtractedChars, _)
        ));
        // Metrics were populated before the failure surfaced.
        assert_eq!(metrics.total_chars, 2000);

        let mut metrics = ProcessingMetrics::new("mid.txt", "text/plain");
        enforcer().check_extracted_chars(700, &mut metrics).unwrap();
        assert_eq!(metrics.warnings.len(), 1);
    }
}
