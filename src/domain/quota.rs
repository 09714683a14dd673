use serde::{Deserialize, Serialize};

use super::error::{AppError, Result};

/// Size quotas for one process. Loaded once (or republished on explicit
/// reload) and read-only for the duration of a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Hard reject bound on decoded input size.
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: f64,

    /// Soft bound; exceeding it records a warning and proceeds.
    #[serde(default = "default_warn_file_size_mb")]
    pub warn_file_size_mb: f64,

    /// Hard reject bound on extracted character count.
    #[serde(default = "default_max_extracted_chars")]
    pub max_extracted_chars: usize,

    /// Soft bound on extracted character count.
    #[serde(default = "default_warn_extracted_chars")]
    pub warn_extracted_chars: usize,
}

fn default_max_file_size_mb() -> f64 {
    50.0
}

fn default_warn_file_size_mb() -> f64 {
    25.0
}

fn default_max_extracted_chars() -> usize {
    1_000_000
}

fn default_warn_extracted_chars() -> usize {
    500_000
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            warn_file_size_mb: default_warn_file_size_mb(),
            max_extracted_chars: default_max_extracted_chars(),
            warn_extracted_chars: default_warn_extracted_chars(),
        }
    }
}

impl QuotaConfig {
    /// Invariant: warn <= max on both axes.
    pub fn validate(&self) -> Result<()> {
        if self.max_file_size_mb <= 0.0 {
            return Err(AppError::ValidationError(
                "max_file_size_mb must be positive".to_string(),
            ));
        }
        if self.warn_file_size_mb > self.max_file_size_mb {
            return Err(AppError::ValidationError(format!(
                "warn_file_size_mb ({}) exceeds max_file_size_mb ({})",
                self.warn_file_size_mb, self.max_file_size_mb
            )));
        }
        if self.max_extracted_chars == 0 {
            return Err(AppError::ValidationError(
                "max_extracted_chars must be positive".to_string(),
            ));
        }
        if self.warn_extracted_chars > self.max_extracted_chars {
            return Err(AppError::ValidationError(format!(
                "warn_extracted_chars ({}) exceeds max_extracted_chars ({})",
                self.warn_extracted_chars, self.max_extracted_chars
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(QuotaConfig::default().validate().is_ok());
    }

    #[test]
    fn warn_above_max_is_rejected() {
        let config = QuotaConfig {
            warn_file_size_mb: 80.0,
            ..QuotaConfig::default()
        };
        assert!(config.validate().is_err());

        let config = QuotaConfig {
            warn_extracted_chars: 2_000_000,
            ..QuotaConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
