use serde::{Deserialize, Serialize};
use std::fmt;

/// Which quota bound was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuotaKind {
    FileSize,
    ExtractedChars,
}

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    Decode(String),
    UnsupportedFileType(String),
    QuotaExceeded(QuotaKind, String),
    Extraction(String),
    OcrBackend(String),
    Config(String),
    ValidationError(String),
    Cancelled(String),
    Internal(String),
    IoError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Decode(msg) => write!(f, "Decode error: {}", msg),
            AppError::UnsupportedFileType(msg) => write!(f, "Unsupported file type: {}", msg),
            AppError::QuotaExceeded(QuotaKind::FileSize, msg) => {
                write!(f, "File size quota exceeded: {}", msg)
            }
            AppError::QuotaExceeded(QuotaKind::ExtractedChars, msg) => {
                write!(f, "Extracted character quota exceeded: {}", msg)
            }
            AppError::Extraction(msg) => write!(f, "Extraction error: {}", msg),
            AppError::OcrBackend(msg) => write!(f, "OCR backend error: {}", msg),
            AppError::Config(msg) => write!(f, "Config error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::Cancelled(msg) => write!(f, "Cancelled: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
