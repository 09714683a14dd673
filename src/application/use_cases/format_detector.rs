use crate::domain::document::FileType;
use crate::domain::error::{AppError, Result};

use std::path::Path;

/// Resolve the declared media type plus filename to one canonical
/// `FileType`. Pure, no I/O.
///
/// If the declared type is too generic to match any rule, the detector
/// re-derives a media type from the filename extension and retries exactly
/// once. A guess identical to the original input must not retry again.
pub fn detect(media_type: &str, filename: &str) -> Result<FileType> {
    detect_inner(media_type, filename, false)
}

fn detect_inner(media_type: &str, filename: &str, retried: bool) -> Result<FileType> {
    let declared = media_type.trim().to_ascii_lowercase();
    let extension = file_extension(filename);

    if let Some(file_type) = match_rules(&declared, &extension) {
        return Ok(file_type);
    }

    if retried {
        return Err(AppError::UnsupportedFileType(format!(
            "{} ({})",
            media_type, filename
        )));
    }

    let guessed = mime_guess::from_path(filename)
        .first_raw()
        .unwrap_or_default()
        .to_ascii_lowercase();

    // Retry bound: an empty or identical guess would loop forever.
    if guessed.is_empty() || guessed == declared {
        return Err(AppError::UnsupportedFileType(format!(
            "{} ({})",
            media_type, filename
        )));
    }

    detect_inner(&guessed, filename, true)
}

fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Resolution order is fixed; first match wins.
fn match_rules(declared: &str, extension: &str) -> Option<FileType> {
    if declared.contains("pdf") || extension == "pdf" {
        return Some(FileType::Pdf);
    }
    if declared.contains("wordprocessingml") || declared.contains("msword") || extension == "docx" {
        return Some(FileType::Docx);
    }
    if declared.contains("presentationml")
        || declared.contains("powerpoint")
        || extension == "pptx"
    {
        return Some(FileType::Pptx);
    }
    if declared.contains("csv") || extension == "csv" {
        return Some(FileType::Csv);
    }
    if declared.contains("spreadsheetml") || declared.contains("excel") || extension == "xlsx" {
        return Some(FileType::Xlsx);
    }
    if declared.contains("json") || extension == "json" {
        return Some(FileType::Json);
    }
    if declared.contains("markdown") || extension == "md" || extension == "markdown" {
        return Some(FileType::Markdown);
    }
    if declared.contains("html") || extension == "html" || extension == "htm" {
        return Some(FileType::Html);
    }
    if declared.starts_with("text/plain") || extension == "txt" {
        return Some(FileType::Txt);
    }
    None
}
