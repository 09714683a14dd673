//! Local OCR backend: rasterize PDF pages with `pdftoppm`, preprocess low
//! contrast pages, then run `tesseract` in TSV mode for text plus word
//! confidences. Binaries are resolved via `PDFTOPPM_CMD`, `TESSERACT_CMD`
//! and `TESSDATA_PREFIX` environment overrides.

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

use crate::application::use_cases::ocr_chain::{OcrBackend, OcrFailure, OcrOutcome, OcrPage};

use super::preprocess;

const RASTER_DPI: u32 = 300;

struct OcrTempDir {
    path: PathBuf,
}

impl OcrTempDir {
    fn new(prefix: &str) -> std::io::Result<Self> {
        let path = std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::new_v4()));
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }
}

impl Drop for OcrTempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

pub struct TesseractBackend {
    languages: String,
}

impl TesseractBackend {
    pub fn new(languages: impl Into<String>) -> Self {
        Self {
            languages: languages.into(),
        }
    }

    fn new_tesseract_command() -> Command {
        let tesseract_cmd =
            std::env::var("TESSERACT_CMD").unwrap_or_else(|_| "tesseract".to_string());
        let mut command = Command::new(tesseract_cmd);
        if let Ok(tessdata_prefix) = std::env::var("TESSDATA_PREFIX") {
            command.env("TESSDATA_PREFIX", tessdata_prefix);
        }
        command
    }

    fn rasterize_pdf(pdf_path: &Path, out_dir: &Path) -> Option<Vec<PathBuf>> {
        let pdftoppm_cmd = std::env::var("PDFTOPPM_CMD").unwrap_or_else(|_| "pdftoppm".to_string());
        debug!(command = %pdftoppm_cmd, "rasterizing PDF for OCR");

        let output_prefix = out_dir.join("page");
        let output = Command::new(&pdftoppm_cmd)
            .arg("-png")
            .arg("-r")
            .arg(RASTER_DPI.to_string())
            .arg(pdf_path)
            .arg(output_prefix.as_os_str())
            .output();

        let output = match output {
            Ok(output) => output,
            Err(err) => {
                warn!(%err, "pdftoppm not available");
                return None;
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(stderr = %stderr.trim(), "pdftoppm failed");
            return None;
        }

        let mut images: Vec<PathBuf> = match fs::read_dir(out_dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.extension().map(|ext| ext == "png").unwrap_or(false))
                .collect(),
            Err(err) => {
                warn!(%err, "failed to read rasterization output dir");
                return None;
            }
        };

        images.sort();
        if images.is_empty() {
            warn!("pdftoppm produced no images");
            return None;
        }

        Some(images)
    }

    fn run_tesseract_tsv(
        input_path: &Path,
        languages: &str,
    ) -> Result<(String, Option<f32>), OcrFailure> {
        let output = Self::new_tesseract_command()
            .arg(input_path.as_os_str())
            .arg("stdout")
            .arg("-l")
            .arg(languages)
            .arg("tsv")
            .output()
            .map_err(|err| OcrFailure::Unavailable(format!("tesseract failed to start: {}", err)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrFailure::Engine(format!(
                "tesseract exited with failure: {}",
                stderr.trim()
            )));
        }

        Ok(parse_tsv(&String::from_utf8_lossy(&output.stdout)))
    }

    fn ocr_image(image_path: &Path, languages: &str) -> Result<(String, Option<f32>), OcrFailure> {
        let (ocr_path, preprocessed) = if preprocess::needs_preprocessing(image_path) {
            debug!(image = %image_path.display(), "applying OCR preprocessing");
            match preprocess::preprocess_for_ocr(image_path) {
                Some(path) => (path.clone(), Some(path)),
                None => (image_path.to_path_buf(), None),
            }
        } else {
            (image_path.to_path_buf(), None)
        };

        let result = Self::run_tesseract_tsv(&ocr_path, languages);
        if let Some(path) = preprocessed {
            let _ = fs::remove_file(path);
        }
        result
    }

    fn recognize_blocking(document: &[u8], languages: &str) -> Result<OcrOutcome, OcrFailure> {
        let temp_dir = OcrTempDir::new("docsift-ocr")
            .map_err(|err| OcrFailure::Engine(format!("failed to create temp dir: {}", err)))?;
        let pdf_path = temp_dir.path.join("input.pdf");
        fs::write(&pdf_path, document)
            .map_err(|err| OcrFailure::Engine(format!("failed to write temp file: {}", err)))?;

        let mut pages: Vec<OcrPage> = Vec::new();
        let mut confidences: Vec<f32> = Vec::new();

        match Self::rasterize_pdf(&pdf_path, &temp_dir.path) {
            Some(images) => {
                for (idx, image_path) in images.iter().enumerate() {
                    let page_number = (idx + 1) as i64;
                    match Self::ocr_image(image_path, languages) {
                        Ok((text, confidence)) => {
                            if !text.trim().is_empty() {
                                pages.push(OcrPage {
                                    page_number,
                                    text: text.trim().to_string(),
                                });
                                if let Some(confidence) = confidence {
                                    confidences.push(confidence);
                                }
                            }
                        }
                        Err(failure) => {
                            warn!(page = page_number, %failure, "page OCR failed");
                        }
                    }
                }
            }
            None => {
                // No rasterizer; tesseract can consume some PDFs directly.
                let (text, confidence) = Self::run_tesseract_tsv(&pdf_path, languages)?;
                if !text.trim().is_empty() {
                    pages.push(OcrPage {
                        page_number: 1,
                        text: text.trim().to_string(),
                    });
                    if let Some(confidence) = confidence {
                        confidences.push(confidence);
                    }
                }
            }
        }

        if pages.is_empty() {
            return Err(OcrFailure::EmptyResult);
        }

        let confidence = if confidences.is_empty() {
            None
        } else {
            Some(confidences.iter().sum::<f32>() / confidences.len() as f32)
        };

        Ok(OcrOutcome::from_pages(pages, confidence))
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new("eng")
    }
}

#[async_trait]
impl OcrBackend for TesseractBackend {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        // Tried unconditionally; a missing binary surfaces as a structured
        // per-attempt failure, not a missing registration.
        true
    }

    async fn recognize(&self, document: &[u8]) -> Result<OcrOutcome, OcrFailure> {
        let document = document.to_vec();
        let languages = self.languages.clone();
        tokio::task::spawn_blocking(move || Self::recognize_blocking(&document, &languages))
            .await
            .map_err(|err| OcrFailure::Engine(format!("OCR task panicked: {}", err)))?
    }
}

/// Parse tesseract TSV output into line-joined text plus a mean word
/// confidence in `0.0..=1.0`.
fn parse_tsv(tsv: &str) -> (String, Option<f32>) {
    let mut text = String::new();
    let mut confidences: Vec<f32> = Vec::new();
    let mut last_line_key: Option<(u32, u32, u32, u32)> = None;

    for record in tsv.lines().skip(1) {
        let cols: Vec<&str> = record.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }

        let key = (
            cols[1].parse().unwrap_or(0),
            cols[2].parse().unwrap_or(0),
            cols[3].parse().unwrap_or(0),
            cols[4].parse().unwrap_or(0),
        );
        let word = cols[11].trim();
        if word.is_empty() {
            continue;
        }

        if last_line_key.is_some() && last_line_key != Some(key) {
            text.push('\n');
        } else if last_line_key.is_some() {
            text.push(' ');
        }
        text.push_str(word);
        last_line_key = Some(key);

        if let Ok(confidence) = cols[10].parse::<f32>() {
            if confidence >= 0.0 {
                confidences.push(confidence / 100.0);
            }
        }
    }

    let confidence = if confidences.is_empty() {
        None
    } else {
        Some(confidences.iter().sum::<f32>() / confidences.len() as f32)
    };

    (text, confidence)
}
