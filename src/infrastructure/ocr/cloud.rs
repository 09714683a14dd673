//! Hosted OCR backend. Configured through `DOCSIFT_OCR_ENDPOINT` and
//! `DOCSIFT_OCR_API_KEY`; the backend reports itself unavailable unless
//! both are set, so the engine chain skips it silently on plain installs.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::application::use_cases::ocr_chain::{OcrBackend, OcrFailure, OcrOutcome, OcrPage};

const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Deserialize)]
struct ReadResponse {
    #[serde(default)]
    pages: Vec<ReadPage>,
}

#[derive(Deserialize)]
struct ReadPage {
    #[serde(default)]
    lines: Vec<ReadLine>,
}

#[derive(Deserialize)]
struct ReadLine {
    #[serde(default)]
    text: String,
    #[serde(default)]
    confidence: Option<f32>,
}

pub struct CloudOcrBackend {
    endpoint: Option<String>,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl CloudOcrBackend {
    pub fn from_env() -> Self {
        let endpoint = std::env::var("DOCSIFT_OCR_ENDPOINT")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let api_key = std::env::var("DOCSIFT_OCR_API_KEY")
            .ok()
            .filter(|value| !value.trim().is_empty());

        Self::new(endpoint, api_key)
    }

    pub fn new(endpoint: Option<String>, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint,
            api_key,
            client,
        }
    }

    fn read_url(&self) -> Option<String> {
        self.endpoint
            .as_deref()
            .map(|endpoint| format!("{}/v1/read", endpoint.trim_end_matches('/')))
    }
}

#[async_trait]
impl OcrBackend for CloudOcrBackend {
    fn name(&self) -> &'static str {
        "cloud"
    }

    fn is_available(&self) -> bool {
        self.endpoint.is_some() && self.api_key.is_some()
    }

    async fn recognize(&self, document: &[u8]) -> Result<OcrOutcome, OcrFailure> {
        let url = self
            .read_url()
            .ok_or_else(|| OcrFailure::Unavailable("cloud OCR endpoint not configured".into()))?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| OcrFailure::Unavailable("cloud OCR API key not configured".into()))?;

        debug!(%url, bytes = document.len(), "submitting document to cloud OCR");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .header("Content-Type", "application/octet-stream")
            .body(document.to_vec())
            .send()
            .await
            .map_err(|err| OcrFailure::Http(format!("cloud OCR request failed: {}", err)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OcrFailure::Http(format!(
                "cloud OCR returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: ReadResponse = response
            .json()
            .await
            .map_err(|err| OcrFailure::Http(format!("cloud OCR response malformed: {}", err)))?;

        let mut pages: Vec<OcrPage> = Vec::new();
        let mut confidences: Vec<f32> = Vec::new();

        for (idx, page) in parsed.pages.iter().enumerate() {
            let mut lines: Vec<&str> = Vec::new();
            for line in &page.lines {
                if !line.text.trim().is_empty() {
                    lines.push(line.text.trim());
                }
                if let Some(confidence) = line.confidence {
                    confidences.push(confidence);
                }
            }
            if !lines.is_empty() {
                pages.push(OcrPage {
                    page_number: (idx + 1) as i64,
                    text: lines.join("\n"),
                });
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
