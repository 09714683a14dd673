use scraper::{ElementRef, Html, Selector};

use crate::application::use_cases::extraction::DocumentExtraction;
use crate::domain::metrics::ProcessingMetrics;

impl DocumentExtraction {
    /// Body text only; script, style and noscript subtrees contribute
    /// nothing.
    pub(in crate::application::use_cases::extraction) fn extract_html(
        &self,
        bytes: &[u8],
        _metrics: &mut ProcessingMetrics,
    ) -> String {
        let html = String::from_utf8_lossy(bytes);
        let document = Html::parse_document(&html);

        let body_selector = Selector::parse("body").unwrap();
        let root = document
            .select(&body_selector)
            .next()
            .unwrap_or_else(|| document.root_element());

        let mut lines: Vec<String> = Vec::new();
        collect_text(root, &mut lines);
        lines.join("\n")
    }
}

fn collect_text(element: ElementRef<'_>, lines: &mut Vec<String>) {
    if matches!(element.value().name(), "script" | "style" | "noscript") {
        return;
    }
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            collect_text(child_element, lines);
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }
    }
}
