use std::io::Cursor;
use tracing::warn;

use crate::application::use_cases::extraction::DocumentExtraction;
use crate::domain::metrics::ProcessingMetrics;

impl DocumentExtraction {
    /// Slide decks are zip archives of XML; text lives in `a:t` runs under
    /// `ppt/slides/slideN.xml`. Slides are emitted in numeric order.
    pub(in crate::application::use_cases::extraction) fn extract_pptx(
        &self,
        bytes: &[u8],
        metrics: &mut ProcessingMetrics,
    ) -> String {
        let mut archive = match zip::ZipArchive::new(Cursor::new(bytes)) {
            Ok(archive) => archive,
            Err(err) => {
                warn!(%err, "PPTX archive open failed");
                metrics.record_error(format!("PPTX archive open failed: {}", err));
                return String::new();
            }
        };

        let mut slide_names: Vec<(usize, String)> = (0..archive.len())
            .filter_map(|index| archive.by_index(index).ok().map(|f| f.name().to_string()))
            .filter_map(|name| slide_number(&name).map(|number| (number, name)))
            .collect();
        slide_names.sort_by_key(|(number, _)| *number);

        let mut slides: Vec<String> = Vec::new();
        for (number, name) in &slide_names {
            let content = match archive.by_name(name) {
                Ok(file) => std::io::read_to_string(file),
                Err(err) => {
                    metrics.record_error(format!("slide {} unreadable: {}", number, err));
                    continue;
                }
            };
            match content {
                Ok(xml) => match slide_text(&xml) {
                    Ok(text) => {
                        if !text.trim().is_empty() {
                            slides.push(text);
                        }
                    }
                    Err(err) => {
                        metrics.record_error(format!("slide {} XML invalid: {}", number, err));
                    }
                },
                Err(err) => {
                    metrics.record_error(format!("slide {} unreadable: {}", number, err));
                }
            }
        }

        metrics.page_count = (slide_names.len().max(1)) as i64;
        slides.join("\n\n")
    }
}

fn slide_number(name: &str) -> Option<usize> {
    name.strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

/// Collect the text runs of one slide, one paragraph per line.
fn slide_text(xml: &str) -> Result<String, quick_xml::Error> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut in_text_run = false;
    let mut paragraph = String::new();
    let mut lines: Vec<String> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            quick_xml::events::Event::Start(ref e) => {
                if e.name().as_ref() == b"a:t" {
                    in_text_run = true;
                }
            }
            quick_xml::events::Event::End(ref e) => match e.name().as_ref() {
                b"a:t" => in_text_run = false,
                b"a:p" => {
                    if !paragraph.trim().is_empty() {
                        lines.push(paragraph.trim().to_string());
                    }
                    paragraph.clear();
                }
                _ => {}
            },
            quick_xml::events::Event::Text(e) if in_text_run => {
                paragraph.push_str(&e.unescape().unwrap_or_default());
            }
            quick_xml::events::Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !paragraph.trim().is_empty() {
        lines.push(paragraph.trim().to_string());
    }
    Ok(lines.join("\n"))
}
