use pulldown_cmark::{Event, Parser, Tag};

use crate::application::use_cases::extraction::DocumentExtraction;
use crate::domain::metrics::ProcessingMetrics;

impl DocumentExtraction {
    /// Flatten markup to plain text; block boundaries become newlines.
    pub(in crate::application::use_cases::extraction) fn extract_markdown(
        &self,
        bytes: &[u8],
        _metrics: &mut ProcessingMetrics,
    ) -> String {
        let source = String::from_utf8_lossy(bytes);
        let mut text = String::new();

        for event in Parser::new(&source) {
            match event {
                Event::Text(chunk) | Event::Code(chunk) => text.push_str(&chunk),
                Event::SoftBreak | Event::HardBreak => text.push('\n'),
                Event::End(Tag::Paragraph)
                | Event::End(Tag::Heading(..))
                | Event::End(Tag::Item)
                | Event::End(Tag::CodeBlock(_))
                | Event::End(Tag::BlockQuote)
                | Event::End(Tag::TableRow)
                | Event::End(Tag::TableHead) => text.push('\n'),
                Event::End(Tag::TableCell) => text.push(' '),
                Event::Rule => text.push('\n'),
                _ => {}
            }
        }

        text.trim().to_string()
    }
}
