use csv::{ReaderBuilder, Trim};

use crate::application::use_cases::extraction::DocumentExtraction;
use crate::application::use_cases::tabular_sampler::{
    enforce_byte_cap, sample, SamplingProfile, Table, CSV_BYTE_CAP,
};
use crate::domain::document::ExtractionMode;
use crate::domain::metrics::ProcessingMetrics;

impl DocumentExtraction {
    pub(in crate::application::use_cases::extraction) fn extract_csv(
        &self,
        bytes: &[u8],
        metrics: &mut ProcessingMetrics,
    ) -> String {
        let content = decode_text(bytes);
        let rows = parse_rows(&content);
        if rows.is_empty() {
            metrics.record_error("CSV contained no data rows".to_string());
            return String::new();
        }

        let table = Table::from_rows(rows);
        let sampled = sample(&table, "CSV", &SamplingProfile::csv());
        metrics.rows_sampled = sampled.rows_sampled;
        if sampled.optimization_applied {
            metrics.optimization_applied = true;
            metrics.extraction_mode = ExtractionMode::SmartSampling;
        }

        let (text, truncated) = enforce_byte_cap(sampled.text, CSV_BYTE_CAP);
        if truncated {
            metrics.record_warning("CSV output truncated at byte cap".to_string());
        }
        text
    }
}

/// UTF-8 first; non-UTF-8 input is retried as Windows-1252 so common
/// Latin-1 exports survive instead of turning into replacement runs.
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

fn parse_rows(content: &str) -> Vec<Vec<String>> {
    let delimiter = detect_delimiter(content);
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records().flatten() {
        let row: Vec<String> = record.iter().map(|field| field.to_string()).collect();
        if row.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows.push(row);
    }
    rows
}

/// Score comma, semicolon, tab and pipe over the first ten lines by mean
/// occurrence discounted by spread; comma wins ties.
fn detect_delimiter(content: &str) -> u8 {
    let candidates = [b',', b';', b'\t', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();
    if sample_lines.is_empty() {
        return b',';
    }

    let mut best_delimiter = b',';
    let mut best_score = 0.0f32;

    for &delimiter in &candidates {
        let field_counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| line.bytes().filter(|&b| b == delimiter).count())
            .collect();

        let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
        let variance = field_counts
            .iter()
            .map(|&count| (count as f32 - avg).powi(2))
            .sum::<f32>()
            / field_counts.len() as f32;
        let score = avg / (1.0 + variance.sqrt());

        if score > best_score {
            best_score = score;
            best_delimiter = delimiter;
        }
    }

    best_delimiter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semicolon_files_are_sniffed() {
        let content = "a;b;c\n1;2;3\n4;5;6\n";
        assert_eq!(detect_delimiter(content), b';');
        let rows = parse_rows(content);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn comma_is_the_tiebreak_default() {
        assert_eq!(detect_delimiter("no delimiters here"), b',');
        assert_eq!(detect_delimiter(""), b',');
    }

    #[test]
    fn blank_rows_are_dropped() {
        let rows = parse_rows("a,b\n,,\n1,2\n");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn latin1_bytes_decode_without_replacement() {
        // "café" in Windows-1252
        let bytes = [b'c', b'a', b'f', 0xE9];
        assert_eq!(decode_text(&bytes), "caf\u{e9}");
    }
}
