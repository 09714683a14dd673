use calamine::{DataType as _, Reader};
use std::io::Cursor;
use tracing::warn;

use crate::application::use_cases::extraction::DocumentExtraction;
use crate::application::use_cases::tabular_sampler::{
    enforce_byte_cap, sample, SamplingProfile, Table, WORKBOOK_BYTE_CAP,
};
use crate::domain::document::ExtractionMode;
use crate::domain::metrics::ProcessingMetrics;

impl DocumentExtraction {
    /// Every sheet is sampled independently with the sheet profile; the
    /// byte cap applies to the assembled workbook text.
    pub(in crate::application::use_cases::extraction) fn extract_xlsx(
        &self,
        bytes: &[u8],
        metrics: &mut ProcessingMetrics,
    ) -> String {
        let mut workbook = match calamine::Xlsx::new(Cursor::new(bytes)) {
            Ok(workbook) => workbook,
            Err(err) => {
                warn!(%err, "XLSX open failed");
                metrics.record_error(format!("XLSX open failed: {}", err));
                return String::new();
            }
        };

        let sheet_names = workbook.sheet_names().to_vec();
        metrics.page_count = (sheet_names.len().max(1)) as i64;
        let profile = SamplingProfile::sheet();

        let mut sections: Vec<String> = Vec::new();
        for sheet_name in &sheet_names {
            let range = match workbook.worksheet_range(sheet_name) {
                Ok(range) => range,
                Err(err) => {
                    metrics.record_error(format!("sheet '{}' unreadable: {}", sheet_name, err));
                    continue;
                }
            };

            let rows: Vec<Vec<String>> = range
                .rows()
                .map(|row| row.iter().map(cell_text).collect())
                .filter(|cells: &Vec<String>| cells.iter().any(|cell| !cell.is_empty()))
                .collect();
            if rows.is_empty() {
                continue;
            }

            let table = Table::from_rows(rows);
            let sampled = sample(&table, &format!("Sheet: {}", sheet_name), &profile);
            metrics.rows_sampled += sampled.rows_sampled;
            if sampled.optimization_applied {
                metrics.optimization_applied = true;
                metrics.extraction_mode = ExtractionMode::SmartSampling;
            }
            sections.push(format!("# Sheet: {}\n{}", sheet_name, sampled.text));
        }

        let (text, truncated) = enforce_byte_cap(sections.join("\n\n"), WORKBOOK_BYTE_CAP);
        if truncated {
            metrics.record_warning("workbook output truncated at byte cap".to_string());
        }
        text
    }
}

fn cell_text(cell: &calamine::Data) -> String {
    match cell {
        calamine::Data::Empty => String::new(),
        calamine::Data::String(value) => value.trim().to_string(),
        other => other
            .as_string()
            .unwrap_or_else(|| format!("{}", other))
            .trim()
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_render_their_scalar_values() {
        assert_eq!(cell_text(&calamine::Data::Empty), "");
        assert_eq!(cell_text(&calamine::Data::String("  ok ".into())), "ok");
        assert_eq!(cell_text(&calamine::Data::Int(42)), "42");
        assert_eq!(cell_text(&calamine::Data::Bool(true)), "true");
    }
}
