//! Deterministic, size-bounded textual summarization of row/column data.
//!
//! Tier bounds, window sizes and byte caps are fixed configuration
//! constants, never derived from table statistics.

use std::collections::BTreeMap;

/// Literal marker appended to the data channel when a byte cap truncates
/// the assembled text. Kept byte-for-byte stable for existing consumers;
/// truncation is additionally surfaced as a metrics warning by the caller.
pub const TRUNCATION_MARKER: &str = "\n[... output truncated ...]";

pub const CSV_BYTE_CAP: usize = 50 * 1024;
pub const WORKBOOK_BYTE_CAP: usize = 100 * 1024;
pub const JSON_BYTE_CAP: usize = 50 * 1024;

/// Row/column data with an optional header row split off.
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Treat the first row as a header when it looks like one: every cell
    /// non-empty, none purely numeric, and data rows follow.
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Self {
        let headers = if rows.len() > 1 && looks_like_header(&rows[0]) {
            Some(rows.remove(0))
        } else {
            None
        };
        Self { headers, rows }
    }

    pub fn column_count(&self) -> usize {
        self.headers
            .as_ref()
            .map(|h| h.len())
            .or_else(|| self.rows.iter().map(|r| r.len()).max())
            .unwrap_or(0)
    }

    fn column_name(&self, idx: usize) -> String {
        self.headers
            .as_ref()
            .and_then(|h| h.get(idx))
            .filter(|name| !name.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| format!("column_{}", idx + 1))
    }
}

fn looks_like_header(row: &[String]) -> bool {
    !row.is_empty()
        && row.iter().all(|cell| {
            let trimmed = cell.trim();
            !trimmed.is_empty() && trimmed.parse::<f64>().is_err()
        })
}

/// Per-format tier bounds.
#[derive(Debug, Clone)]
pub struct SamplingProfile {
    pub small_max: usize,
    pub medium_max: usize,
    pub head_rows: usize,
    pub tail_rows: usize,
    pub middle_rows: usize,
    pub very_large: usize,
    pub column_cap: usize,
    pub categorical_summaries: bool,
}

impl SamplingProfile {
    pub fn csv() -> Self {
        Self {
            small_max: 100,
            medium_max: 500,
            head_rows: 30,
            tail_rows: 15,
            middle_rows: 15,
            very_large: 5000,
            column_cap: 20,
            categorical_summaries: false,
        }
    }

    pub fn sheet() -> Self {
        Self {
            small_max: 50,
            medium_max: 200,
            head_rows: 20,
            tail_rows: 10,
            middle_rows: 15,
            very_large: 1000,
            column_cap: 20,
            categorical_summaries: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SampledTable {
    pub text: String,
    pub rows_sampled: usize,
    pub optimization_applied: bool,
}

/// Deterministic given identical table content.
pub fn sample(table: &Table, label: &str, profile: &SamplingProfile) -> SampledTable {
    let n = table.rows.len();

    if n <= profile.small_max {
        return SampledTable {
            text: render_all(table, usize::MAX),
            rows_sampled: n,
            optimization_applied: false,
        };
    }

    if n <= profile.medium_max {
        return SampledTable {
            text: render_all(table, profile.column_cap),
            rows_sampled: n,
            optimization_applied: false,
        };
    }

    large_tier(table, label, profile)
}

fn large_tier(table: &Table, label: &str, profile: &SamplingProfile) -> SampledTable {
    let n = table.rows.len();
    let cols = table.column_count();
    let mut sections: Vec<String> = Vec::new();

    sections.push(format!("## {}: {} rows x {} columns", label, n, cols));
    let column_names: Vec<String> = (0..cols).map(|i| table.column_name(i)).collect();
    sections.push(format!("Columns: {}", column_names.join(", ")));

    sections.push(format!("### First {} rows", profile.head_rows));
    for row in table.rows.iter().take(profile.head_rows) {
        sections.push(render_row(row, profile.column_cap));
    }

    sections.push(format!("### Last {} rows", profile.tail_rows));
    for row in table.rows.iter().skip(n - profile.tail_rows) {
        sections.push(render_row(row, profile.column_cap));
    }

    let mut rows_sampled = profile.head_rows + profile.tail_rows;
    if n > profile.very_large {
        let start = n / 2 - profile.middle_rows / 2;
        sections.push(format!(
            "### Middle sample ({} rows from row {})",
            profile.middle_rows,
            start + 1
        ));
        for row in table.rows.iter().skip(start).take(profile.middle_rows) {
            sections.push(render_row(row, profile.column_cap));
        }
        rows_sampled += profile.middle_rows;
    }

    let numeric = numeric_columns(table);
    if !numeric.is_empty() && numeric.len() <= 10 {
        sections.push("### Numeric column statistics".to_string());
        for (idx, stats) in &numeric {
            sections.push(format!(
                "{}: count={}, min={:.2}, max={:.2}, mean={:.2}",
                table.column_name(*idx),
                stats.count,
                stats.min,
                stats.max,
                stats.mean
            ));
        }
    }

    if profile.categorical_summaries {
        let numeric_idx: Vec<usize> = numeric.iter().map(|(idx, _)| *idx).collect();
        for (idx, frequencies) in categorical_columns(table, &numeric_idx, 3) {
            sections.push(format!(
                "### Value frequencies: {}",
                table.column_name(idx)
            ));
            for (value, count) in frequencies {
                sections.push(format!("{} ({})", value, count));
            }
        }
    }

    SampledTable {
        text: sections.join("\n"),
        rows_sampled,
        optimization_applied: true,
    }
}

fn render_all(table: &Table, column_cap: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    if let Some(headers) = &table.headers {
        lines.push(render_row(headers, column_cap));
    }
    for row in &table.rows {
        lines.push(render_row(row, column_cap));
    }
    lines.join("\n")
}

fn render_row(row: &[String], column_cap: usize) -> String {
    if row.len() <= column_cap {
        row.join(" | ")
    } else {
        let mut text = row[..column_cap].join(" | ");
        text.push_str(&format!(" | (+{} more columns)", row.len() - column_cap));
        text
    }
}

#[derive(Debug, Clone, Copy)]
struct ColumnStats {
    count: usize,
    min: f64,
    max: f64,
    mean: f64,
}

/// A column is numeric when at least 80% of its non-empty cells parse as
/// numbers.
fn numeric_columns(table: &Table) -> Vec<(usize, ColumnStats)> {
    let cols = table.column_count();
    let mut out = Vec::new();

    for idx in 0..cols {
        let mut values: Vec<f64> = Vec::new();
        let mut non_empty = 0usize;
        for row in &table.rows {
            let Some(cell) = row.get(idx) else { continue };
            let trimmed = cell.trim();
            if trimmed.is_empty() {
                continue;
            }
            non_empty += 1;
            if let Ok(value) = trimmed.parse::<f64>() {
                values.push(value);
            }
        }
        if non_empty == 0 || (values.len() as f64) < 0.8 * non_empty as f64 || values.is_empty() {
            continue;
        }

        let count = values.len();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / count as f64;
        out.push((idx, ColumnStats { count, min, max, mean }));
    }

    out
}

type Frequencies = Vec<(String, usize)>;

/// Low-cardinality (2..=20 distinct values) non-numeric columns, left to
/// right, at most `limit` of them. Frequencies are sorted by count
/// descending then value ascending for deterministic output.
fn categorical_columns(
    table: &Table,
    numeric_idx: &[usize],
    limit: usize,
) -> Vec<(usize, Frequencies)> {
    let cols = table.column_count();
    let mut out = Vec::new();

    for idx in 0..cols {
        if out.len() == limit {
            break;
        }
        if numeric_idx.contains(&idx) {
            continue;
        }
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for row in &table.rows {
            if let Some(cell) = row.get(idx) {
                let trimmed = cell.trim();
                if !trimmed.is_empty() {
                    *counts.entry(trimmed).or_insert(0) += 1;
                }
            }
        }
        if counts.len() < 2 || counts.len() > 20 {
            continue;
        }
        let mut frequencies: Frequencies = counts
            .into_iter()
            .map(|(value, count)| (value.to_string(), count))
            .collect();
        frequencies.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out.push((idx, frequencies));
    }

    out
}

/// Apply a final byte cap to assembled text. Returns the (possibly
/// truncated) text and whether truncation occurred; the marker is appended
/// exactly once.
pub fn enforce_byte_cap(text: String, cap: usize) -> (String, bool) {
    if text.len() <= cap {
        return (text, false);
    }

    let budget = cap.saturating_sub(TRUNCATION_MARKER.len());
    let mut cut = budget;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut truncated = text[..cut].to_string();
    truncated.push_str(TRUNCATION_MARKER);
    (truncated, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> Vec<Vec<String>> {
        let mut out = vec![vec![
            "id".to_string(),
            "name".to_string(),
            "amount".to_string(),
            "status".to_string(),
        ]];
        for i in 0..n {
            out.push(vec![
                i.to_string(),
                format!("item-{}", i),
                format!("{}.50", i % 90),
                if i % 2 == 0 { "open" } else { "closed" }.to_string(),
            ]);
        }
        out
    }

    #[test]
    fn small_table_is_verbatim() {
        let table = Table::from_rows(rows(40));
        let sampled = sample(&table, "orders", &SamplingProfile::csv());

        assert_eq!(sampled.rows_sampled, 40);
        assert!(!sampled.optimization_applied);
        assert!(sampled.text.contains("item-39"));
        assert!(!sampled.text.contains("### First"));
    }

    #[test]
    fn medium_table_keeps_all_rows_without_optimization() {
        let table = Table::from_rows(rows(300));
        let sampled = sample(&table, "orders", &SamplingProfile::csv());

        assert_eq!(sampled.rows_sampled, 300);
        assert!(!sampled.optimization_applied);
    }

    #[test]
    fn large_table_has_fixed_sample_size() {
        let table = Table::from_rows(rows(10_000));
        let sampled = sample(&table, "orders", &SamplingProfile::csv());

        assert!(sampled.optimization_applied);
        // head 30 + tail 15 + middle 15, independent of N.
        assert_eq!(sampled.rows_sampled, 60);
        assert!(sampled.text.contains("### First 30 rows"));
        assert!(sampled.text.contains("### Last 15 rows"));
        assert!(sampled.text.contains("### Middle sample"));
        assert!(sampled.text.contains("item-0 "));
        assert!(sampled.text.contains("item-9999"));

        // Same N above the large bound but below very-large: no middle window.
        let table = Table::from_rows(rows(600));
        let sampled = sample(&table, "orders", &SamplingProfile::csv());
        assert_eq!(sampled.rows_sampled, 45);
        assert!(!sampled.text.contains("### Middle sample"));
    }

    #[test]
    fn large_table_reports_numeric_statistics() {
        let table = Table::from_rows(rows(1000));
        let sampled = sample(&table, "orders", &SamplingProfile::csv());

        assert!(sampled.text.contains("### Numeric column statistics"));
        assert!(sampled.text.contains("id: count=1000"));
    }

    #[test]
    fn sheet_profile_reports_categorical_frequencies() {
        let table = Table::from_rows(rows(500));
        let sampled = sample(&table, "Sheet1", &SamplingProfile::sheet());

        assert!(sampled.optimization_applied);
        assert_eq!(sampled.rows_sampled, 20 + 10);
        assert!(sampled.text.contains("### Value frequencies: status"));
        assert!(sampled.text.contains("open (250)"));
    }

    #[test]
    fn sampling_is_deterministic() {
        let table = Table::from_rows(rows(10_000));
        let first = sample(&table, "orders", &SamplingProfile::csv());
        let second = sample(&table, "orders", &SamplingProfile::csv());
        assert_eq!(first.text, second.text);
        assert_eq!(first.rows_sampled, second.rows_sampled);
    }

    #[test]
    fn byte_cap_appends_marker_exactly_once() {
        let big = "x".repeat(CSV_BYTE_CAP + 1000);
        let (capped, truncated) = enforce_byte_cap(big, CSV_BYTE_CAP);

        assert!(truncated);
        assert!(capped.len() <= CSV_BYTE_CAP);
        assert_eq!(capped.matches("output truncated").count(), 1);
        assert!(capped.ends_with(TRUNCATION_MARKER));

        let small = "hello".to_string();
        let (untouched, truncated) = enforce_byte_cap(small.clone(), CSV_BYTE_CAP);
        assert!(!truncated);
        assert_eq!(untouched, small);
    }

    #[test]
    fn header_detection_splits_first_row() {
        let table = Table::from_rows(rows(5));
        assert_eq!(
            table.headers.as_deref(),
            Some(&["id", "name", "amount", "status"].map(String::from)[..])
        );
        assert_eq!(table.rows.len(), 5);

        // Numeric first row is data, not a header.
        let table = Table::from_rows(vec![
            vec!["1".to_string(), "2".to_string()],
            vec!["3".to_string(), "4".to_string()],
        ]);
        assert!(table.headers.is_none());
        assert_eq!(table.rows.len(), 2);
    }
}
