use serde_json::Value;
use std::collections::BTreeSet;

use crate::application::use_cases::extraction::DocumentExtraction;
use crate::application::use_cases::tabular_sampler::{
    enforce_byte_cap, sample, SamplingProfile, Table, JSON_BYTE_CAP,
};
use crate::domain::document::ExtractionMode;
use crate::domain::metrics::ProcessingMetrics;

impl DocumentExtraction {
    /// Arrays of flat objects become sampled tables; everything else is
    /// pretty-printed under the JSON byte cap.
    pub(in crate::application::use_cases::extraction) fn extract_json(
        &self,
        bytes: &[u8],
        metrics: &mut ProcessingMetrics,
    ) -> String {
        let value: Value = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(err) => {
                metrics.record_error(format!("JSON parse failed: {}", err));
                return String::new();
            }
        };

        if let Some(rows) = object_array_rows(&value) {
            let table = Table::from_rows(rows);
            let sampled = sample(&table, "JSON records", &SamplingProfile::csv());
            metrics.rows_sampled = sampled.rows_sampled;
            if sampled.optimization_applied {
                metrics.optimization_applied = true;
                metrics.extraction_mode = ExtractionMode::SmartSampling;
            }
            let (text, truncated) = enforce_byte_cap(sampled.text, JSON_BYTE_CAP);
            if truncated {
                metrics.record_warning("JSON output truncated at byte cap".to_string());
            }
            return text;
        }

        let pretty = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
        let (text, truncated) = enforce_byte_cap(pretty, JSON_BYTE_CAP);
        if truncated {
            metrics.record_warning("JSON output truncated at byte cap".to_string());
        }
        text
    }
}

/// A non-empty array whose elements are all objects flattens to a header
/// row (union of keys, sorted) plus one row per element.
fn object_array_rows(value: &Value) -> Option<Vec<Vec<String>>> {
    let items = value.as_array()?;
    if items.is_empty() || !items.iter().all(Value::is_object) {
        return None;
    }

    let mut keys: BTreeSet<&str> = BTreeSet::new();
    for item in items {
        if let Some(object) = item.as_object() {
            keys.extend(object.keys().map(String::as_str));
        }
    }
    let keys: Vec<&str> = keys.into_iter().collect();

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(items.len() + 1);
    rows.push(keys.iter().map(|key| key.to_string()).collect());
    for item in items {
        let object = item.as_object()?;
        rows.push(
            keys.iter()
                .map(|key| match object.get(*key) {
                    None | Some(Value::Null) => String::new(),
                    Some(Value::String(text)) => text.clone(),
                    Some(other) => other.to_string(),
                })
                .collect(),
        );
    }
    Some(rows)
}
