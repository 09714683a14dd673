//! Rule-based gate deciding whether digitally extracted text is trustworthy
//! enough to skip OCR.
//!
//! The thresholds here are empirically tuned constants and part of the
//! contract; do not re-derive them.

use std::collections::HashMap;

pub const DEFAULT_MIN_CHARS: usize = 100;

/// Lines containing any of these substrings are document-metadata artifacts
/// and never count toward meaningful content. Matched case-insensitively.
const NOISE_MARKERS: &[&str] = &[
    "producer:",
    "creator:",
    "creationdate",
    "moddate",
    "title:",
    "subject:",
    "keywords:",
    "adobe acrobat",
    "microsoft word",
    "pscript",
    "ghostscript",
    "all rights reserved",
    "copyright ©",
    "(c) copyright",
];

/// Discard lines shorter than this many characters after trimming.
const MIN_LINE_CHARS: usize = 3;

/// Repetition keys are only tracked when the normalized form (first
/// `REPETITION_TOKENS` tokens) exceeds this many characters.
const REPETITION_KEY_MIN_CHARS: usize = 20;
const REPETITION_TOKENS: usize = 10;

/// The full 8-check vector plus the aggregate verdict. Identical input
/// always yields an identical report.
#[derive(Debug, Clone, PartialEq)]
pub struct SufficiencyReport {
    pub sufficient: bool,
    pub checks: [bool; 8],
    pub passed: usize,
    pub char_count: usize,
    pub word_count: usize,
    pub avg_word_length: f64,
    pub lines_ratio: f64,
    pub suspicious_count: usize,
    pub repetition_ratio: f64,
    pub max_repetitions: usize,
    pub unique_content_ratio: f64,
}

pub fn is_sufficient(text: &str, min_chars: usize) -> bool {
    classify(text, min_chars).sufficient
}

pub fn classify(text: &str, min_chars: usize) -> SufficiencyReport {
    if text.trim().is_empty() {
        return SufficiencyReport {
            sufficient: false,
            checks: [false; 8],
            passed: 0,
            char_count: 0,
            word_count: 0,
            avg_word_length: 0.0,
            lines_ratio: 0.0,
            suspicious_count: 0,
            repetition_ratio: 0.0,
            max_repetitions: 0,
            unique_content_ratio: 0.0,
        };
    }

    let lines: Vec<&str> = text.lines().collect();
    let total_lines = lines.len();

    let mut meaningful: Vec<&str> = Vec::new();
    let mut suspicious_count = 0usize;

    for line in &lines {
        let trimmed = line.trim();
        if trimmed.chars().count() < MIN_LINE_CHARS {
            continue;
        }
        let lower = trimmed.to_lowercase();
        if NOISE_MARKERS.iter().any(|marker| lower.contains(marker)) {
            continue;
        }
        if is_suspicious(trimmed) {
            suspicious_count += 1;
            continue;
        }
        meaningful.push(trimmed);
    }

    let meaningful_count = meaningful.len();

    let mut repetition_counts: HashMap<String, usize> = HashMap::new();
    for line in &meaningful {
        let key = line
            .split_whitespace()
            .take(REPETITION_TOKENS)
            .collect::<Vec<_>>()
            .join(" ");
        if key.chars().count() > REPETITION_KEY_MIN_CHARS {
            *repetition_counts.entry(key).or_insert(0) += 1;
        }
    }

    let char_count: usize = meaningful.iter().map(|l| l.chars().count()).sum();
    let words: Vec<&str> = meaningful
        .iter()
        .flat_map(|l| l.split_whitespace())
        .collect();
    let word_count = words.len();
    let avg_word_length = if word_count > 0 {
        words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / word_count as f64
    } else {
        0.0
    };

    let lines_ratio = if total_lines > 0 {
        meaningful_count as f64 / total_lines as f64
    } else {
        0.0
    };

    let repeated_excess: usize = repetition_counts
        .values()
        .filter(|&&count| count > 1)
        .map(|&count| count - 1)
        .sum();
    let repetition_ratio = repeated_excess as f64 / meaningful_count.max(1) as f64;
    let max_repetitions = repetition_counts.values().copied().max().unwrap_or(0);

    let unique_content_ratio = if meaningful_count > 0 {
        let distinct: std::collections::HashSet<&&str> = meaningful.iter().collect();
        distinct.len() as f64 / meaningful_count as f64
    } else {
        0.0
    };

    let checks = [
        char_count >= min_chars,
        word_count >= 25,
        avg_word_length >= 3.0,
        lines_ratio >= 0.4,
        suspicious_count as f64 <= 0.15 * total_lines as f64,
        repetition_ratio < 0.3,
        unique_content_ratio >= 0.8,
        max_repetitions <= 2,
    ];
    let passed = checks.iter().filter(|&&c| c).count();

    SufficiencyReport {
        sufficient: passed >= 6,
        checks,
        passed,
        char_count,
        word_count,
        avg_word_length,
        lines_ratio,
        suspicious_count,
        repetition_ratio,
        max_repetitions,
        unique_content_ratio,
    }
}

/// A line is suspicious when it looks like OCR debris or a layout artifact
/// rather than prose.
fn is_suspicious(line: &str) -> bool {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return true;
    }

    let single_alpha = tokens
        .iter()
        .filter(|t| t.chars().count() == 1 && t.chars().all(|c| c.is_alphabetic()))
        .count();
    if single_alpha as f64 > 0.30 * tokens.len() as f64 {
        return true;
    }

    let char_count = line.chars().count();
    let unusual = line.chars().filter(|&c| !is_common_char(c)).count();
    if unusual as f64 > 0.20 * char_count as f64 {
        return true;
    }

    let digits = line.chars().filter(|c| c.is_ascii_digit()).count();
    if digits as f64 > 0.50 * char_count as f64 && tokens.len() < 3 {
        return true;
    }

    false
}

fn is_common_char(c: char) -> bool {
    c.is_alphanumeric()
        || c.is_whitespace()
        || matches!(
            c,
            '.' | ','
                | ';'
                | ':'
                | '!'
                | '?'
                | '\''
                | '"'
                | '-'
                | '('
                | ')'
                | '['
                | ']'
                | '/'
                | '%'
                | '$'
                | '&'
                | '@'
                | '#'
                | '*'
                | '+'
                | '='
                | '_'
                | '\u{2019}'
                | '\u{201c}'
                | '\u{201d}'
                | '\u{2013}'
                | '\u{2014}'
        )
}
