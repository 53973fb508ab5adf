//! Heuristic normalization of raw command output.
//!
//! A three-stage pipeline, each stage optional via [`FormatConfig`]:
//! 1. Unicode canonical composition and control-character stripping
//!    (newline, tab, and carriage return survive);
//! 2. line/byte ceilings with a truncate, summarize, or pass-through
//!    policy;
//! 3. structure detection through an ordered chain of detectors, first
//!    success wins.
//!
//! Every detector is best-effort and fallible by design: a failed parse
//! means "try the next detector", never an error. Tabular detectors
//! check that header and data rows have matching or near-matching column
//! counts before accepting, to avoid false positives on incidental
//! whitespace.

use unicode_normalization::UnicodeNormalization;

use rampart_types::{DetectedStructure, FormatConfig, FormattedOutput, OverflowPolicy};

/// A table recovered from textual output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    /// Column names from the header row.
    pub headers: Vec<String>,
    /// Data rows, one cell vector per row.
    pub rows: Vec<Vec<String>>,
}

impl TableInfo {
    /// Serialize to a JSON record array, one object per row keyed by
    /// header. Rows shorter than the header get `null`s; longer rows
    /// drop the excess.
    pub fn to_records(&self) -> Vec<serde_json::Value> {
        self.rows
            .iter()
            .map(|row| {
                let fields = self
                    .headers
                    .iter()
                    .enumerate()
                    .map(|(i, h)| {
                        let cell = row
                            .get(i)
                            .map(|c| serde_json::Value::String(c.clone()))
                            .unwrap_or(serde_json::Value::Null);
                        (h.clone(), cell)
                    })
                    .collect();
                serde_json::Value::Object(fields)
            })
            .collect()
    }
}

/// Applies the normalization pipeline to raw output.
pub struct OutputNormalizer {
    config: FormatConfig,
}

impl OutputNormalizer {
    pub fn new(config: FormatConfig) -> Self {
        Self { config }
    }

    /// Normalize one piece of raw output.
    ///
    /// Already-clean input inside the configured limits comes back
    /// byte-identical with `truncated = false`.
    pub fn normalize(&self, raw: &str) -> FormattedOutput {
        let original_size_bytes = raw.len();
        let mut warnings = Vec::new();

        let cleaned = self.clean(raw, &mut warnings);
        let (bounded, truncated) = self.enforce_limits(cleaned, &mut warnings);
        let detected_structure = detect_structure(&bounded);

        tracing::debug!(
            original_size_bytes,
            truncated,
            structure = %detected_structure,
            "output normalized"
        );

        FormattedOutput {
            content: bounded,
            truncated,
            original_size_bytes,
            detected_structure,
            warnings,
        }
    }

    /// Re-run table detection on (normalized) content and serialize the
    /// result to a JSON record array, if the content is tabular.
    pub fn to_records(&self, content: &str) -> Option<Vec<serde_json::Value>> {
        detect_table(content).map(|t| t.to_records())
    }

    fn clean(&self, raw: &str, warnings: &mut Vec<String>) -> String {
        let mut text = if self.config.normalize_unicode {
            raw.nfc().collect::<String>()
        } else {
            raw.to_string()
        };

        if self.config.strip_control_chars {
            let before = text.chars().count();
            text = text
                .chars()
                .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'))
                .collect();
            let stripped = before - text.chars().count();
            if stripped > 0 {
                warnings.push(format!("{stripped} control characters stripped"));
            }
        }

        text
    }

    fn enforce_limits(&self, text: String, warnings: &mut Vec<String>) -> (String, bool) {
        let line_count = text.lines().count();
        let within = line_count <= self.config.max_lines && text.len() <= self.config.max_bytes;
        if within {
            return (text, false);
        }

        match self.config.overflow {
            OverflowPolicy::PassThrough => (text, false),
            OverflowPolicy::Truncate => {
                let (head, kept) = take_lines_within(
                    &text,
                    self.config.max_lines,
                    self.config.max_bytes,
                );
                let omitted = line_count.saturating_sub(kept);
                warnings.push(format!("output truncated, {omitted} lines omitted"));
                let content = format!("{head}\n... [{omitted} more lines omitted]");
                (content, true)
            }
            OverflowPolicy::Summarize { head, tail } => {
                let lines: Vec<&str> = text.lines().collect();
                if lines.len() <= head + tail {
                    // Over the byte ceiling but not worth summarizing by
                    // lines; fall back to a head cut.
                    let (kept_text, kept) =
                        take_lines_within(&text, self.config.max_lines, self.config.max_bytes);
                    let omitted = line_count.saturating_sub(kept);
                    warnings.push(format!("output truncated, {omitted} lines omitted"));
                    return (
                        format!("{kept_text}\n... [{omitted} more lines omitted]"),
                        true,
                    );
                }
                let omitted = lines.len() - head - tail;
                warnings.push(format!("output summarized, {omitted} middle lines omitted"));
                let mut parts = Vec::with_capacity(head + tail + 1);
                parts.extend_from_slice(&lines[..head]);
                let marker = format!("... [{omitted} lines omitted] ...");
                parts.push(&marker);
                parts.extend_from_slice(&lines[lines.len() - tail..]);
                (parts.join("\n"), true)
            }
        }
    }
}

impl Default for OutputNormalizer {
    fn default() -> Self {
        Self::new(FormatConfig::default())
    }
}

/// Keep leading lines while both the line and byte budget hold.
/// Returns the kept text and how many lines it has.
fn take_lines_within(text: &str, max_lines: usize, max_bytes: usize) -> (String, usize) {
    let mut kept = Vec::new();
    let mut bytes = 0usize;
    for line in text.lines().take(max_lines) {
        // +1 for the joining newline
        if bytes + line.len() + 1 > max_bytes {
            break;
        }
        bytes += line.len() + 1;
        kept.push(line);
    }
    let count = kept.len();
    (kept.join("\n"), count)
}

// ---------------------------------------------------------------------------
// Structure detection
// ---------------------------------------------------------------------------

/// Run the detector chain; first success wins.
fn detect_structure(text: &str) -> DetectedStructure {
    if detect_table(text).is_some() {
        return DetectedStructure::Table;
    }
    if is_key_value(text) {
        return DetectedStructure::KeyValue;
    }
    if is_list(text) {
        return DetectedStructure::List;
    }
    DetectedStructure::Text
}

/// Try every tabular layout in order: dash-ruled header, CSV, TSV,
/// pipe-delimited, multi-space-aligned columns.
pub fn detect_table(text: &str) -> Option<TableInfo> {
    detect_dash_ruled(text)
        .or_else(|| detect_delimited(text, ','))
        .or_else(|| detect_delimited(text, '\t'))
        .or_else(|| detect_pipe_delimited(text))
        .or_else(|| detect_aligned_columns(text))
}

/// Column counts match when equal or off by one (ragged last column).
fn counts_compatible(header: usize, row: usize) -> bool {
    header > 0 && row > 0 && header.abs_diff(row) <= 1
}

/// Fixed-header-plus-dashes layout, the classic shell table:
///
/// ```text
/// Name  Size
/// ----  ----
/// foo   10
/// ```
fn detect_dash_ruled(text: &str) -> Option<TableInfo> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header_line = lines.next()?;
    let rule_line = lines.next()?;

    let rule_groups: Vec<&str> = rule_line.split_whitespace().collect();
    let is_rule = !rule_groups.is_empty()
        && rule_groups
            .iter()
            .all(|g| g.chars().all(|c| c == '-' || c == '='));
    if !is_rule {
        return None;
    }

    let headers: Vec<String> = header_line.split_whitespace().map(str::to_string).collect();
    if !counts_compatible(headers.len(), rule_groups.len()) {
        return None;
    }

    let mut rows = Vec::new();
    for line in lines {
        let cells: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if !counts_compatible(headers.len(), cells.len()) {
            return None;
        }
        rows.push(cells);
    }
    if rows.is_empty() {
        return None;
    }
    Some(TableInfo { headers, rows })
}

/// Single-character-delimited rows (CSV when `,`, TSV when `\t`).
fn detect_delimited(text: &str, delimiter: char) -> Option<TableInfo> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return None;
    }

    let headers: Vec<String> = lines[0]
        .split(delimiter)
        .map(|c| c.trim().to_string())
        .collect();
    if headers.len() < 2 {
        return None;
    }

    let mut rows = Vec::new();
    for line in &lines[1..] {
        let cells: Vec<String> = line.split(delimiter).map(|c| c.trim().to_string()).collect();
        if !counts_compatible(headers.len(), cells.len()) {
            return None;
        }
        rows.push(cells);
    }
    Some(TableInfo { headers, rows })
}

/// Pipe-delimited rows, tolerating a markdown-style `|---|---|` rule.
fn detect_pipe_delimited(text: &str) -> Option<TableInfo> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 || !lines.iter().all(|l| l.contains('|')) {
        return None;
    }

    let split = |line: &str| -> Vec<String> {
        line.trim()
            .trim_matches('|')
            .split('|')
            .map(|c| c.trim().to_string())
            .collect()
    };

    let headers = split(lines[0]);
    if headers.len() < 2 {
        return None;
    }

    let mut rows = Vec::new();
    for line in &lines[1..] {
        let cells = split(line);
        // Skip a separator rule like |----|----|
        if cells
            .iter()
            .all(|c| !c.is_empty() && c.chars().all(|ch| ch == '-' || ch == ':'))
        {
            continue;
        }
        if !counts_compatible(headers.len(), cells.len()) {
            return None;
        }
        rows.push(cells);
    }
    if rows.is_empty() {
        return None;
    }
    Some(TableInfo { headers, rows })
}

/// Columns aligned with runs of two or more spaces, no dash rule.
fn detect_aligned_columns(text: &str) -> Option<TableInfo> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 3 {
        return None;
    }

    let split = |line: &str| -> Vec<String> {
        line.trim()
            .split("  ")
            .filter(|c| !c.trim().is_empty())
            .map(|c| c.trim().to_string())
            .collect()
    };

    let headers = split(lines[0]);
    if headers.len() < 2 {
        return None;
    }

    let mut rows = Vec::new();
    for line in &lines[1..] {
        let cells = split(line);
        if cells.len() != headers.len() {
            return None;
        }
        rows.push(cells);
    }
    Some(TableInfo { headers, rows })
}

/// `key: value` on at least 80% of non-empty lines.
fn is_key_value(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return false;
    }
    let matching = lines
        .iter()
        .filter(|l| {
            l.split_once(':')
                .is_some_and(|(key, value)| !key.trim().is_empty() && !value.trim().is_empty())
        })
        .count();
    matching * 100 >= lines.len() * 80
}

/// Multiple short one-item-per-line entries.
fn is_list(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    lines.len() >= 2
        && lines
            .iter()
            .all(|l| l.split_whitespace().count() <= 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> OutputNormalizer {
        OutputNormalizer::default()
    }

    // ---- Cleaning ----

    #[test]
    fn control_characters_stripped_but_whitespace_kept() {
        let out = normalizer().normalize("a\x07b\tc\r\nd\x1b[0m");
        assert_eq!(out.content, "ab\tc\r\nd[0m");
        assert!(out.warnings.iter().any(|w| w.contains("control")));
    }

    #[test]
    fn unicode_is_canonically_composed() {
        // "e" + combining acute composes to a single char under NFC.
        let decomposed = "e\u{0301}tat";
        let out = normalizer().normalize(decomposed);
        assert_eq!(out.content, "état");
    }

    #[test]
    fn already_normalized_output_is_unchanged() {
        let input = "Name: value\nOther: thing";
        let out = normalizer().normalize(input);
        assert_eq!(out.content, input);
        assert!(!out.truncated);
        assert!(out.warnings.is_empty());
        assert_eq!(out.original_size_bytes, input.len());
    }

    // ---- Limits ----

    fn small_config(overflow: OverflowPolicy) -> FormatConfig {
        FormatConfig {
            max_lines: 5,
            max_bytes: 10_000,
            overflow,
            ..FormatConfig::default()
        }
    }

    #[test]
    fn truncate_keeps_head_and_appends_marker() {
        let n = OutputNormalizer::new(small_config(OverflowPolicy::Truncate));
        let input = (1..=20).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let out = n.normalize(&input);
        assert!(out.truncated);
        assert!(out.content.starts_with("line 1\nline 2"));
        assert!(out.content.contains("more lines omitted"));
        assert!(!out.content.contains("line 20"));
    }

    #[test]
    fn summarize_keeps_head_and_tail() {
        let n = OutputNormalizer::new(small_config(OverflowPolicy::Summarize {
            head: 2,
            tail: 2,
        }));
        let input = (1..=20).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let out = n.normalize(&input);
        assert!(out.truncated);
        assert!(out.content.starts_with("line 1\nline 2"));
        assert!(out.content.ends_with("line 19\nline 20"));
        assert!(out.content.contains("[16 lines omitted]"));
    }

    #[test]
    fn pass_through_leaves_overflow_alone() {
        let n = OutputNormalizer::new(small_config(OverflowPolicy::PassThrough));
        let input = (1..=20).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let out = n.normalize(&input);
        assert!(!out.truncated);
        assert!(out.content.contains("line 20"));
    }

    #[test]
    fn byte_ceiling_truncates_independently_of_lines() {
        let config = FormatConfig {
            max_lines: 1000,
            max_bytes: 64,
            overflow: OverflowPolicy::Truncate,
            ..FormatConfig::default()
        };
        let input = (1..=30).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let out = OutputNormalizer::new(config).normalize(&input);
        assert!(out.truncated);
    }

    // ---- Structure detection ----

    #[test]
    fn dash_ruled_table_detected() {
        let input = "Name  Size\n----  ----\nfoo   10\nbar   20";
        let out = normalizer().normalize(input);
        assert_eq!(out.detected_structure, DetectedStructure::Table);

        let table = detect_table(input).unwrap();
        assert_eq!(table.headers, vec!["Name", "Size"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["foo", "10"]);
        assert_eq!(table.rows[1], vec!["bar", "20"]);
    }

    #[test]
    fn csv_detected() {
        let table = detect_table("name,size,kind\nfoo,10,file\nbar,20,dir").unwrap();
        assert_eq!(table.headers.len(), 3);
        assert_eq!(table.rows[1], vec!["bar", "20", "dir"]);
    }

    #[test]
    fn tsv_detected() {
        let table = detect_table("name\tsize\nfoo\t10\nbar\t20").unwrap();
        assert_eq!(table.headers, vec!["name", "size"]);
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn pipe_table_detected_with_markdown_rule() {
        let table = detect_table("| Name | Size |\n|------|------|\n| foo  | 10   |").unwrap();
        assert_eq!(table.headers, vec!["Name", "Size"]);
        assert_eq!(table.rows, vec![vec!["foo", "10"]]);
    }

    #[test]
    fn aligned_columns_detected() {
        let input = "NAME     STATUS   AGE\nweb-1    Running  2d\nweb-2    Pending  1h";
        let table = detect_table(input).unwrap();
        assert_eq!(table.headers, vec!["NAME", "STATUS", "AGE"]);
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn mismatched_column_counts_reject_table() {
        // Second data row has 4 cells against a 2-column header; the
        // dash-rule detector must not accept accidental whitespace.
        let input = "Name  Size\n----  ----\nfoo   10\na b c d e";
        assert!(detect_table(input).is_none());
    }

    #[test]
    fn off_by_one_column_count_is_tolerated() {
        let input = "Name  Size\n----  ----\nfoo   10\nbar";
        let table = detect_table(input).unwrap();
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn key_value_detected_at_eighty_percent() {
        let input = "Host: server-1\nUptime: 4 days\nLoad: 0.42\nKernel: 6.1.0\nsome stray line";
        let out = normalizer().normalize(input);
        assert_eq!(out.detected_structure, DetectedStructure::KeyValue);
    }

    #[test]
    fn below_eighty_percent_is_not_key_value() {
        let input = "Host: server-1\nstray one\nstray two\nstray three";
        let out = normalizer().normalize(input);
        assert_ne!(out.detected_structure, DetectedStructure::KeyValue);
    }

    #[test]
    fn short_lines_detected_as_list() {
        let out = normalizer().normalize("alpha\nbeta\ngamma");
        assert_eq!(out.detected_structure, DetectedStructure::List);
    }

    #[test]
    fn prose_detected_as_text() {
        let out = normalizer()
            .normalize("The quick brown fox jumps over the lazy dog and keeps on running.");
        assert_eq!(out.detected_structure, DetectedStructure::Text);
    }

    #[test]
    fn empty_output_is_text() {
        let out = normalizer().normalize("");
        assert_eq!(out.detected_structure, DetectedStructure::Text);
        assert!(!out.truncated);
    }

    // ---- Record serialization ----

    #[test]
    fn table_serializes_to_records() {
        let records = normalizer()
            .to_records("Name  Size\n----  ----\nfoo   10\nbar   20")
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["Name"], "foo");
        assert_eq!(records[0]["Size"], "10");
        assert_eq!(records[1]["Name"], "bar");
    }

    #[test]
    fn ragged_row_serializes_with_null() {
        let records = normalizer()
            .to_records("Name  Size\n----  ----\nfoo   10\nbar")
            .unwrap();
        assert_eq!(records[1]["Name"], "bar");
        assert_eq!(records[1]["Size"], serde_json::Value::Null);
    }

    #[test]
    fn non_table_yields_no_records() {
        assert!(normalizer().to_records("just some prose").is_none());
    }
}
