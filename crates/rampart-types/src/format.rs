//! Output shapes produced by the normalizer and the platform adapter.

use serde::{Deserialize, Serialize};

use crate::Platform;

/// Structural classification the normalizer assigns to command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectedStructure {
    /// Columnar data with a recognizable header row.
    Table,
    /// One item per line with no columnar alignment.
    List,
    /// `key: value` pairs on most lines.
    KeyValue,
    /// Free-form text.
    Text,
}

impl std::fmt::Display for DetectedStructure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectedStructure::Table => write!(f, "table"),
            DetectedStructure::List => write!(f, "list"),
            DetectedStructure::KeyValue => write!(f, "keyValue"),
            DetectedStructure::Text => write!(f, "text"),
        }
    }
}

/// Normalized command output: bounded, cleaned, structurally classified.
///
/// A pure derivation of `ExecutionResult.stdout`; it carries no identity
/// of its own and can be recomputed at will.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattedOutput {
    /// The cleaned (and possibly truncated or summarized) text.
    pub content: String,
    /// Whether any size/line limit shortened the content.
    pub truncated: bool,
    /// Byte length of the input before any processing.
    pub original_size_bytes: usize,
    /// What shape the detector chain settled on.
    pub detected_structure: DetectedStructure,
    /// Advisory notes (truncation, control characters stripped, ...).
    pub warnings: Vec<String>,
}

/// The result of rewriting text for a different operating system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptationResult {
    /// The rewritten text.
    pub adapted_content: String,
    /// Names of the sub-transformations that actually changed something,
    /// in application order.
    pub adaptations_applied: Vec<String>,
    /// Platform the text was written for.
    pub source_platform: Platform,
    /// Platform the text was rewritten for.
    pub target_platform: Platform,
    /// Advisory notes (lossy mappings, unrecognized drive letters, ...).
    pub warnings: Vec<String>,
}

impl AdaptationResult {
    /// The identity adaptation: content unchanged, nothing applied.
    pub fn unchanged(content: impl Into<String>, platform: Platform) -> Self {
        Self {
            adapted_content: content.into(),
            adaptations_applied: Vec::new(),
            source_platform: platform,
            target_platform: platform,
            warnings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structure_display_names() {
        assert_eq!(DetectedStructure::Table.to_string(), "table");
        assert_eq!(DetectedStructure::KeyValue.to_string(), "keyValue");
    }

    #[test]
    fn unchanged_adaptation_is_identity() {
        let r = AdaptationResult::unchanged("ls -la", Platform::Linux);
        assert_eq!(r.adapted_content, "ls -la");
        assert!(r.adaptations_applied.is_empty());
        assert_eq!(r.source_platform, r.target_platform);
    }
}
