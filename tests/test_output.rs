//! Output normalization and cross-platform adaptation through the facade.

mod common;

use common::pipeline;
use rampart::{DetectedStructure, OutputNormalizer, Platform};

#[test]
fn shell_table_output_is_detected_and_serialized() {
    let raw = "Name  Size\n----  ----\nfoo   10\nbar   20";
    let p = pipeline(false);

    let records = p.to_records(raw).expect("dash-ruled table should parse");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["Name"], "foo");
    assert_eq!(records[0]["Size"], "10");
    assert_eq!(records[1]["Name"], "bar");
    assert_eq!(records[1]["Size"], "20");
}

#[test]
fn normalizer_classifies_common_shapes() {
    let n = OutputNormalizer::default();
    assert_eq!(
        n.normalize("Name  Size\n----  ----\nfoo   10").detected_structure,
        DetectedStructure::Table
    );
    assert_eq!(
        n.normalize("Status: running\nUptime: 4d\nLoad: 0.2").detected_structure,
        DetectedStructure::KeyValue
    );
    assert_eq!(
        n.normalize("alpha\nbeta\ngamma").detected_structure,
        DetectedStructure::List
    );
}

#[test]
fn normalization_is_idempotent_on_clean_output() {
    let n = OutputNormalizer::default();
    let first = n.normalize("Status: running\nUptime: 4 days");
    let second = n.normalize(&first.content);
    assert_eq!(second.content, first.content);
    assert!(!second.truncated);
    assert!(second.warnings.is_empty());
}

#[test]
fn adaptation_round_trip_preserves_separators() {
    let p = pipeline(false);
    let original = "cat /home/dev/project/readme.md";

    let to_windows = p.adapt(original, Platform::Linux, Platform::Windows);
    assert!(to_windows.adapted_content.contains("C:\\Users\\dev"));

    let back = p.adapt(&to_windows.adapted_content, Platform::Windows, Platform::Linux);
    assert_eq!(back.adapted_content, original);
}

#[test]
fn adaptation_records_what_it_did() {
    let p = pipeline(false);
    let r = p.adapt(
        "type C:\\Users\\dev\\out.log\r\necho %USERNAME%",
        Platform::Windows,
        Platform::Linux,
    );
    assert_eq!(
        r.adapted_content,
        "type /home/dev/out.log\necho $USER"
    );
    for stage in ["path_translation", "env_variable_syntax", "line_endings"] {
        assert!(
            r.adaptations_applied.contains(&stage.to_string()),
            "missing {stage} in {:?}",
            r.adaptations_applied
        );
    }
}

#[test]
fn error_phrasings_from_both_platforms_converge() {
    let p = pipeline(false);

    let from_windows = p.adapt(
        "The term 'kubctl' is not recognized as the name of a cmdlet, function, or operable program.",
        Platform::Windows,
        Platform::Linux,
    );
    let from_posix = p.adapt(
        "bash: kubctl: command not found",
        Platform::Linux,
        Platform::Windows,
    );

    assert!(from_windows.adapted_content.contains("command not found: kubctl"));
    assert!(from_posix.adapted_content.contains("command not found: kubctl"));
}
