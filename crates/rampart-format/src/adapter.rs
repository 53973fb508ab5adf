//! Cross-platform adaptation of command text and output.
//!
//! Rewrites paths, environment-variable syntax, line endings, and known
//! error-message phrasings when text authored on one operating system is
//! rendered for another. Sub-transformations are independent: each one
//! records itself in `adaptations_applied` when it changes something, and
//! no single transformation can abort the rest.

use std::sync::OnceLock;

use regex::Regex;

use rampart_types::{AdaptationResult, Platform};

/// Fixed mapping between well-known directories. Longest prefixes first
/// so `C:\Windows\Temp` wins over `C:\Windows`.
const WELL_KNOWN_DIRS: &[(&str, &str)] = &[
    (r"C:\Windows\Temp", "/tmp"),
    (r"C:\Temp", "/tmp"),
    (r"C:\Program Files (x86)", "/usr/local"),
    (r"C:\Program Files", "/usr/local"),
    (r"C:\Users", "/home"),
];

/// Environment-variable name equivalents across platforms.
const ENV_NAME_MAP: &[(&str, &str)] = &[
    ("USERPROFILE", "HOME"),
    ("USERNAME", "USER"),
    ("TEMP", "TMPDIR"),
    ("TMP", "TMPDIR"),
    ("COMPUTERNAME", "HOSTNAME"),
    ("COMSPEC", "SHELL"),
];

/// Rewrites text between platforms.
pub struct PlatformAdapter;

impl PlatformAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Adapt `text` authored for `source` so it reads naturally on
    /// `target`. A no-op when the platforms are equal.
    pub fn adapt(&self, text: &str, source: Platform, target: Platform) -> AdaptationResult {
        if source == target {
            let mut result = AdaptationResult::unchanged(text, source);
            result.target_platform = target;
            return result;
        }

        let mut content = text.to_string();
        let mut applied = Vec::new();
        let mut warnings = Vec::new();

        // Each stage is independent; a stage that finds nothing to do
        // leaves the text alone and stays out of the applied list.
        let stages: &[(&str, fn(&str, Platform, Platform, &mut Vec<String>) -> Option<String>)] = &[
            ("path_translation", translate_paths),
            ("env_variable_syntax", translate_env_syntax),
            ("line_endings", translate_line_endings),
            ("error_canonicalization", canonicalize_errors),
        ];

        for (name, stage) in stages {
            if let Some(changed) = stage(&content, source, target, &mut warnings) {
                content = changed;
                applied.push((*name).to_string());
            }
        }

        tracing::debug!(
            source = %source,
            target = %target,
            applied = ?applied,
            "platform adaptation complete"
        );

        AdaptationResult {
            adapted_content: content,
            adaptations_applied: applied,
            source_platform: source,
            target_platform: target,
            warnings,
        }
    }
}

impl Default for PlatformAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn windows_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z]:\\[^\s'\x22|<>]*").unwrap())
}

fn posix_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|[\s'\x22=])(/(?:[\w.+-]+/?)+)").unwrap())
}

/// Translate path separators, drive letters, and well-known directories.
fn translate_paths(
    text: &str,
    source: Platform,
    target: Platform,
    warnings: &mut Vec<String>,
) -> Option<String> {
    if source.is_posix() == target.is_posix() {
        return None;
    }

    let result = if source == Platform::Windows {
        windows_path_re().replace_all(text, |caps: &regex::Captures<'_>| {
            windows_to_posix(&caps[0], warnings)
        })
    } else {
        posix_path_re().replace_all(text, |caps: &regex::Captures<'_>| {
            let full = &caps[0];
            let path = &caps[1];
            // Keep whatever delimiter preceded the path.
            let prefix = &full[..full.len() - path.len()];
            format!("{prefix}{}", posix_to_windows(path))
        })
    };

    match result {
        std::borrow::Cow::Borrowed(_) => None,
        std::borrow::Cow::Owned(changed) => Some(changed),
    }
}

fn windows_to_posix(path: &str, warnings: &mut Vec<String>) -> String {
    for (win, posix) in WELL_KNOWN_DIRS {
        if let Some(rest) = strip_prefix_ignore_case(path, win) {
            return format!("{posix}{}", rest.replace('\\', "/"));
        }
    }
    // Generic drive mapping: C:\x -> /x, other letters keep a root dir.
    let (drive, rest) = path.split_at(2);
    let drive_letter = drive.chars().next().unwrap_or('c').to_ascii_lowercase();
    let rest = rest.replace('\\', "/");
    if drive_letter == 'c' {
        rest
    } else {
        warnings.push(format!(
            "no canonical mapping for drive {}:, using /{drive_letter}",
            drive_letter.to_ascii_uppercase()
        ));
        format!("/{drive_letter}{rest}")
    }
}

fn posix_to_windows(path: &str) -> String {
    for (win, posix) in WELL_KNOWN_DIRS {
        // /tmp maps back to the primary temp directory.
        if *posix == "/usr/local" && *win != r"C:\Program Files" {
            continue;
        }
        if *posix == "/tmp" && *win != r"C:\Windows\Temp" {
            continue;
        }
        if let Some(rest) = path.strip_prefix(posix) {
            if rest.is_empty() || rest.starts_with('/') {
                return format!("{win}{}", rest.replace('/', "\\"));
            }
        }
    }
    format!("C:{}", path.replace('/', "\\"))
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

fn posix_var_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{?([A-Za-z_][A-Za-z0-9_]*)\}?").unwrap())
}

fn windows_var_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"%([A-Za-z_][A-Za-z0-9_]*)%").unwrap())
}

/// Translate `$VAR` <-> `%VAR%` plus common variable-name equivalents.
fn translate_env_syntax(
    text: &str,
    source: Platform,
    target: Platform,
    _warnings: &mut Vec<String>,
) -> Option<String> {
    if source.is_posix() == target.is_posix() {
        return None;
    }

    let result = if source == Platform::Windows {
        windows_var_re().replace_all(text, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            let mapped = ENV_NAME_MAP
                .iter()
                .find(|(win, _)| win.eq_ignore_ascii_case(name))
                .map(|(_, posix)| *posix)
                .unwrap_or(name);
            format!("${mapped}")
        })
    } else {
        posix_var_re().replace_all(text, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            let mapped = ENV_NAME_MAP
                .iter()
                .find(|(_, posix)| posix.eq_ignore_ascii_case(name))
                .map(|(win, _)| *win)
                .unwrap_or(name);
            format!("%{mapped}%")
        })
    };

    match result {
        std::borrow::Cow::Borrowed(_) => None,
        std::borrow::Cow::Owned(changed) => Some(changed),
    }
}

/// LF <-> CRLF.
fn translate_line_endings(
    text: &str,
    source: Platform,
    target: Platform,
    _warnings: &mut Vec<String>,
) -> Option<String> {
    match (source, target) {
        (Platform::Windows, t) if t.is_posix() => {
            text.contains("\r\n").then(|| text.replace("\r\n", "\n"))
        }
        (s, Platform::Windows) if s.is_posix() => {
            if !text.contains('\n') || text.contains("\r\n") {
                return None;
            }
            Some(text.replace('\n', "\r\n"))
        }
        _ => None,
    }
}

/// One canonicalization rule: phrasing pattern plus canonical renderer.
struct ErrorRule {
    pattern: Regex,
    kind: &'static str,
}

fn error_rules() -> &'static Vec<ErrorRule> {
    static RULES: OnceLock<Vec<ErrorRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        let table: &[(&str, &str)] = &[
            // file not found
            (
                r"(?i)cannot find path '(?P<subject>[^']+)' because it does not exist",
                "file not found",
            ),
            (
                r"(?i)the system cannot find the (?:file|path) specified",
                "file not found",
            ),
            (
                r"(?i)(?:^|\n)[^:\n]*:\s*(?P<subject>[^\n]+?):\s*no such file or directory",
                "file not found",
            ),
            (r"(?i)no such file or directory", "file not found"),
            // access denied
            (
                r"(?i)access to the path '(?P<subject>[^']+)' is denied",
                "access denied",
            ),
            (r"(?i)access is denied", "access denied"),
            (
                r"(?i)(?:^|\n)[^:\n]*:\s*(?:cannot [^\n]+? ')?(?P<subject>[^\n]+?)'?:\s*permission denied",
                "access denied",
            ),
            (r"(?i)permission denied", "access denied"),
            // command not found
            (
                r"(?i)the term '(?P<subject>[^']+)' is not recognized as (?:the name of a cmdlet|an internal or external command)[^\n]*",
                "command not found",
            ),
            (
                r"(?i)'(?P<subject>[^']+)' is not recognized as an internal or external command[^\n]*",
                "command not found",
            ),
            (
                r"(?i)(?:^|\n)[^:\n]*:\s*(?P<subject>[^\n]+?):\s*command not found",
                "command not found",
            ),
        ];
        table
            .iter()
            .filter_map(|(pat, kind)| {
                Regex::new(pat).ok().map(|pattern| ErrorRule { pattern, kind })
            })
            .collect()
    })
}

/// Map platform-specific error phrasings onto one canonical message per
/// kind, extracting the offending path or command name when the phrasing
/// carries it.
fn canonicalize_errors(
    text: &str,
    _source: Platform,
    _target: Platform,
    _warnings: &mut Vec<String>,
) -> Option<String> {
    let mut content = text.to_string();
    let mut changed = false;

    for rule in error_rules() {
        if !rule.pattern.is_match(&content) {
            continue;
        }
        content = rule
            .pattern
            .replace_all(&content, |caps: &regex::Captures<'_>| {
                let leading_newline = caps[0].starts_with('\n');
                let rendered = match caps.name("subject") {
                    Some(subject) => format!("{}: {}", rule.kind, subject.as_str().trim()),
                    None => rule.kind.to_string(),
                };
                if leading_newline {
                    format!("\n{rendered}")
                } else {
                    rendered
                }
            })
            .into_owned();
        changed = true;
    }

    changed.then_some(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> PlatformAdapter {
        PlatformAdapter::new()
    }

    // ---- Identity ----

    #[test]
    fn same_platform_is_a_noop() {
        let r = adapter().adapt("C:\\Users\\kim\\file.txt", Platform::Windows, Platform::Windows);
        assert_eq!(r.adapted_content, "C:\\Users\\kim\\file.txt");
        assert!(r.adaptations_applied.is_empty());
    }

    // ---- Paths ----

    #[test]
    fn well_known_windows_dirs_map_to_posix() {
        let r = adapter().adapt(
            "type C:\\Users\\kim\\notes.txt",
            Platform::Windows,
            Platform::Linux,
        );
        assert_eq!(r.adapted_content, "type /home/kim/notes.txt");
        assert!(r.adaptations_applied.contains(&"path_translation".to_string()));
    }

    #[test]
    fn windows_temp_maps_to_tmp() {
        let r = adapter().adapt(
            "C:\\Windows\\Temp\\build.log",
            Platform::Windows,
            Platform::Linux,
        );
        assert_eq!(r.adapted_content, "/tmp/build.log");
    }

    #[test]
    fn posix_home_maps_to_users() {
        let r = adapter().adapt(
            "cat /home/kim/notes.txt",
            Platform::Linux,
            Platform::Windows,
        );
        assert_eq!(r.adapted_content, "cat C:\\Users\\kim\\notes.txt");
    }

    #[test]
    fn unknown_drive_letter_warns() {
        let r = adapter().adapt("D:\\data\\set.csv", Platform::Windows, Platform::Linux);
        assert_eq!(r.adapted_content, "/d/data/set.csv");
        assert!(r.warnings.iter().any(|w| w.contains("drive D:")));
    }

    #[test]
    fn path_separator_round_trip_is_lossless() {
        // posix -> windows -> posix with no lossy drive mapping involved.
        let original = "ls /home/kim/projects/demo";
        let there = adapter().adapt(original, Platform::Linux, Platform::Windows);
        let back = adapter().adapt(&there.adapted_content, Platform::Windows, Platform::Linux);
        assert_eq!(back.adapted_content, original);
    }

    // ---- Environment variables ----

    #[test]
    fn env_syntax_windows_to_posix() {
        let r = adapter().adapt("echo %USERPROFILE%", Platform::Windows, Platform::Linux);
        assert_eq!(r.adapted_content, "echo $HOME");
        assert!(r
            .adaptations_applied
            .contains(&"env_variable_syntax".to_string()));
    }

    #[test]
    fn env_syntax_posix_to_windows() {
        let r = adapter().adapt("echo $HOME and $USER", Platform::Linux, Platform::Windows);
        assert_eq!(r.adapted_content, "echo %USERPROFILE% and %USERNAME%");
    }

    #[test]
    fn unmapped_variable_names_pass_through() {
        let r = adapter().adapt("echo $MY_CUSTOM", Platform::Linux, Platform::Windows);
        assert_eq!(r.adapted_content, "echo %MY_CUSTOM%");
    }

    #[test]
    fn braced_posix_vars_are_recognized() {
        let r = adapter().adapt("echo ${HOME}", Platform::Linux, Platform::Windows);
        assert_eq!(r.adapted_content, "echo %USERPROFILE%");
    }

    // ---- Line endings ----

    #[test]
    fn crlf_to_lf() {
        let r = adapter().adapt("a\r\nb\r\n", Platform::Windows, Platform::Linux);
        assert_eq!(r.adapted_content, "a\nb\n");
        assert!(r.adaptations_applied.contains(&"line_endings".to_string()));
    }

    #[test]
    fn lf_to_crlf() {
        let r = adapter().adapt("a\nb\n", Platform::Linux, Platform::Windows);
        assert_eq!(r.adapted_content, "a\r\nb\r\n");
    }

    // ---- Error canonicalization ----

    #[test]
    fn windows_file_not_found_is_canonicalized() {
        let r = adapter().adapt(
            "Cannot find path 'C:\\missing.txt' because it does not exist.",
            Platform::Windows,
            Platform::Linux,
        );
        assert!(r.adapted_content.starts_with("file not found: "));
        assert!(r
            .adaptations_applied
            .contains(&"error_canonicalization".to_string()));
    }

    #[test]
    fn posix_file_not_found_extracts_the_path() {
        let r = adapter().adapt(
            "cat: /etc/missing.conf: No such file or directory",
            Platform::Linux,
            Platform::Windows,
        );
        assert!(
            r.adapted_content.contains("file not found: /etc/missing.conf")
                || r.adapted_content.contains("file not found: C:\\etc\\missing.conf"),
            "got {:?}",
            r.adapted_content
        );
    }

    #[test]
    fn command_not_found_phrasings_converge() {
        let windows = adapter().adapt(
            "The term 'foob' is not recognized as the name of a cmdlet, function, or operable program.",
            Platform::Windows,
            Platform::Linux,
        );
        let posix = adapter().adapt(
            "bash: foob: command not found",
            Platform::Linux,
            Platform::Windows,
        );
        assert!(windows.adapted_content.contains("command not found: foob"));
        assert!(posix.adapted_content.contains("command not found: foob"));
    }

    #[test]
    fn access_denied_phrasings_converge() {
        let windows = adapter().adapt("Access is denied.", Platform::Windows, Platform::Linux);
        assert!(windows.adapted_content.contains("access denied"));

        let posix = adapter().adapt(
            "touch: cannot touch '/etc/x': Permission denied",
            Platform::Linux,
            Platform::Windows,
        );
        assert!(
            posix.adapted_content.contains("access denied: /etc/x")
                || posix.adapted_content.contains("access denied: C:\\etc\\x"),
            "got {:?}",
            posix.adapted_content
        );
    }

    #[test]
    fn one_failing_stage_does_not_block_others() {
        // Text with nothing for the path stage but work for env + endings.
        let r = adapter().adapt("echo %TEMP%\r\n", Platform::Windows, Platform::Linux);
        assert_eq!(r.adapted_content, "echo $TMPDIR\n");
        assert!(r.adaptations_applied.contains(&"env_variable_syntax".to_string()));
        assert!(r.adaptations_applied.contains(&"line_endings".to_string()));
        assert!(!r.adaptations_applied.contains(&"path_translation".to_string()));
    }
}
