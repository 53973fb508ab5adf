//! Pattern-based risk classification for shell commands.
//!
//! Commands are tested against an ordered table of dangerous signatures;
//! the first match wins and blocks execution. Commands that survive the
//! table are bucketed by verb: read-only verbs are `Safe`, mutating verbs
//! are `Medium` with confirmation, and anything unrecognized falls to the
//! configured unknown-command policy.
//!
//! The built-in table covers both PowerShell-style and POSIX-style
//! signatures, ordered most-specific-first so that, e.g., a recursive
//! forced `Remove-Item` is caught as `Critical` before the generic
//! `remove-` mutating verb can claim it as `Medium`.

use regex::RegexBuilder;

use rampart_types::{CustomRule, PolicyConfig, RampartError, RiskLevel, UnknownCommandPolicy};

/// One entry in the dangerous-signature table.
#[derive(Debug)]
pub struct RiskRule {
    pattern: regex::Regex,
    description: String,
    risk: RiskLevel,
}

impl RiskRule {
    /// Human-readable description used as the block reason.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Risk tier assigned when this rule matches.
    pub fn risk(&self) -> RiskLevel {
        self.risk
    }
}

/// What the classifier concluded about one command.
#[derive(Debug, Clone)]
pub struct Classification {
    /// Assigned risk tier.
    pub risk: RiskLevel,
    /// Whether the command is blocked outright.
    pub blocked: bool,
    /// Reasons for blocking; empty when `blocked` is false.
    pub reasons: Vec<String>,
    /// Whether the command should be confirmed before execution.
    pub requires_confirmation: bool,
    /// Advisory notes that do not block.
    pub warnings: Vec<String>,
}

impl Classification {
    fn blocked(risk: RiskLevel, reason: impl Into<String>) -> Self {
        Self {
            risk,
            blocked: true,
            reasons: vec![reason.into()],
            requires_confirmation: false,
            warnings: Vec::new(),
        }
    }

    fn allowed(risk: RiskLevel, requires_confirmation: bool) -> Self {
        Self {
            risk,
            blocked: false,
            reasons: Vec::new(),
            requires_confirmation,
            warnings: Vec::new(),
        }
    }
}

/// Built-in dangerous signatures, ordered most-specific-first.
///
/// Order matters: the classifier short-circuits on the first match, so
/// narrow destructive patterns must precede broader ones. Extension rules
/// are appended after these and can therefore never shadow a built-in.
const DANGEROUS_PATTERNS: &[(&str, &str, RiskLevel)] = &[
    // Recursive forced deletion, both shells.
    (
        r"remove-item\s+.*-recurse\b.*-force|remove-item\s+.*-force\b.*-recurse",
        "recursive forced deletion",
        RiskLevel::Critical,
    ),
    (
        r"\brm\s+-[a-z]*(rf|fr)[a-z]*\b|\brm\s+-[a-z]*r[a-z]*\s+-[a-z]*f|\brm\s+-[a-z]*f[a-z]*\s+-[a-z]*r",
        "recursive forced deletion",
        RiskLevel::Critical,
    ),
    (
        r"\b(del|erase)\s+.*/[fsq].*\s+[a-z]:\\|\brd\s+/s\b",
        "forced bulk deletion",
        RiskLevel::Critical,
    ),
    // Deletion of system paths even without -Recurse/-Force.
    (
        r"remove-item\s+.*(c:\\windows|hklm:|hkcu:)|\brm\s+.*\s(/etc|/boot|/usr|/bin)\b",
        "deletion under a system path",
        RiskLevel::Critical,
    ),
    // Disk destruction.
    (
        r"\b(format-volume|clear-disk|initialize-disk|diskpart)\b",
        "disk format or partition change",
        RiskLevel::Critical,
    ),
    (
        r"\bformat\s+[a-z]:|\bmkfs(\.\w+)?\b|\bfdisk\b",
        "disk format or partition change",
        RiskLevel::Critical,
    ),
    (
        r"\bdd\b.*\bof=/dev/|>\s*/dev/(sd|hd|nvme)",
        "raw write to a block device",
        RiskLevel::Critical,
    ),
    // Volume-shadow / recovery destruction.
    (
        r"vssadmin\s+delete\s+shadows|wbadmin\s+delete",
        "deletion of recovery snapshots",
        RiskLevel::Critical,
    ),
    // Fork bomb.
    (
        r":\(\)\s*\{\s*:\|:\s*&\s*\}\s*;\s*:",
        "fork bomb",
        RiskLevel::Critical,
    ),
    // Piped remote code execution.
    (
        r"(curl|wget|invoke-webrequest|\biwr\b)[^|]*\|\s*(sh|bash|zsh|pwsh|iex)\b",
        "piped remote script execution",
        RiskLevel::Critical,
    ),
    (
        r"\biex\b.*(downloadstring|invoke-webrequest|\biwr\b)",
        "piped remote script execution",
        RiskLevel::Critical,
    ),
    // Security tooling teardown.
    (
        r"set-mppreference\s+.*-disablerealtimemonitoring|uninstall-windowsdefender",
        "disabling endpoint protection",
        RiskLevel::Critical,
    ),
    // Registry destruction.
    (
        r"\breg\s+delete\b",
        "registry deletion",
        RiskLevel::Critical,
    ),
    // Account removal.
    (
        r"\bnet\s+user\s+\S+\s+/delete|\buserdel\b",
        "user account deletion",
        RiskLevel::High,
    ),
    // System power state.
    (
        r"\b(stop-computer|restart-computer|shutdown|reboot|poweroff|halt)\b",
        "system shutdown or restart",
        RiskLevel::High,
    ),
    // Boot configuration.
    (
        r"\bbcdedit\b",
        "boot configuration change",
        RiskLevel::High,
    ),
    // Execution-policy loosening.
    (
        r"set-executionpolicy\s+(unrestricted|bypass)",
        "loosening the script execution policy",
        RiskLevel::High,
    ),
    // World-writable permission sweep.
    (
        r"\bchmod\s+(-[a-z]+\s+)*777\s+/(\s|$)|\bchmod\s+-r\b.*777",
        "recursive world-writable permissions",
        RiskLevel::High,
    ),
];

/// Read-only verbs. Entries ending in `-` are PowerShell verb prefixes
/// matched as a prefix of the first token; bare entries are matched as the
/// whole first token.
const SAFE_VERBS: &[&str] = &[
    "get-", "select-", "where-", "measure-", "test-", "resolve-", "show-", "find-", "out-",
    "convertto-", "convertfrom-", "ls", "dir", "cat", "type", "pwd", "cd", "echo", "whoami",
    "hostname", "date", "history", "help", "man", "which", "head", "tail", "grep", "ps", "df",
    "du", "free", "uname", "env", "id", "uptime", "wc", "file", "stat",
];

/// Mutating verbs: create/update/delete/start/stop. Same matching rules
/// as [`SAFE_VERBS`].
const MUTATING_VERBS: &[&str] = &[
    "new-", "set-", "add-", "remove-", "start-", "stop-", "restart-", "rename-", "move-",
    "copy-", "clear-", "install-", "uninstall-", "update-", "enable-", "disable-", "register-",
    "unregister-", "invoke-", "mkdir", "rmdir", "touch", "cp", "mv", "rm", "ln", "chmod",
    "chown", "git", "npm", "pip", "cargo", "make", "apt", "apt-get", "yum", "dnf", "brew",
    "systemctl", "service", "kill", "pkill",
];

/// Classifies command strings against the dangerous-signature table and
/// the verb lists.
///
/// The table is built once at construction and treated as immutable;
/// [`RiskClassifier::extend_rules`] appends, never replaces.
pub struct RiskClassifier {
    dangerous: Vec<RiskRule>,
    safe_verbs: Vec<String>,
    mutating_verbs: Vec<String>,
    unknown_policy: UnknownCommandPolicy,
}

impl RiskClassifier {
    /// Build a classifier with the built-in table and the policy's custom
    /// additions appended.
    ///
    /// Returns an error if any custom rule's regex fails to compile;
    /// built-in patterns are asserted valid by tests.
    pub fn new(policy: &PolicyConfig) -> Result<Self, RampartError> {
        let mut classifier = Self::with_defaults();
        classifier.unknown_policy = policy.unknown_commands;
        classifier.extend_rules(&policy.custom_rules)?;
        classifier.extend_safe_verbs(policy.custom_safe_prefixes.iter().map(String::as_str));
        Ok(classifier)
    }

    /// Build a classifier with only the built-in table, strict unknown
    /// policy.
    pub fn with_defaults() -> Self {
        let dangerous = DANGEROUS_PATTERNS
            .iter()
            .filter_map(|(pat, desc, risk)| {
                compile_insensitive(pat)
                    .ok()
                    .map(|pattern| RiskRule {
                        pattern,
                        description: (*desc).to_string(),
                        risk: *risk,
                    })
            })
            .collect();

        Self {
            dangerous,
            safe_verbs: SAFE_VERBS.iter().map(|s| s.to_string()).collect(),
            mutating_verbs: MUTATING_VERBS.iter().map(|s| s.to_string()).collect(),
            unknown_policy: UnknownCommandPolicy::Strict,
        }
    }

    /// Append caller-supplied rules after the built-ins.
    pub fn extend_rules(&mut self, rules: &[CustomRule]) -> Result<(), RampartError> {
        for rule in rules {
            let pattern = compile_insensitive(&rule.pattern).map_err(|e| {
                RampartError::ConfigError(format!(
                    "invalid custom rule pattern '{}': {e}",
                    rule.pattern
                ))
            })?;
            self.dangerous.push(RiskRule {
                pattern,
                description: rule.description.clone(),
                risk: rule.risk,
            });
        }
        Ok(())
    }

    /// Append caller-supplied read-only verbs after the built-ins.
    pub fn extend_safe_verbs<'a>(&mut self, verbs: impl IntoIterator<Item = &'a str>) {
        self.safe_verbs
            .extend(verbs.into_iter().map(|v| v.to_ascii_lowercase()));
    }

    /// Number of rules currently in the dangerous table.
    pub fn rule_count(&self) -> usize {
        self.dangerous.len()
    }

    /// Classify a command string.
    ///
    /// Stages, in order, first hit wins:
    /// 1. empty/whitespace -- blocked
    /// 2. dangerous table -- blocked with the rule's tier and description
    /// 3. safe verbs -- `Safe`, no confirmation
    /// 4. mutating verbs -- `Medium`, confirmation required
    /// 5. unknown-command policy -- strict: `Low` + confirmation;
    ///    permissive: `Safe`, no confirmation
    pub fn classify(&self, command: &str) -> Classification {
        let trimmed = command.trim();
        if trimmed.is_empty() {
            return Classification::blocked(RiskLevel::Critical, "empty command");
        }

        for rule in &self.dangerous {
            if rule.pattern.is_match(trimmed) {
                tracing::debug!(
                    rule = %rule.description,
                    risk = %rule.risk,
                    "command matched dangerous signature"
                );
                return Classification::blocked(rule.risk, rule.description.clone());
            }
        }

        if verb_matches(trimmed, &self.safe_verbs) {
            return Classification::allowed(RiskLevel::Safe, false);
        }

        if verb_matches(trimmed, &self.mutating_verbs) {
            return Classification::allowed(RiskLevel::Medium, true);
        }

        match self.unknown_policy {
            UnknownCommandPolicy::Strict => {
                let mut c = Classification::allowed(RiskLevel::Low, true);
                c.warnings.push("unrecognized command".to_string());
                c
            }
            UnknownCommandPolicy::Permissive => Classification::allowed(RiskLevel::Safe, false),
        }
    }
}

/// Compile a pattern case-insensitively.
fn compile_insensitive(pattern: &str) -> Result<regex::Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Test the command's first token against a verb list. Entries ending in
/// `-` match as prefixes (PowerShell verb-noun forms); bare entries match
/// the whole token.
fn verb_matches(command: &str, verbs: &[String]) -> bool {
    let first = command
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    verbs.iter().any(|v| {
        if v.ends_with('-') {
            first.starts_with(v.as_str())
        } else {
            first == *v
        }
    })
}
