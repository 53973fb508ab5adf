//! Configuration for the Rampart pipeline.
//!
//! [`RampartConfig`] is the top-level configuration loaded from
//! `rampart.toml`, controlling classifier policy knobs, sandbox resource
//! limits, executor timeouts/ceilings, and output formatting.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{RampartError, RiskLevel};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// What the classifier does with a command that matches neither a
/// dangerous signature nor a known verb prefix.
///
/// This is a policy knob, not a security boundary: the dangerous-pattern
/// table blocks regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCommandPolicy {
    /// Unknown commands are `Low` risk and require confirmation.
    #[default]
    Strict,
    /// Unknown commands are allowed outright.
    Permissive,
}

/// A caller-supplied classification rule appended to the built-in table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomRule {
    /// Case-insensitive regular expression tested against the command.
    pub pattern: String,
    /// Human-readable description used as the block/warning reason.
    pub description: String,
    /// Risk tier assigned on match.
    pub risk: RiskLevel,
}

/// Classifier and coordinator policy knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Behavior for commands with no matching rule or prefix.
    #[serde(default)]
    pub unknown_commands: UnknownCommandPolicy,
    /// Force confirmation for every allowed command regardless of tier.
    #[serde(default)]
    pub always_confirm: bool,
    /// Extra dangerous-signature rules, appended after the built-ins.
    #[serde(default)]
    pub custom_rules: Vec<CustomRule>,
    /// Extra read-only verb prefixes, appended after the built-ins.
    #[serde(default)]
    pub custom_safe_prefixes: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            unknown_commands: UnknownCommandPolicy::Strict,
            always_confirm: false,
            custom_rules: Vec::new(),
            custom_safe_prefixes: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sandbox
// ---------------------------------------------------------------------------

/// Resource limits and isolation settings for the container sandbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Whether the pipeline should attempt sandboxed execution at all.
    pub enabled: bool,
    /// Container image reference (e.g. `"mcr.microsoft.com/powershell:latest"`).
    pub image: String,
    /// Memory ceiling as an engine limit string (e.g. `"512m"`).
    pub memory: String,
    /// Fractional CPU ceiling (rendered as `--cpus`; see [`SandboxConfig::nano_cpus`]).
    pub cpus: f64,
    /// Maximum number of processes inside the container.
    pub pids_limit: u32,
    /// Network mode; `"none"` disables networking.
    pub network: String,
    /// Size limit for the writable `/tmp` tmpfs (e.g. `"100m"`).
    pub tmpfs_size: String,
    /// Host directory mounted at `/workspace` inside the container.
    pub workspace_dir: PathBuf,
    /// Whether the workspace mount is writable. Read-only by default.
    pub workspace_writable: bool,
    /// Hard wall-clock limit for a sandboxed command, in seconds.
    pub timeout_secs: u64,
}

impl SandboxConfig {
    /// The CPU ceiling in the engine API's nanocpu unit.
    pub fn nano_cpus(&self) -> u64 {
        (self.cpus * 1_000_000_000.0) as u64
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            image: "mcr.microsoft.com/powershell:latest".into(),
            memory: "512m".into(),
            cpus: 1.0,
            pids_limit: 256,
            network: "none".into(),
            tmpfs_size: "100m".into(),
            workspace_dir: std::env::temp_dir().join("rampart-sandbox"),
            workspace_writable: false,
            timeout_secs: 300,
        }
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Process executor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Default wall-clock limit for a direct execution, in seconds.
    pub timeout_secs: u64,
    /// Byte ceiling for captured stdout/stderr; beyond it, output is
    /// truncated with a marker. Truncation depends only on size.
    pub max_output_bytes: usize,
    /// Environment variables the executor always sets, layered over the
    /// per-request context overrides.
    #[serde(default)]
    pub env_overrides: BTreeMap<String, String>,
    /// Explicit interpreter path that bypasses discovery. Still
    /// version-validated before being trusted.
    #[serde(default)]
    pub interpreter_path: Option<PathBuf>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_output_bytes: 1_048_576, // 1 MiB
            env_overrides: BTreeMap::new(),
            interpreter_path: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// What to do when output exceeds the configured line/byte limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum OverflowPolicy {
    /// Keep the head and append a truncation marker.
    Truncate,
    /// Keep `head` leading and `tail` trailing lines with an omission
    /// marker between them.
    Summarize { head: usize, tail: usize },
    /// Leave the output alone.
    PassThrough,
}

impl Default for OverflowPolicy {
    fn default() -> Self {
        OverflowPolicy::Truncate
    }
}

/// Output normalizer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatConfig {
    /// Apply Unicode canonical composition (NFC).
    pub normalize_unicode: bool,
    /// Strip control characters other than newline, tab, carriage return.
    pub strip_control_chars: bool,
    /// Line-count ceiling before the overflow policy applies.
    pub max_lines: usize,
    /// Byte-count ceiling before the overflow policy applies.
    pub max_bytes: usize,
    /// How overflowing output is shortened.
    #[serde(default)]
    pub overflow: OverflowPolicy,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            strip_control_chars: true,
            max_lines: 500,
            max_bytes: 262_144, // 256 KiB
            overflow: OverflowPolicy::Truncate,
        }
    }
}

// ---------------------------------------------------------------------------
// Top level
// ---------------------------------------------------------------------------

/// Top-level configuration for a Rampart pipeline instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RampartConfig {
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub sandbox: SandboxConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub format: FormatConfig,
}

impl RampartConfig {
    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, RampartError> {
        toml::from_str(content).map_err(|e| RampartError::ConfigError(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, RampartError> {
        toml::to_string_pretty(self).map_err(|e| RampartError::ConfigError(e.to_string()))
    }
}
