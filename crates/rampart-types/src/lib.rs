//! Core types shared across all Rampart crates.
//!
//! Defines risk tiers, validation verdicts, execution results, interpreter
//! metadata, session context, configuration, and error types used by the
//! policy, sandbox, shell, and formatting crates.

pub mod config;
pub mod context;
pub mod error;
pub mod execution;
pub mod format;
pub mod platform;
pub mod risk;
pub mod validation;

pub use config::{
    CustomRule, ExecutorConfig, FormatConfig, OverflowPolicy, PolicyConfig, RampartConfig,
    SandboxConfig, UnknownCommandPolicy,
};
pub use context::ShellContext;
pub use error::RampartError;
pub use execution::{ExecutionResult, InterpreterInfo};
pub use format::{AdaptationResult, DetectedStructure, FormattedOutput};
pub use platform::Platform;
pub use risk::RiskLevel;
pub use validation::ValidationResult;
