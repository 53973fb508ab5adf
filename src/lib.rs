//! Rampart: the safety and execution core of a natural-language shell
//! assistant.
//!
//! Translated commands flow through one pipeline: the security
//! coordinator validates them against a dangerous-signature table and the
//! process's privilege state; allowed commands execute either inside a
//! hardened container sandbox or directly through the discovered
//! PowerShell interpreter; raw output is normalized into bounded,
//! structurally-classified text and can be adapted across operating
//! systems.
//!
//! The crates compose as `validate -> execute -> normalize/adapt`:
//! - [`rampart_policy`]: classification, privileges, coordination
//! - [`rampart_sandbox`]: container isolation
//! - [`rampart_shell`]: interpreter discovery and subprocess execution
//! - [`rampart_format`]: output normalization and platform adaptation
//! - [`rampart_types`]: the shared data model
//!
//! [`CommandPipeline`] wires them together for embedders that want the
//! whole flow in one call.

mod pipeline;

pub use pipeline::{CommandPipeline, PipelineOutcome};

pub use rampart_format::{detect_table, OutputNormalizer, PlatformAdapter, TableInfo};
pub use rampart_policy::{
    ApprovedCommand, PermissionChecker, PlatformPrivileges, RiskClassifier, SecurityCoordinator,
};
pub use rampart_sandbox::{DisabledSandbox, DockerSandbox, SandboxProvider};
pub use rampart_shell::{InterpreterLocator, ShellExecutor};
pub use rampart_types::{
    AdaptationResult, DetectedStructure, ExecutionResult, FormattedOutput, InterpreterInfo,
    Platform, RampartConfig, RampartError, RiskLevel, ShellContext, ValidationResult,
};
