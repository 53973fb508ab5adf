//! End-to-end wiring of the safety-and-execution pipeline.
//!
//! `validate -> execute (sandboxed or direct) -> normalize`, with the
//! sandbox fallback decision made here: the sandbox itself fails fast
//! when its engine is missing, and this facade -- the caller -- decides
//! whether that degrades to direct execution.

use std::time::Duration;

use rampart_format::{OutputNormalizer, PlatformAdapter};
use rampart_policy::SecurityCoordinator;
use rampart_sandbox::{DisabledSandbox, DockerSandbox, SandboxProvider};
use rampart_shell::ShellExecutor;
use rampart_types::{
    AdaptationResult, ExecutionResult, FormattedOutput, Platform, RampartConfig, RampartError,
    ShellContext, ValidationResult,
};

/// Everything one request produced.
///
/// A blocked command is a routine outcome: `validation.allowed` is false
/// and the execution/formatted fields are `None`, with no error raised.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// The safety verdict.
    pub validation: ValidationResult,
    /// The execution result, when the command was allowed.
    pub execution: Option<ExecutionResult>,
    /// Normalized stdout, when the command ran.
    pub formatted: Option<FormattedOutput>,
}

/// The assembled pipeline.
pub struct CommandPipeline {
    coordinator: SecurityCoordinator,
    executor: ShellExecutor,
    sandbox: Box<dyn SandboxProvider>,
    normalizer: OutputNormalizer,
    adapter: PlatformAdapter,
    config: RampartConfig,
}

impl CommandPipeline {
    /// Assemble a pipeline from configuration.
    pub fn new(config: RampartConfig) -> Result<Self, RampartError> {
        let coordinator = SecurityCoordinator::new(&config.policy)?;
        let executor = ShellExecutor::new(config.executor.clone());
        let sandbox: Box<dyn SandboxProvider> = if config.sandbox.enabled {
            Box::new(DockerSandbox::new(config.sandbox.clone()))
        } else {
            Box::new(DisabledSandbox)
        };
        Ok(Self {
            coordinator,
            executor,
            sandbox,
            normalizer: OutputNormalizer::new(config.format.clone()),
            adapter: PlatformAdapter::new(),
            config,
        })
    }

    /// Pipeline with an injected coordinator and sandbox (tests,
    /// embeddings with custom privilege sources).
    pub fn with_components(
        coordinator: SecurityCoordinator,
        sandbox: Box<dyn SandboxProvider>,
        config: RampartConfig,
    ) -> Self {
        Self {
            coordinator,
            executor: ShellExecutor::new(config.executor.clone()),
            sandbox,
            normalizer: OutputNormalizer::new(config.format.clone()),
            adapter: PlatformAdapter::new(),
            config,
        }
    }

    /// Validate without executing. UI layers call this to decide whether
    /// to ask the user for confirmation before `run`.
    pub fn validate(&self, command: &str, context: &ShellContext) -> ValidationResult {
        self.coordinator.validate(command, context)
    }

    /// Validate and, if allowed, execute and normalize.
    ///
    /// Policy rejections come back as data in the outcome; only
    /// infrastructure faults (spawn failure, sandbox engine fault) are
    /// errors.
    pub fn run(
        &self,
        command: &str,
        context: &ShellContext,
    ) -> Result<PipelineOutcome, RampartError> {
        let validation = self.coordinator.validate(command, context);
        if !validation.allowed {
            return Ok(PipelineOutcome {
                validation,
                execution: None,
                formatted: None,
            });
        }

        let approved = self.coordinator.authorize(command, context)?;

        let execution = if self.config.sandbox.enabled {
            let timeout = Duration::from_secs(self.config.sandbox.timeout_secs);
            match self.sandbox.execute(&approved, timeout) {
                Ok(result) => result,
                Err(RampartError::SandboxUnavailable(reason)) => {
                    // Fallback policy lives here, not in the sandbox:
                    // degrade to direct execution and say so.
                    tracing::warn!(%reason, "sandbox unavailable, falling back to direct execution");
                    let mut result = self.executor.execute(&approved, context)?;
                    result
                        .warnings
                        .push(format!("sandbox unavailable ({reason}), ran unsandboxed"));
                    result
                }
                Err(e) => return Err(e),
            }
        } else {
            self.executor.execute(&approved, context)?
        };

        let formatted = self.normalizer.normalize(&execution.stdout);

        Ok(PipelineOutcome {
            validation,
            execution: Some(execution),
            formatted: Some(formatted),
        })
    }

    /// The interpreter the direct-execution path would use; a hard error
    /// when the host has none, so embedders can abort or force the
    /// sandbox up front.
    pub fn ensure_interpreter(&self) -> Result<rampart_types::InterpreterInfo, RampartError> {
        self.executor.ensure_interpreter()
    }

    /// Rewrite text produced on `source` for display on `target`.
    pub fn adapt(&self, text: &str, source: Platform, target: Platform) -> AdaptationResult {
        self.adapter.adapt(text, source, target)
    }

    /// Serialize normalized tabular content to JSON records.
    pub fn to_records(&self, content: &str) -> Option<Vec<serde_json::Value>> {
        self.normalizer.to_records(content)
    }
}
