//! Validation sequencing and the execution proof token.
//!
//! [`SecurityCoordinator`] is the single front door to execution. It runs
//! the risk classifier and the permission checker in a fixed order,
//! composes their answers into one [`ValidationResult`], and -- for
//! allowed commands -- mints an [`ApprovedCommand`] token. The execution
//! layer accepts only that token, so a blocked command cannot reach a
//! subprocess by construction, and the executors re-check the embedded
//! verdict anyway.

use rampart_types::{
    PolicyConfig, RampartError, RiskLevel, ShellContext, ValidationResult,
};

use crate::classifier::RiskClassifier;
use crate::permissions::PermissionChecker;

/// Proof that a command passed validation.
///
/// Only the coordinator can construct this type (the fields are private
/// and there is no public constructor), which is what enforces the
/// "validation before execution" invariant across crate boundaries.
#[derive(Debug, Clone)]
pub struct ApprovedCommand {
    command: String,
    validation: ValidationResult,
}

impl ApprovedCommand {
    /// The validated command text.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The verdict this approval was minted from.
    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    /// Risk tier of the approved command.
    pub fn risk(&self) -> RiskLevel {
        self.validation.risk
    }
}

/// Orchestrates classifier + permission checker into one `validate` call
/// and one confirmation-gating policy.
pub struct SecurityCoordinator {
    classifier: RiskClassifier,
    permissions: PermissionChecker,
    always_confirm: bool,
}

impl SecurityCoordinator {
    /// Coordinator from a policy configuration, using platform privilege
    /// probes.
    pub fn new(policy: &PolicyConfig) -> Result<Self, RampartError> {
        Ok(Self {
            classifier: RiskClassifier::new(policy)?,
            permissions: PermissionChecker::new(),
            always_confirm: policy.always_confirm,
        })
    }

    /// Coordinator with injected components (tests, embeddings with
    /// custom privilege sources).
    pub fn with_components(
        classifier: RiskClassifier,
        permissions: PermissionChecker,
        always_confirm: bool,
    ) -> Self {
        Self {
            classifier,
            permissions,
            always_confirm,
        }
    }

    /// Validate a command against policy and privilege state.
    ///
    /// Sequencing is fixed; each stage short-circuits on rejection:
    /// 1. empty input is rejected;
    /// 2. a dangerous-signature match blocks immediately;
    /// 3. an elevation gap blocks with `requires_elevation = true` and
    ///    `risk = High` -- a privilege gap is a harder constraint than the
    ///    classifier's policy tier, so it overrides;
    /// 4. otherwise the command is allowed and confirmation is derived
    ///    from configuration and tier.
    pub fn validate(&self, command: &str, context: &ShellContext) -> ValidationResult {
        let trimmed = command.trim();
        if trimmed.is_empty() {
            tracing::debug!(session = %context.session_id, "rejected empty command");
            return ValidationResult::blocked(RiskLevel::Critical, "empty command");
        }

        let classification = self.classifier.classify(trimmed);
        if classification.blocked {
            tracing::info!(
                session = %context.session_id,
                command = trimmed,
                risk = %classification.risk,
                "command blocked by policy"
            );
            let mut result = ValidationResult::blocked(
                classification.risk,
                classification
                    .reasons
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "blocked by policy".to_string()),
            );
            result.blocked_reasons = classification.reasons;
            return result;
        }

        if self.permissions.requires_elevation(trimmed) && !self.permissions.has_elevation() {
            let operation = self
                .permissions
                .matched_admin_operation(trimmed)
                .unwrap_or("administrative operation");
            tracing::info!(
                session = %context.session_id,
                command = trimmed,
                operation,
                "command requires elevation the process does not hold"
            );
            let mut result = ValidationResult::blocked(
                RiskLevel::High,
                format!("{operation} requires elevated privileges"),
            );
            result.requires_elevation = true;
            if self.permissions.can_elevate() {
                result = result
                    .with_warning("elevation appears available to this account without a prompt");
            }
            return result;
        }

        let requires_confirmation = self.always_confirm
            || classification.requires_confirmation
            || classification.risk >= RiskLevel::Medium;

        let mut result = ValidationResult::allowed(classification.risk, requires_confirmation);
        result.warnings = classification.warnings;
        if self.permissions.requires_elevation(trimmed) {
            // Already elevated: allowed, but never silently.
            result.requires_confirmation = true;
            if result.risk < RiskLevel::High {
                result.risk = RiskLevel::High;
            }
            result = result.with_warning("command performs an administrative operation");
        }
        tracing::debug!(
            session = %context.session_id,
            command = trimmed,
            risk = %result.risk,
            requires_confirmation = result.requires_confirmation,
            "command validated"
        );
        result
    }

    /// Validate and, on success, mint the execution proof token.
    ///
    /// Rejections come back as typed errors so callers that skipped
    /// `validate` still get the reason; callers that want the full
    /// verdict call `validate` first and only `authorize` after
    /// confirmation.
    pub fn authorize(
        &self,
        command: &str,
        context: &ShellContext,
    ) -> Result<ApprovedCommand, RampartError> {
        let validation = self.validate(command, context);
        if !validation.allowed {
            if validation.requires_elevation {
                return Err(RampartError::ElevationRequired);
            }
            if validation.blocked_reasons == ["empty command"] {
                return Err(RampartError::EmptyCommand);
            }
            return Err(RampartError::CommandBlocked {
                reasons: validation.blocked_reasons,
            });
        }
        Ok(ApprovedCommand {
            command: command.trim().to_string(),
            validation,
        })
    }
}
