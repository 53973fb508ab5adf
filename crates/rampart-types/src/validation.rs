//! Validation verdicts produced by the security coordinator.

use serde::{Deserialize, Serialize};

use crate::RiskLevel;

/// The outcome of validating a single command against the safety policy.
///
/// Produced once per `validate()` call and never mutated afterwards; the
/// audit and UI layers read it, the execution layer checks it. Policy
/// rejections are carried here as data (`allowed = false` plus reasons),
/// not as errors -- a blocked command is a routine outcome, not a fault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the command may proceed to execution.
    pub allowed: bool,
    /// The risk tier assigned by the classifier (or forced to `High` when
    /// an elevation gap blocks the command).
    pub risk: RiskLevel,
    /// Human-readable reasons the command was blocked. Non-empty iff
    /// `allowed` is false.
    pub blocked_reasons: Vec<String>,
    /// Advisory notes that do not block execution.
    pub warnings: Vec<String>,
    /// Whether the caller must obtain user confirmation before executing.
    pub requires_confirmation: bool,
    /// Whether the command needs elevated privileges the process lacks.
    pub requires_elevation: bool,
}

impl ValidationResult {
    /// Build an allowed verdict with the given tier and confirmation flag.
    pub fn allowed(risk: RiskLevel, requires_confirmation: bool) -> Self {
        Self {
            allowed: true,
            risk,
            blocked_reasons: Vec::new(),
            warnings: Vec::new(),
            requires_confirmation,
            requires_elevation: false,
        }
    }

    /// Build a blocked verdict with the given tier and reason.
    pub fn blocked(risk: RiskLevel, reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            risk,
            blocked_reasons: vec![reason.into()],
            warnings: Vec::new(),
            requires_confirmation: false,
            requires_elevation: false,
        }
    }

    /// Attach an advisory warning, preserving immutability at call sites
    /// by consuming and returning the value.
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_has_no_reasons() {
        let v = ValidationResult::allowed(RiskLevel::Safe, false);
        assert!(v.allowed);
        assert!(v.blocked_reasons.is_empty());
        assert!(!v.requires_elevation);
    }

    #[test]
    fn blocked_carries_reason() {
        let v = ValidationResult::blocked(RiskLevel::Critical, "recursive force deletion");
        assert!(!v.allowed);
        assert_eq!(v.blocked_reasons, vec!["recursive force deletion"]);
    }

    #[test]
    fn serialization_roundtrip() {
        let v = ValidationResult::allowed(RiskLevel::Medium, true)
            .with_warning("command mutates state");
        let json = serde_json::to_string(&v).unwrap();
        let back: ValidationResult = serde_json::from_str(&json).unwrap();
        assert!(back.allowed);
        assert_eq!(back.risk, RiskLevel::Medium);
        assert!(back.requires_confirmation);
        assert_eq!(back.warnings, vec!["command mutates state"]);
    }
}
