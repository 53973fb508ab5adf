//! Risk tiers for shell commands.
//!
//! Every command the pipeline sees receives one of five ordered tiers.
//! The ordering is total: policy code compares tiers with `>=` to decide
//! whether confirmation is required, so [`RiskLevel`] implements `Ord`
//! through an explicit numeric rank.

use serde::{Deserialize, Serialize};

/// Five-tier risk classification for shell commands.
///
/// Ordered from least to most dangerous. Use [`RiskLevel::rank`] for
/// numeric comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Read-only, no side effects (e.g., `Get-Process`, `ls`).
    Safe,
    /// Unrecognized but not matching any dangerous signature.
    Low,
    /// Meaningful side effects but generally recoverable (e.g., creating
    /// or editing files, starting a service).
    Medium,
    /// Significant side effects, hard to reverse (e.g., stopping system
    /// services, changing permissions).
    High,
    /// Destructive or irreversible operations that are blocked outright.
    Critical,
}

impl RiskLevel {
    /// Numeric rank for ordering comparisons.
    ///
    /// `Safe = 0`, `Low = 1`, `Medium = 2`, `High = 3`, `Critical = 4`.
    pub fn rank(self) -> u8 {
        match self {
            RiskLevel::Safe => 0,
            RiskLevel::Low => 1,
            RiskLevel::Medium => 2,
            RiskLevel::High => 3,
            RiskLevel::Critical => 4,
        }
    }
}

impl PartialOrd for RiskLevel {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RiskLevel {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Safe => write!(f, "Safe"),
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
            RiskLevel::Critical => write!(f, "Critical"),
        }
    }
}
