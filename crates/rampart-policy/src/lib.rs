//! Command risk classification and validation sequencing for Rampart.
//!
//! Three pieces, composed by [`SecurityCoordinator`]:
//! - [`RiskClassifier`]: ordered dangerous-signature table + verb buckets
//! - [`PermissionChecker`]: elevation requirements and privilege probes
//! - [`ApprovedCommand`]: the proof token the execution layer requires

pub mod classifier;
pub mod coordinator;
pub mod permissions;

pub use classifier::{Classification, RiskClassifier, RiskRule};
pub use coordinator::{ApprovedCommand, SecurityCoordinator};
pub use permissions::{PermissionChecker, PlatformPrivileges, UnixPrivileges};
