//! Shared helpers for integration tests.
//!
//! Each integration test file compiles common/ as its own module, so not
//! every helper is used in every file.
#![allow(dead_code)]

use rampart::{
    CommandPipeline, DisabledSandbox, PermissionChecker, PlatformPrivileges, RampartConfig,
    RiskClassifier, SecurityCoordinator, ShellContext,
};

/// Initialize test logging once; repeated calls are harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Privilege stub with fixed answers, so tests behave the same whether
/// the suite runs as root or not.
pub struct StubPrivileges {
    pub elevated: bool,
    pub elevatable: bool,
}

impl PlatformPrivileges for StubPrivileges {
    fn has_elevation(&self) -> bool {
        self.elevated
    }
    fn can_elevate(&self) -> bool {
        self.elevatable
    }
}

/// A coordinator with default policy and stubbed privileges.
pub fn coordinator(elevated: bool) -> SecurityCoordinator {
    init_tracing();
    SecurityCoordinator::with_components(
        RiskClassifier::with_defaults(),
        PermissionChecker::with_privileges(Box::new(StubPrivileges {
            elevated,
            elevatable: false,
        })),
        false,
    )
}

/// A full pipeline with default config, stubbed privileges, no sandbox.
pub fn pipeline(elevated: bool) -> CommandPipeline {
    CommandPipeline::with_components(
        coordinator(elevated),
        Box::new(DisabledSandbox),
        RampartConfig::default(),
    )
}

/// A context rooted in the system temp directory.
pub fn ctx() -> ShellContext {
    ShellContext::new(std::env::temp_dir())
}
