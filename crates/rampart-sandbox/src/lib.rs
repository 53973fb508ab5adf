//! Container-isolated execution for Rampart.
//!
//! Provides the [`SandboxProvider`] trait with two implementations:
//! - [`DockerSandbox`]: hardened ephemeral Docker containers
//! - [`DisabledSandbox`]: the no-op provider used when sandboxing is off

pub mod docker;
pub mod provider;

pub use docker::{build_docker_args, DockerSandbox};
pub use provider::{DisabledSandbox, SandboxProvider};
