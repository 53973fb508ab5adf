//! Interpreter discovery and subprocess execution for Rampart.
//!
//! [`InterpreterLocator`] finds and caches the installed PowerShell
//! interpreter; [`ShellExecutor`] runs validated commands through it with
//! bounded output and hard timeouts.

pub mod executor;
pub mod locator;
mod process;

pub use executor::ShellExecutor;
pub use locator::InterpreterLocator;
