//! Operating-system identification for the pipeline.
//!
//! The pipeline adapts command rendering and output between operating
//! systems, so platform identity travels on results rather than being
//! re-derived at every call site.

use serde::{Deserialize, Serialize};

/// The operating systems the pipeline distinguishes between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Windows,
    Linux,
    MacOs,
}

impl Platform {
    /// The platform this process is running on, resolved at compile time.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Path separator character used by this platform's shells.
    pub fn path_separator(self) -> char {
        match self {
            Platform::Windows => '\\',
            Platform::Linux | Platform::MacOs => '/',
        }
    }

    /// Line ending convention for this platform's command output.
    pub fn line_ending(self) -> &'static str {
        match self {
            Platform::Windows => "\r\n",
            Platform::Linux | Platform::MacOs => "\n",
        }
    }

    /// Whether this platform uses POSIX-style paths and environment syntax.
    pub fn is_posix(self) -> bool {
        matches!(self, Platform::Linux | Platform::MacOs)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Windows => write!(f, "windows"),
            Platform::Linux => write!(f, "linux"),
            Platform::MacOs => write!(f, "macos"),
        }
    }
}
