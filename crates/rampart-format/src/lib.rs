//! Output normalization and cross-platform adaptation for Rampart.
//!
//! [`OutputNormalizer`] turns raw command output into bounded,
//! structurally-classified text; [`PlatformAdapter`] rewrites paths,
//! environment syntax, line endings, and error phrasings when text
//! crosses operating systems.

pub mod adapter;
pub mod normalizer;

pub use adapter::PlatformAdapter;
pub use normalizer::{detect_table, OutputNormalizer, TableInfo};
