//! Filesystem rule loader.
//!
//! Scans the rules directory once at startup, deserializes every YAML file
//! via two-pass deserialization (RuleEnvelope -> RuleDocument), validates it,
//! and compiles the active BenchmarkTable and DecisionConfig. Compiled tables
//! are immutable for the life of the process.

mod core;
mod error;


pub use self::core::RuleLoader;
pub use self::error::{LoadResult, LoadStatus, Result, RuleError};
