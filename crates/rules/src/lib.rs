//! Rule documents that configure the evaluation engine.
//!
//! This crate provides:
//! - YAML rule documents (`BenchmarkTable`, `DecisionConfig`) with serde deserialization
//! - Compilation into typed, process-wide immutable tables
//! - Startup validation with path-addressed errors and suggestions
//! - A filesystem loader that reads a rules directory once at startup

pub mod benchmark_table;
pub mod decision_config;
pub mod loader;
pub mod schema;
pub mod validation;

pub use benchmark_table::{
    BandPreference, Benchmark, BenchmarkTable, Comparison, Target, TargetRule, Threshold,
    ValueFormat,
};
pub use decision_config::DecisionConfig;
pub use loader::{RuleError, RuleLoader};
