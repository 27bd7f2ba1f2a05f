//! Multi-kind rule document container and accessors.

use super::{CommonMetadata, RuleKind};
use crate::benchmark_table::BenchmarkTableRule;
use crate::decision_config::DecisionConfigRule;

/// A fully deserialized rule of any supported kind.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleDocument {
    /// Benchmark table -- per-metric targets and comparison rules.
    BenchmarkTable(BenchmarkTableRule),
    /// Decision config -- starving/kill/scale/classification thresholds.
    DecisionConfig(DecisionConfigRule),
}

impl RuleDocument {
    /// Get the rule's metadata regardless of kind.
    pub fn metadata(&self) -> &CommonMetadata {
        match self {
            RuleDocument::BenchmarkTable(rule) => &rule.metadata,
            RuleDocument::DecisionConfig(rule) => &rule.metadata,
        }
    }

    /// Get the rule kind.
    pub fn kind(&self) -> RuleKind {
        match self {
            RuleDocument::BenchmarkTable(_) => RuleKind::BenchmarkTable,
            RuleDocument::DecisionConfig(_) => RuleKind::DecisionConfig,
        }
    }

    pub fn as_benchmark_table(&self) -> Option<&BenchmarkTableRule> {
        match self {
            RuleDocument::BenchmarkTable(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn as_decision_config(&self) -> Option<&DecisionConfigRule> {
        match self {
            RuleDocument::DecisionConfig(rule) => Some(rule),
            _ => None,
        }
    }
}
