//! Rule kind enum for two-pass deserialization dispatch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported rule kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    BenchmarkTable,
    DecisionConfig,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::BenchmarkTable => write!(f, "BenchmarkTable"),
            RuleKind::DecisionConfig => write!(f, "DecisionConfig"),
        }
    }
}

impl FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "BenchmarkTable" => Ok(RuleKind::BenchmarkTable),
            "DecisionConfig" => Ok(RuleKind::DecisionConfig),
            other => Err(format!("unknown rule kind: '{}'", other)),
        }
    }
}
