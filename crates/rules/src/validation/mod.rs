//! Rule validation with structured errors and suggestions.
//!
//! Validates the BenchmarkTable and DecisionConfig kinds. Returns a
//! [`ValidationResult`] with errors (block loading) and warnings (advisory).
//! Validation runs at load time; an invalid table never reaches evaluation.

pub(crate) mod config_checks;

pub mod fuzzy;

use crate::schema::*;
use serde::{Deserialize, Serialize};

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A blocking validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// JSON-path-like location, e.g. `"spec.benchmarks[3].target"`.
    pub path: String,
    pub message: String,
    /// Optional "Did you mean …?" suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        });
    }

    pub(crate) fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: Some(suggestion.into()),
        });
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }

    /// One-line rendering of all errors, for wrapping in a `RuleError`.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| match &e.suggestion {
                Some(s) => format!("{}: {} (did you mean '{}'?)", e.path, e.message, s),
                None => format!("{}: {}", e.path, e.message),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Validate any [`RuleDocument`] variant, dispatching to the appropriate validator.
pub fn validate_document(doc: &RuleDocument) -> ValidationResult {
    match doc {
        RuleDocument::BenchmarkTable(rule) => config_checks::validate_benchmark_table(rule),
        RuleDocument::DecisionConfig(rule) => config_checks::validate_decision_config(rule),
    }
}

/// Parse raw YAML of any kind and validate. Parse errors are reported as errors.
pub fn validate_yaml(yaml: &str) -> ValidationResult {
    let parsed = serde_yaml::from_str::<RuleEnvelope>(yaml)
        .map_err(|e| format!("YAML parse error: {e}"))
        .and_then(|env| env.parse_full());
    match parsed {
        Ok(doc) => validate_document(&doc),
        Err(e) => {
            let mut result = ValidationResult::new();
            result.error("", e);
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_yaml_reports_unknown_kind() {
        let yaml = r#"
apiVersion: v1
kind: ScoringConfig
metadata:
  id: scoring
  name: Scoring
spec: {}
"#;
        let result = validate_yaml(yaml);
        assert!(!result.valid);
        assert!(result.errors[0].message.contains("unknown rule kind"));
    }

    #[test]
    fn validate_yaml_reports_parse_errors() {
        let result = validate_yaml("apiVersion: [unterminated");
        assert!(!result.valid);
        assert!(result.errors[0].message.starts_with("YAML parse error"));
    }

    #[test]
    fn summary_includes_suggestions() {
        let mut result = ValidationResult::new();
        result.error_with_suggestion("spec.benchmarks[0].key", "unknown metric 'ctrr'", "ctr");
        result.error("spec.benchmarks[1].label", "label must not be empty");
        let summary = result.summary();
        assert!(summary.contains("did you mean 'ctr'?"));
        assert!(summary.contains("label must not be empty"));
    }
}
