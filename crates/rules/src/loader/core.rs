//! Core [`RuleLoader`] struct: filesystem-backed rule loading.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::benchmark_table::BenchmarkTable;
use crate::decision_config::DecisionConfig;
use crate::schema::{RuleDocument, RuleEnvelope, RuleKind};
use crate::validation::validate_document;

use super::error::{LoadResult, LoadStatus, Result, RuleError};

/// Filesystem-backed rule loader.
///
/// Scans a directory (recursively) for `*.yml` / `*.yaml` files, deserializes
/// them into [`RuleDocument`] instances and keeps them keyed by rule ID.
/// When a directory has no enabled document of a kind, the table shipped with
/// the crate is used instead.
pub struct RuleLoader {
    /// Root directory containing rule YAML files.
    rules_dir: PathBuf,
    /// All successfully loaded documents keyed by `metadata.id`.
    documents: BTreeMap<String, RuleDocument>,
}

impl RuleLoader {
    /// Create a loader for the given directory. Nothing is read until [`load_all`](Self::load_all).
    pub fn new(rules_dir: PathBuf) -> Self {
        Self {
            rules_dir,
            documents: BTreeMap::new(),
        }
    }

    /// Recursively scan the rules directory and load all YAML files.
    ///
    /// Dotfiles and non-YAML files are skipped. Parse and validation errors
    /// are reported per-file but do not abort the scan. A missing directory
    /// yields no results.
    pub fn load_all(&mut self) -> Result<Vec<LoadResult>> {
        let mut results = Vec::new();
        let dir = self.rules_dir.clone();
        self.scan_dir_recursive(&dir, &mut results)?;
        info!(
            path = %self.rules_dir.display(),
            loaded = self.documents.len(),
            files = results.len(),
            "rules directory scanned"
        );
        Ok(results)
    }

    fn scan_dir_recursive(&mut self, dir: &Path, results: &mut Vec<LoadResult>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return Ok(());
            }
        };

        // Sorted so load order (and duplicate-id resolution) is deterministic.
        let mut paths = entries
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        paths.sort();

        for path in paths {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    if path.is_file() {
                        results.push(LoadResult {
                            path,
                            status: LoadStatus::Skipped {
                                reason: "dotfile".to_string(),
                            },
                        });
                    }
                    continue;
                }
            }

            if path.is_dir() {
                self.scan_dir_recursive(&path, results)?;
                continue;
            }

            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "yml" || e == "yaml")
                .unwrap_or(false);

            if !is_yaml {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "not a YAML file".to_string(),
                    },
                });
                continue;
            }

            let loaded = self.load_file(&path).and_then(|doc| {
                let rule_id = doc.metadata().id.clone();
                if self.documents.contains_key(&rule_id) {
                    return Err(RuleError::DuplicateId(rule_id));
                }
                Ok(doc)
            });

            match loaded {
                Ok(doc) => {
                    let rule_id = doc.metadata().id.clone();
                    info!(rule_id = %rule_id, kind = %doc.kind(), path = %path.display(), "loaded rule");
                    self.documents.insert(rule_id.clone(), doc);
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Loaded { rule_id },
                    });
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load rule file");
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Failed {
                            error: e.to_string(),
                        },
                    });
                }
            }
        }

        Ok(())
    }

    /// Parse and validate a single YAML file via two-pass deserialization.
    ///
    /// First pass reads the envelope to learn the `kind`; second pass
    /// deserializes the kind-specific type. Validation errors fail the file.
    pub fn load_file(&self, path: &Path) -> Result<RuleDocument> {
        let contents = fs::read_to_string(path)?;
        let envelope: RuleEnvelope = serde_yaml::from_str(&contents)?;

        if envelope.metadata.id.is_empty() {
            return Err(RuleError::Validation(
                "rule metadata.id must not be empty".to_string(),
            ));
        }

        let doc = envelope.parse_full().map_err(|e| {
            RuleError::Validation(format!(
                "failed to parse rule '{}': {}",
                envelope.metadata.id, e
            ))
        })?;

        let report = validate_document(&doc);
        for w in &report.warnings {
            warn!(rule_id = %envelope.metadata.id, path = %w.path, "{}", w.message);
        }
        if !report.valid {
            return Err(RuleError::Validation(format!(
                "rule '{}': {}",
                envelope.metadata.id,
                report.summary()
            )));
        }
        Ok(doc)
    }

    /// Get the rules directory path.
    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    /// All loaded documents, keyed by rule ID.
    pub fn documents(&self) -> &BTreeMap<String, RuleDocument> {
        &self.documents
    }

    fn active(&self, kind: RuleKind) -> Option<&RuleDocument> {
        let mut enabled = self
            .documents
            .values()
            .filter(|d| d.kind() == kind && d.metadata().enabled);
        let first = enabled.next();
        if let Some(extra) = enabled.next() {
            warn!(
                kind = %kind,
                using = %first.map(|d| d.metadata().id.as_str()).unwrap_or_default(),
                ignored = %extra.metadata().id,
                "multiple enabled documents of the same kind; using the first by id"
            );
        }
        first
    }

    /// Compile the active benchmark table, or the shipped one if none is loaded.
    pub fn benchmark_table(&self) -> Result<BenchmarkTable> {
        match self.active(RuleKind::BenchmarkTable).and_then(RuleDocument::as_benchmark_table) {
            Some(rule) => rule.compile(),
            None => {
                info!("no BenchmarkTable in rules directory; using the built-in table");
                Ok(BenchmarkTable::standard().clone())
            }
        }
    }

    /// Compile the active decision config, or the shipped one if none is loaded.
    pub fn decision_config(&self) -> Result<DecisionConfig> {
        match self.active(RuleKind::DecisionConfig).and_then(RuleDocument::as_decision_config) {
            Some(rule) => rule.compile(),
            None => {
                info!("no DecisionConfig in rules directory; using the built-in config");
                Ok(DecisionConfig::standard().clone())
            }
        }
    }
}
