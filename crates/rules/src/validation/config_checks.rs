//! Validation for the BenchmarkTable and DecisionConfig rule kinds.

use std::collections::HashSet;

use adlens_core::{KpiTier, MetricKey};

use super::fuzzy::{fuzzy_match, is_kebab_case};
use super::ValidationResult;

use crate::benchmark_table::{BenchmarkDef, BenchmarkTableRule, Comparison, TargetValue};
use crate::decision_config::DecisionConfigRule;

// ── Common metadata validation ──────────────────────────────────────

fn validate_common_metadata(
    api_version: &str,
    kind: &str,
    expected_kind: &str,
    id: &str,
    result: &mut ValidationResult,
) {
    if api_version != "v1" {
        result.error(
            "apiVersion",
            format!("apiVersion must be 'v1', got '{}'", api_version),
        );
    }
    if kind != expected_kind {
        result.error(
            "kind",
            format!("kind must be '{}', got '{}'", expected_kind, kind),
        );
    }
    if !is_kebab_case(id) {
        result.error(
            "metadata.id",
            format!(
                "id must be kebab-case (lowercase alphanumeric + hyphens), got '{}'",
                id
            ),
        );
    }
}

// ── BenchmarkTable validation ───────────────────────────────────────

pub(crate) fn validate_benchmark_table(rule: &BenchmarkTableRule) -> ValidationResult {
    let mut result = ValidationResult::new();
    validate_common_metadata(
        &rule.api_version,
        &rule.kind,
        "BenchmarkTable",
        &rule.metadata.id,
        &mut result,
    );

    if rule.spec.benchmarks.is_empty() {
        result.error("spec.benchmarks", "benchmark table must not be empty");
    }

    let mut seen = HashSet::new();
    for (i, def) in rule.spec.benchmarks.iter().enumerate() {
        let path = format!("spec.benchmarks[{}]", i);
        let Some(key) = check_key(def, &path, &mut result) else {
            continue;
        };
        if !seen.insert(key) {
            result.error(format!("{path}.key"), format!("duplicate benchmark for '{}'", key));
        }
        if def.label.trim().is_empty() {
            result.error(format!("{path}.label"), "label must not be empty");
        }
        check_dynamic(def, key, &path, &mut result);
        if !def.dynamic {
            check_target_shape(def, &path, &mut result);
        }
        check_flags(def, key, &path, &mut result);
    }
    result
}

fn check_key(def: &BenchmarkDef, path: &str, result: &mut ValidationResult) -> Option<MetricKey> {
    match def.key.parse::<MetricKey>() {
        Ok(key) => Some(key),
        Err(msg) => {
            let names = MetricKey::names();
            match fuzzy_match(&def.key, &names) {
                Some(s) => result.error_with_suggestion(format!("{path}.key"), msg, s),
                None => result.error(format!("{path}.key"), msg),
            }
            None
        }
    }
}

/// `dynamic` and `key == cpa` always occur together; the target is derived.
fn check_dynamic(def: &BenchmarkDef, key: MetricKey, path: &str, result: &mut ValidationResult) {
    if def.dynamic && key != MetricKey::Cpa {
        result.error(
            format!("{path}.dynamic"),
            format!("only cpa may be dynamic, '{}' has dynamic: true", key),
        );
    }
    if key == MetricKey::Cpa && !def.dynamic {
        result.error(
            format!("{path}.dynamic"),
            "cpa target is derived from the front-end price; set dynamic: true and omit target",
        );
    }
    if def.dynamic && def.target.is_some() {
        result.error(
            format!("{path}.target"),
            "a dynamic benchmark must not configure a target",
        );
    }
    if def.dynamic && def.comparison == Comparison::Between {
        result.error(
            format!("{path}.comparison"),
            "a dynamic benchmark needs less_than or greater_than",
        );
    }
}

fn check_target_shape(def: &BenchmarkDef, path: &str, result: &mut ValidationResult) {
    let target_path = format!("{path}.target");
    match (def.comparison, def.target) {
        (_, None) => result.error(target_path, "target is required unless dynamic: true"),
        (Comparison::LessThan | Comparison::GreaterThan, Some(TargetValue::Scalar(t))) => {
            if !t.is_finite() {
                result.error(target_path, "target must be a finite number");
            } else if t < 0.0 {
                result.warn(target_path, format!("negative target {} can never be met", t));
            }
        }
        (Comparison::Between, Some(TargetValue::Range([low, high]))) => {
            if !low.is_finite() || !high.is_finite() {
                result.error(target_path, "band bounds must be finite numbers");
            } else if low > high {
                result.error(
                    target_path,
                    format!("band low {} is greater than high {}", low, high),
                );
            }
        }
        (Comparison::Between, Some(TargetValue::Scalar(_))) => {
            result.error(target_path, "between needs a [low, high] target")
        }
        (_, Some(TargetValue::Range(_))) => {
            result.error(target_path, "less_than/greater_than need a scalar target")
        }
    }
}

fn check_flags(def: &BenchmarkDef, key: MetricKey, path: &str, result: &mut ValidationResult) {
    if def.lower_is_better.is_some() && def.comparison != Comparison::Between {
        result.warn(
            format!("{path}.lower_is_better"),
            "lower_is_better only affects between comparisons and is ignored here",
        );
    }
    if def.video_only && !key.is_video() {
        result.warn(
            format!("{path}.video_only"),
            format!("'{}' is not a video metric; video_only skips it for every non-video ad", key),
        );
    }
    if key.is_video() && !def.video_only {
        result.warn(
            format!("{path}.video_only"),
            format!("'{}' is only defined for video; consider video_only: true", key),
        );
    }
    if let Some(tier) = def.tier {
        if tier != key.default_tier() {
            let name = match tier {
                KpiTier::Soft => "soft",
                KpiTier::Hard => "hard",
            };
            result.warn(
                format!("{path}.tier"),
                format!("'{}' is usually not a {} KPI", key, name),
            );
        }
    }
}

// ── DecisionConfig validation ───────────────────────────────────────

pub(crate) fn validate_decision_config(rule: &DecisionConfigRule) -> ValidationResult {
    let mut result = ValidationResult::new();
    validate_common_metadata(
        &rule.api_version,
        &rule.kind,
        "DecisionConfig",
        &rule.metadata.id,
        &mut result,
    );
    let spec = &rule.spec;

    let s = &spec.starving;
    if !(s.parent_share > 0.0 && s.parent_share < 1.0) {
        result.error(
            "spec.starving.parent_share",
            format!("parent_share must be in (0, 1), got {}", s.parent_share),
        );
    }
    non_negative(s.min_spend, "spec.starving.min_spend", &mut result);
    non_negative(s.min_impressions, "spec.starving.min_impressions", &mut result);

    let k = &spec.kill;
    positive(k.zero_purchase_spend_multiple, "spec.kill.zero_purchase_spend_multiple", &mut result);
    positive(
        k.zero_purchase_traffic_spend_multiple,
        "spec.kill.zero_purchase_traffic_spend_multiple",
        &mut result,
    );
    if k.zero_purchase_traffic_spend_multiple > k.zero_purchase_spend_multiple {
        result.warn(
            "spec.kill.zero_purchase_traffic_spend_multiple",
            "traffic-gated multiple exceeds the unconditional multiple; the traffic rule can never fire",
        );
    }
    non_negative(k.zero_purchase_min_link_clicks, "spec.kill.zero_purchase_min_link_clicks", &mut result);
    if k.low_volume_max_purchases == 0 {
        result.error("spec.kill.low_volume_max_purchases", "must be at least 1");
    }
    positive(k.low_volume_cpa_multiple, "spec.kill.low_volume_cpa_multiple", &mut result);
    if k.unprofitable_min_purchases <= k.low_volume_max_purchases {
        result.warn(
            "spec.kill.unprofitable_min_purchases",
            "overlaps the low-volume band; the low-volume rule is checked first",
        );
    }
    positive(k.unprofitable_max_roas, "spec.kill.unprofitable_max_roas", &mut result);

    let sc = &spec.scale;
    if sc.min_purchases == 0 {
        result.error("spec.scale.min_purchases", "scale needs at least one purchase");
    }
    positive(sc.min_roas, "spec.scale.min_roas", &mut result);
    positive(sc.max_cpa_multiple, "spec.scale.max_cpa_multiple", &mut result);
    if sc.min_roas < k.unprofitable_max_roas {
        result.warn(
            "spec.scale.min_roas",
            "scale ROAS floor is below the unprofitable kill ceiling",
        );
    }
    if sc.max_cpa_multiple > k.low_volume_cpa_multiple {
        result.warn(
            "spec.scale.max_cpa_multiple",
            "scale CPA ceiling exceeds the low-volume kill multiple",
        );
    }

    let c = &spec.classification;
    non_negative(c.winner_min_spend, "spec.classification.winner_min_spend", &mut result);
    non_negative(c.trending_min_spend, "spec.classification.trending_min_spend", &mut result);
    if c.trending_min_spend >= c.winner_min_spend {
        result.error(
            "spec.classification.trending_min_spend",
            format!(
                "trending floor {} must be below winner floor {}",
                c.trending_min_spend, c.winner_min_spend
            ),
        );
    }
    if c.winner_min_confident_passes == 0 || c.trending_min_passes == 0 {
        result.warn(
            "spec.classification",
            "a pass count of 0 tags entities with no passing KPIs",
        );
    }

    result
}

fn positive(value: f64, path: &str, result: &mut ValidationResult) {
    if !(value.is_finite() && value > 0.0) {
        result.error(path, format!("must be a positive number, got {}", value));
    }
}

fn non_negative(value: f64, path: &str, result: &mut ValidationResult) {
    if !(value.is_finite() && value >= 0.0) {
        result.error(path, format!("must be a non-negative number, got {}", value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(benchmarks: &str) -> BenchmarkTableRule {
        let yaml = format!(
            "apiVersion: v1\nkind: BenchmarkTable\nmetadata:\n  id: test-table\n  name: Test\nspec:\n  benchmarks:\n{}",
            benchmarks
        );
        serde_yaml::from_str(&yaml).unwrap()
    }

    #[test]
    fn standard_table_is_clean() {
        let rule: BenchmarkTableRule = serde_yaml::from_str(include_str!(
            "../../../../data/rules/benchmarks/benchmark-table.yml"
        ))
        .unwrap();
        let result = validate_benchmark_table(&rule);
        assert!(result.valid, "{:?}", result.errors);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn unknown_key_gets_suggestion() {
        let rule = table(
            "    - key: hold_rat\n      label: Hold\n      comparison: greater_than\n      target: 40\n      format: percent\n",
        );
        let result = validate_benchmark_table(&rule);
        assert!(!result.valid);
        assert_eq!(result.errors[0].path, "spec.benchmarks[0].key");
        assert_eq!(result.errors[0].suggestion.as_deref(), Some("hold_rate"));
    }

    #[test]
    fn dynamic_only_on_cpa() {
        let rule = table(
            "    - key: cpc\n      label: CPC\n      comparison: less_than\n      format: currency\n      dynamic: true\n",
        );
        let result = validate_benchmark_table(&rule);
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.message.contains("only cpa may be dynamic")));
    }

    #[test]
    fn dynamic_with_target_rejected() {
        let rule = table(
            "    - key: cpa\n      label: CPA\n      comparison: less_than\n      target: 40\n      format: currency\n      dynamic: true\n",
        );
        let result = validate_benchmark_table(&rule);
        assert!(result.errors.iter().any(|e| e.path == "spec.benchmarks[0].target"));
    }

    #[test]
    fn target_shape_must_match_comparison() {
        let rule = table(
            "    - key: cpm\n      label: CPM\n      comparison: between\n      target: 20\n      format: currency\n    - key: ctr\n      label: CTR\n      comparison: greater_than\n      target: [1, 2]\n      format: percent\n",
        );
        let result = validate_benchmark_table(&rule);
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn inverted_band_rejected() {
        let rule = table(
            "    - key: frequency\n      label: Freq\n      comparison: between\n      target: [3, 1]\n      format: count\n",
        );
        let result = validate_benchmark_table(&rule);
        assert!(result.errors[0].message.contains("greater than high"));
    }

    #[test]
    fn duplicate_keys_rejected() {
        let entry = "    - key: ctr\n      label: CTR\n      comparison: greater_than\n      target: 1\n      format: percent\n";
        let rule = table(&format!("{entry}{entry}"));
        let result = validate_benchmark_table(&rule);
        assert!(result.errors.iter().any(|e| e.message.contains("duplicate")));
    }

    #[test]
    fn advisory_flags_warn_only() {
        let rule = table(
            "    - key: hook_rate\n      label: Hook\n      tier: hard\n      comparison: greater_than\n      target: 30\n      format: percent\n      lower_is_better: true\n",
        );
        let result = validate_benchmark_table(&rule);
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 3);
    }

    #[test]
    fn standard_decision_config_is_clean() {
        let rule: DecisionConfigRule = serde_yaml::from_str(include_str!(
            "../../../../data/rules/decisions/decision-config.yml"
        ))
        .unwrap();
        let result = validate_decision_config(&rule);
        assert!(result.valid, "{:?}", result.errors);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn trending_floor_must_stay_below_winner_floor() {
        let mut rule: DecisionConfigRule = serde_yaml::from_str(include_str!(
            "../../../../data/rules/decisions/decision-config.yml"
        ))
        .unwrap();
        rule.spec.classification.trending_min_spend = 500.0;
        let result = validate_decision_config(&rule);
        assert!(!result.valid);
        assert_eq!(result.errors[0].path, "spec.classification.trending_min_spend");
    }

    #[test]
    fn bad_metadata_reported() {
        let mut rule: DecisionConfigRule = serde_yaml::from_str(include_str!(
            "../../../../data/rules/decisions/decision-config.yml"
        ))
        .unwrap();
        rule.api_version = "v2".to_string();
        rule.metadata.id = "Not Kebab".to_string();
        let result = validate_decision_config(&rule);
        let paths: Vec<&str> = result.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["apiVersion", "metadata.id"]);
    }
}
