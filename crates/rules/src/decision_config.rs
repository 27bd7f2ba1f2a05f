//! DecisionConfig rule kind: the business tuning behind the recommendation
//! engine: starving floors, kill multiples, scale gates, and the spend floors
//! for winner/trending classification.
//!
//! Every multiple is relative to the target CPA, which equals the front-end
//! offer price at evaluation time.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::loader::{Result, RuleError};
use crate::schema::CommonMetadata;
use crate::validation::config_checks::validate_decision_config;

const STANDARD_YAML: &str = include_str!("../../../data/rules/decisions/decision-config.yml");

static STANDARD: LazyLock<DecisionConfig> = LazyLock::new(|| {
    DecisionConfig::from_yaml(STANDARD_YAML).expect("embedded decision config must compile")
});

// ── YAML-level types ────────────────────────────────────────────────

/// Top-level DecisionConfig rule document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DecisionConfigRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    pub spec: DecisionConfigSpec,
}

/// Specification section of a DecisionConfig rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DecisionConfigSpec {
    pub starving: StarvingThresholds,
    pub kill: KillThresholds,
    pub scale: ScaleThresholds,
    pub classification: ClassificationThresholds,
}

/// When an entity has had too little delivery to judge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StarvingThresholds {
    /// Share of parent-scope spend below which a child is starving.
    pub parent_share: f64,
    /// Absolute spend floor, used when no parent spend is known.
    pub min_spend: f64,
    /// Absolute impression floor, used when no parent spend is known.
    pub min_impressions: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct KillThresholds {
    /// Zero purchases at this spend multiple kills regardless of traffic.
    pub zero_purchase_spend_multiple: f64,
    /// Zero purchases at this spend multiple kills once traffic was sufficient.
    pub zero_purchase_traffic_spend_multiple: f64,
    /// Link clicks that count as sufficient traffic.
    pub zero_purchase_min_link_clicks: f64,
    /// Upper bound of the low-volume band (lower bound is one purchase).
    pub low_volume_max_purchases: u32,
    /// CPA above this multiple of target kills a low-volume entity.
    pub low_volume_cpa_multiple: f64,
    /// Purchases needed before ROAS alone can kill.
    pub unprofitable_min_purchases: u32,
    /// ROAS below this kills once `unprofitable_min_purchases` is reached.
    pub unprofitable_max_roas: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScaleThresholds {
    pub min_purchases: u32,
    pub min_roas: f64,
    /// CPA must be at or below this multiple of target.
    pub max_cpa_multiple: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ClassificationThresholds {
    pub winner_min_confident_passes: u32,
    /// Spend must exceed this for a KPI-based winner.
    pub winner_min_spend: f64,
    pub trending_min_passes: u32,
    /// Spend must exceed this for trending; smaller than the winner floor.
    pub trending_min_spend: f64,
}

// ── Compiled type ───────────────────────────────────────────────────

/// Pre-compiled decision config (the `spec` section is already typed).
pub type DecisionConfig = DecisionConfigSpec;

impl DecisionConfigSpec {
    /// Thresholds shipped in `data/rules/decisions/decision-config.yml`,
    /// compiled once per process.
    pub fn standard() -> &'static DecisionConfig {
        &STANDARD
    }

    /// Parse, validate and compile a DecisionConfig document.
    pub fn from_yaml(yaml: &str) -> Result<DecisionConfig> {
        let rule: DecisionConfigRule = serde_yaml::from_str(yaml)?;
        rule.compile()
    }
}

impl DecisionConfigRule {
    /// Validate and compile the YAML config.
    pub fn compile(&self) -> Result<DecisionConfig> {
        let report = validate_decision_config(self);
        if !report.valid {
            return Err(RuleError::Validation(format!(
                "decision config '{}': {}",
                self.metadata.id,
                report.summary()
            )));
        }
        Ok(self.spec.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_standard_decision_config() {
        let rule: DecisionConfigRule = serde_yaml::from_str(STANDARD_YAML).unwrap();
        assert_eq!(rule.kind, "DecisionConfig");
        assert_eq!(rule.spec.starving.parent_share, 0.02);
        assert_eq!(rule.spec.kill.zero_purchase_spend_multiple, 3.0);
        assert_eq!(rule.spec.kill.low_volume_max_purchases, 4);
        assert_eq!(rule.spec.scale.max_cpa_multiple, 1.5);
    }

    #[test]
    fn standard_is_compiled_once() {
        let a = DecisionConfig::standard() as *const _;
        let b = DecisionConfig::standard() as *const _;
        assert_eq!(a, b);
    }

    #[test]
    fn kill_bands_do_not_overlap() {
        let cfg = DecisionConfig::standard();
        assert!(cfg.kill.low_volume_max_purchases < cfg.kill.unprofitable_min_purchases);
        assert!(
            cfg.kill.zero_purchase_traffic_spend_multiple <= cfg.kill.zero_purchase_spend_multiple
        );
    }

    #[test]
    fn trending_floor_below_winner_floor() {
        let cfg = DecisionConfig::standard();
        assert!(cfg.classification.trending_min_spend < cfg.classification.winner_min_spend);
    }

    #[test]
    fn invalid_share_is_rejected() {
        let yaml = STANDARD_YAML.replace("parent_share: 0.02", "parent_share: 1.5");
        let err = DecisionConfig::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("parent_share"));
    }

    #[test]
    fn round_trip() {
        let rule: DecisionConfigRule = serde_yaml::from_str(STANDARD_YAML).unwrap();
        let serialized = serde_yaml::to_string(&rule).unwrap();
        let rule2: DecisionConfigRule = serde_yaml::from_str(&serialized).unwrap();
        assert_eq!(rule, rule2);
    }
}
