//! Typed keys for the derived metrics that benchmarks and the confidence
//! estimator can address.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A derived metric that can be benchmarked or estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    Cpc,
    Ctr,
    Cpm,
    HookRate,
    HoldRate,
    Frequency,
    Cvr,
    AtcRate,
    AtcToPurchase,
    Cpa,
    Aov,
    Roas,
}

/// Attention/delivery metrics are soft; funnel/economics metrics are hard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiTier {
    Soft,
    Hard,
}

impl MetricKey {
    pub const ALL: [MetricKey; 12] = [
        MetricKey::Cpc,
        MetricKey::Ctr,
        MetricKey::Cpm,
        MetricKey::HookRate,
        MetricKey::HoldRate,
        MetricKey::Frequency,
        MetricKey::Cvr,
        MetricKey::AtcRate,
        MetricKey::AtcToPurchase,
        MetricKey::Cpa,
        MetricKey::Aov,
        MetricKey::Roas,
    ];

    /// Canonical snake_case name, as used in rule documents.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKey::Cpc => "cpc",
            MetricKey::Ctr => "ctr",
            MetricKey::Cpm => "cpm",
            MetricKey::HookRate => "hook_rate",
            MetricKey::HoldRate => "hold_rate",
            MetricKey::Frequency => "frequency",
            MetricKey::Cvr => "cvr",
            MetricKey::AtcRate => "atc_rate",
            MetricKey::AtcToPurchase => "atc_to_purchase",
            MetricKey::Cpa => "cpa",
            MetricKey::Aov => "aov",
            MetricKey::Roas => "roas",
        }
    }

    /// Metrics that only exist for video creatives.
    pub fn is_video(self) -> bool {
        matches!(self, MetricKey::HookRate | MetricKey::HoldRate)
    }

    /// The tier a metric belongs to when a rule document does not say otherwise.
    pub fn default_tier(self) -> KpiTier {
        match self {
            MetricKey::Cpc
            | MetricKey::Ctr
            | MetricKey::Cpm
            | MetricKey::HookRate
            | MetricKey::HoldRate
            | MetricKey::Frequency => KpiTier::Soft,
            MetricKey::Cvr
            | MetricKey::AtcRate
            | MetricKey::AtcToPurchase
            | MetricKey::Cpa
            | MetricKey::Aov
            | MetricKey::Roas => KpiTier::Hard,
        }
    }

    /// Canonical snake_case names, for "did you mean" suggestions.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|k| k.as_str()).collect()
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKey {
    type Err = String;

    /// Accepts snake_case (`hook_rate`) and the dashboard's camelCase (`hookRate`).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "cpc" => Ok(MetricKey::Cpc),
            "ctr" => Ok(MetricKey::Ctr),
            "cpm" => Ok(MetricKey::Cpm),
            "hookrate" => Ok(MetricKey::HookRate),
            "holdrate" => Ok(MetricKey::HoldRate),
            "frequency" => Ok(MetricKey::Frequency),
            "cvr" => Ok(MetricKey::Cvr),
            "atcrate" => Ok(MetricKey::AtcRate),
            "atctopurchase" => Ok(MetricKey::AtcToPurchase),
            "cpa" => Ok(MetricKey::Cpa),
            "aov" => Ok(MetricKey::Aov),
            "roas" => Ok(MetricKey::Roas),
            _ => Err(format!("unknown metric key: '{}'", s)),
        }
    }
}
