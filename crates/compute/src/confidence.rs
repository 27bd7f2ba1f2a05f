//! Confidence estimation for derived metrics.
//!
//! Rates use the Wilson score interval over a (successes, trials) pair.
//! Costs and other per-unit ratios use a central-limit interval over a
//! (total, count) pair. Both report a coarse [`ConfidenceLevel`] that the
//! benchmark evaluator uses to decide whether a KPI verdict is trustworthy.

use adlens_core::MetricKey;
use serde::{Deserialize, Serialize};

use crate::metrics::DerivedMetrics;

/// Two-sided 95% normal quantile.
pub const Z_95: f64 = 1.96;

/// Trials below which a proportion is too thin to grade.
const MIN_PROPORTION_TRIALS: f64 = 100.0;

/// Qualitative confidence bucket, ordered from least to most trustworthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    None,
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// `false` for [`ConfidenceLevel::None`]; such intervals must not drive a verdict.
    pub fn is_informative(self) -> bool {
        self != ConfidenceLevel::None
    }

    /// Low or medium: some signal, but still early.
    pub fn is_tentative(self) -> bool {
        matches!(self, ConfidenceLevel::Low | ConfidenceLevel::Medium)
    }
}

/// Interval in the same units as the metric (percent for rates).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    pub center: f64,
    pub level: ConfidenceLevel,
}

impl ConfidenceInterval {
    /// The zero interval returned whenever there is nothing to estimate.
    pub fn degenerate() -> Self {
        Self {
            lower: 0.0,
            upper: 0.0,
            center: 0.0,
            level: ConfidenceLevel::None,
        }
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

impl Default for ConfidenceInterval {
    fn default() -> Self {
        Self::degenerate()
    }
}

/// The sample behind a metric, as the estimator sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Proportion { successes: f64, trials: f64 },
    Monetary { total: f64, count: f64 },
}

impl Sample {
    pub fn interval(self) -> ConfidenceInterval {
        match self {
            Sample::Proportion { successes, trials } => wilson_interval(successes, trials),
            Sample::Monetary { total, count } => monetary_interval(total, count),
        }
    }
}

/// Wilson score interval, scaled to percent.
///
/// Successes above trials clamp to a proportion of one. Zero trials give the
/// degenerate interval.
pub fn wilson_interval(successes: f64, trials: f64) -> ConfidenceInterval {
    if !(trials > 0.0) || !successes.is_finite() || !trials.is_finite() {
        return ConfidenceInterval::degenerate();
    }
    let n = trials;
    let p = (successes / n).clamp(0.0, 1.0);
    let z2 = Z_95 * Z_95;
    let denom = 1.0 + z2 / n;

    let center = (p + z2 / (2.0 * n)) / denom;
    let margin = Z_95 * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / denom;
    let lower = (center - margin).clamp(0.0, 1.0) * 100.0;
    let upper = (center + margin).clamp(0.0, 1.0) * 100.0;
    let center = center.clamp(0.0, 1.0) * 100.0;

    let level = if n < MIN_PROPORTION_TRIALS || center == 0.0 {
        ConfidenceLevel::None
    } else {
        let relative = (upper - lower) / center;
        if relative > 1.0 {
            ConfidenceLevel::Low
        } else if relative > 0.5 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::High
        }
    };

    ConfidenceInterval {
        lower,
        upper,
        center,
        level,
    }
}

/// Central-limit interval for a per-unit mean, `total / count`.
///
/// The standard error is approximated as `mean / sqrt(count)`; the lower
/// bound is floored at zero.
pub fn monetary_interval(total: f64, count: f64) -> ConfidenceInterval {
    if !(count > 0.0) || !total.is_finite() || !count.is_finite() {
        return ConfidenceInterval::degenerate();
    }
    let mean = (total / count).max(0.0);
    let se = mean / count.sqrt();
    let level = if count < 10.0 {
        ConfidenceLevel::None
    } else if count < 30.0 {
        ConfidenceLevel::Low
    } else if count < 100.0 {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::High
    };

    ConfidenceInterval {
        lower: (mean - Z_95 * se).max(0.0),
        upper: mean + Z_95 * se,
        center: mean,
        level,
    }
}

/// What every benchmarkable metric can do: read its value and bound it.
pub trait MetricProbe {
    /// The point value, or `None` when the metric does not apply (video rates
    /// on a non-video creative).
    fn derive(&self, metrics: &DerivedMetrics) -> Option<f64>;

    /// The sample behind the value, or `None` when no estimator applies.
    fn sample(&self, metrics: &DerivedMetrics) -> Option<Sample>;

    fn estimate(&self, metrics: &DerivedMetrics) -> ConfidenceInterval {
        self.sample(metrics)
            .map(Sample::interval)
            .unwrap_or_else(ConfidenceInterval::degenerate)
    }
}

impl MetricProbe for MetricKey {
    fn derive(&self, m: &DerivedMetrics) -> Option<f64> {
        match self {
            MetricKey::Cpc => Some(m.cpc),
            MetricKey::Ctr => Some(m.ctr),
            MetricKey::Cpm => Some(m.cpm),
            MetricKey::HookRate => m.hook_rate,
            MetricKey::HoldRate => m.hold_rate,
            MetricKey::Frequency => Some(m.frequency),
            MetricKey::Cvr => Some(m.cvr),
            MetricKey::AtcRate => Some(m.atc_rate),
            MetricKey::AtcToPurchase => Some(m.atc_to_purchase),
            MetricKey::Cpa => Some(m.cpa),
            MetricKey::Aov => Some(m.aov),
            MetricKey::Roas => Some(m.roas),
        }
    }

    fn sample(&self, m: &DerivedMetrics) -> Option<Sample> {
        let proportion = |successes, trials| Some(Sample::Proportion { successes, trials });
        let monetary = |total, count| Some(Sample::Monetary { total, count });
        match self {
            MetricKey::Ctr => proportion(m.link_clicks, m.impressions),
            MetricKey::Cvr => proportion(m.purchases, m.link_clicks),
            MetricKey::AtcRate => proportion(m.add_to_cart, m.link_clicks),
            MetricKey::AtcToPurchase => proportion(m.purchases, m.add_to_cart),
            MetricKey::HookRate => proportion(m.video_3s_views, m.impressions),
            MetricKey::HoldRate => proportion(m.video_p50_views, m.video_3s_views),
            MetricKey::Cpc => monetary(m.spend, m.link_clicks),
            MetricKey::Cpa => monetary(m.spend, m.purchases),
            MetricKey::Aov => monetary(m.purchase_value, m.purchases),
            MetricKey::Cpm => monetary(m.spend * 1000.0, m.impressions),
            // Approximation: impressions per reached person treated as a per-unit mean.
            MetricKey::Frequency => monetary(m.impressions, m.reach),
            MetricKey::Roas => None,
        }
    }
}

/// Interval for a typed metric key.
pub fn estimate(key: MetricKey, metrics: &DerivedMetrics) -> ConfidenceInterval {
    key.estimate(metrics)
}

/// Interval for a metric named by string; unknown names give the degenerate interval.
pub fn estimate_named(name: &str, metrics: &DerivedMetrics) -> ConfidenceInterval {
    name.parse::<MetricKey>()
        .map(|key| key.estimate(metrics))
        .unwrap_or_else(|_| ConfidenceInterval::degenerate())
}

/// Point value a probe reports when it applies, `0` otherwise.
pub fn point_value(key: MetricKey, metrics: &DerivedMetrics) -> f64 {
    key.derive(metrics).unwrap_or(0.0)
}
