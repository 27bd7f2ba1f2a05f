//! Benchmark evaluation: score each derived metric against its configured
//! target, at the point estimate and at the confidence-interval bounds.

use adlens_rules::{BandPreference, Benchmark, BenchmarkTable, Threshold};
use serde::Serialize;

use crate::confidence::{ConfidenceInterval, MetricProbe};
use crate::metrics::DerivedMetrics;

/// One benchmark joined with its evaluated value and interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiResult {
    pub benchmark: Benchmark,
    pub value: f64,
    /// The benchmark's target after price substitution.
    pub threshold: Threshold,
    pub interval: ConfidenceInterval,
    pub passing: bool,
    pub confidently_passing: bool,
    pub confidently_failing: bool,
}

impl KpiResult {
    pub fn is_hard(&self) -> bool {
        self.benchmark.is_hard()
    }

    pub fn label(&self) -> &str {
        &self.benchmark.label
    }

    /// `"CTR 0.85% (target > 1.00%)"`, used in reasoning lines.
    pub fn describe(&self) -> String {
        let format = self.benchmark.format;
        format!(
            "{} {} (target {})",
            self.benchmark.label,
            format.render(self.value),
            self.threshold.describe(format)
        )
    }
}

/// Pass/fail verdicts for one value and interval against one threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub passing: bool,
    pub confidently_passing: bool,
    pub confidently_failing: bool,
}

/// Apply a threshold's comparison to a value and its interval bounds.
///
/// Intervals without a usable confidence level never produce a confident verdict.
pub fn judge(threshold: &Threshold, value: f64, ci: &ConfidenceInterval) -> Verdict {
    let (lower, upper) = (ci.lower, ci.upper);
    let (passing, confidently_passing, confidently_failing) = match *threshold {
        Threshold::LessThan { target } => (value < target, upper < target, lower > target),
        Threshold::GreaterThan { target } => (value > target, lower > target, upper < target),
        Threshold::Between { low, high, band } => match band {
            BandPreference::LowerIsBetter => (value <= high, upper <= high, lower > high),
            BandPreference::HigherIsBetter => (value >= low, lower >= low, upper < low),
            BandPreference::Strict => (
                value >= low && value <= high,
                lower >= low && upper <= high,
                upper < low || lower > high,
            ),
        },
    };

    let informative = ci.level.is_informative();
    Verdict {
        passing,
        confidently_passing: informative && confidently_passing,
        confidently_failing: informative && confidently_failing,
    }
}

/// Evaluate every applicable benchmark, in table order.
///
/// Video-only benchmarks are skipped when the creative has no hook rate, and
/// any benchmark whose metric has no value for this entity is skipped too.
/// Price-relative benchmarks are skipped when `front_end_price` is not a
/// positive finite number.
pub fn evaluate_benchmarks(
    table: &BenchmarkTable,
    metrics: &DerivedMetrics,
    front_end_price: f64,
) -> Vec<KpiResult> {
    let priced = front_end_price.is_finite() && front_end_price > 0.0;
    table
        .iter()
        .filter(|b| !b.video_only || metrics.is_video())
        .filter(|b| priced || !b.is_dynamic())
        .filter_map(|b| {
            let value = b.key.derive(metrics)?;
            let threshold = b.resolve(front_end_price);
            let interval = b.key.estimate(metrics);
            let verdict = judge(&threshold, value, &interval);
            Some(KpiResult {
                benchmark: b.clone(),
                value,
                threshold,
                interval,
                passing: verdict.passing,
                confidently_passing: verdict.confidently_passing,
                confidently_failing: verdict.confidently_failing,
            })
        })
        .collect()
}

/// Counts over a KPI list, shared by the recommendation and classification passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KpiTally {
    pub passing: usize,
    pub confidently_passing: usize,
    pub confidently_failing: usize,
    pub hard_confidently_failing: usize,
    pub tentative: usize,
}

impl KpiTally {
    pub fn of(kpis: &[KpiResult]) -> Self {
        kpis.iter().fold(Self::default(), |mut t, k| {
            t.passing += k.passing as usize;
            t.confidently_passing += k.confidently_passing as usize;
            t.confidently_failing += k.confidently_failing as usize;
            t.hard_confidently_failing += (k.confidently_failing && k.is_hard()) as usize;
            t.tentative += k.interval.level.is_tentative() as usize;
            t
        })
    }
}
