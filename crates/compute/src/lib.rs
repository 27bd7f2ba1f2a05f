//! Evaluation engine for ad entities: metric derivation, confidence
//! estimation, benchmark scoring, and the kill/scale/watch/starving decision.

pub mod benchmark;
pub mod classification;
pub mod confidence;
pub mod engine;
pub mod metrics;
pub mod recommendation;

pub use benchmark::{evaluate_benchmarks, judge, KpiResult, KpiTally, Verdict};
pub use classification::{classify, Classification, ClassificationTag};
pub use confidence::{
    estimate, estimate_named, monetary_interval, wilson_interval, ConfidenceInterval,
    ConfidenceLevel, MetricProbe, Sample,
};
pub use engine::{BatchSummary, EntityEvaluation, EntityInput, EvaluationEngine};
pub use metrics::{derive_metrics, DerivedMetrics, EventNames};
pub use recommendation::{recommend, Action, EvaluationContext, Recommendation};
