//! BenchmarkTable rule kind: per-metric targets, comparison rules, value
//! formats, and the soft/hard KPI split.
//!
//! The YAML form is stringly keyed so validation can suggest corrections for
//! misspelled metrics. Compilation turns it into a [`BenchmarkTable`] of typed
//! [`Benchmark`]s, which is what the evaluator consumes.

use std::sync::LazyLock;

use adlens_core::{KpiTier, MetricKey};
use serde::{Deserialize, Serialize};

use crate::loader::{Result, RuleError};
use crate::schema::CommonMetadata;
use crate::validation::config_checks::validate_benchmark_table;

const STANDARD_YAML: &str = include_str!("../../../data/rules/benchmarks/benchmark-table.yml");

static STANDARD: LazyLock<BenchmarkTable> = LazyLock::new(|| {
    BenchmarkTable::from_yaml(STANDARD_YAML).expect("embedded benchmark table must compile")
});

// ── YAML-level types ────────────────────────────────────────────────

/// Top-level BenchmarkTable rule document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BenchmarkTableRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    pub spec: BenchmarkTableSpec,
}

/// Specification section of a BenchmarkTable rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BenchmarkTableSpec {
    /// Benchmarks in reporting order.
    pub benchmarks: Vec<BenchmarkDef>,
}

/// One benchmark entry as written in YAML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BenchmarkDef {
    pub key: String,
    pub label: String,
    /// Defaults to the metric's natural tier.
    #[serde(default)]
    pub tier: Option<KpiTier>,
    pub comparison: Comparison,
    /// Scalar for less_than/greater_than, `[low, high]` for between.
    /// Must be absent when `dynamic` is set.
    #[serde(default)]
    pub target: Option<TargetValue>,
    pub format: ValueFormat,
    #[serde(default)]
    pub video_only: bool,
    #[serde(default)]
    pub dynamic: bool,
    /// Tie-break direction inside a `between` band; absent means strict range.
    #[serde(default)]
    pub lower_is_better: Option<bool>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TargetValue {
    Scalar(f64),
    Range([f64; 2]),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    LessThan,
    GreaterThan,
    Between,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    Currency,
    Percent,
    Count,
}

impl ValueFormat {
    /// Render a value for reasoning strings and detail panels.
    pub fn render(self, value: f64) -> String {
        match self {
            ValueFormat::Currency => format!("${:.2}", value),
            ValueFormat::Percent => format!("{:.2}%", value),
            ValueFormat::Count => format!("{:.2}", value),
        }
    }
}

// ── Compiled (hot-path) types ───────────────────────────────────────

/// Where a comparison target comes from.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Fixed(f64),
    /// Target CPA = one unit of the front-end offer price.
    FrontEndPrice,
}

/// How a value inside a `between` band is judged.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BandPreference {
    /// Staying under the band is fine (cost metrics).
    LowerIsBetter,
    /// Exceeding the band is fine (rate metrics).
    HigherIsBetter,
    /// Must sit inside the band.
    Strict,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(tag = "comparison", rename_all = "snake_case")]
pub enum TargetRule {
    LessThan { target: Target },
    GreaterThan { target: Target },
    Between { low: f64, high: f64, band: BandPreference },
}

/// A [`TargetRule`] with its target resolved against the price context.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(tag = "comparison", rename_all = "snake_case")]
pub enum Threshold {
    LessThan { target: f64 },
    GreaterThan { target: f64 },
    Between { low: f64, high: f64, band: BandPreference },
}

impl Threshold {
    /// Human-readable target, e.g. `< $1.50` or `$10.00-$30.00`.
    pub fn describe(&self, format: ValueFormat) -> String {
        match *self {
            Threshold::LessThan { target } => format!("< {}", format.render(target)),
            Threshold::GreaterThan { target } => format!("> {}", format.render(target)),
            Threshold::Between { low, high, band } => {
                let range = format!("{}-{}", format.render(low), format.render(high));
                match band {
                    BandPreference::LowerIsBetter => format!("<= {} (band {})", format.render(high), range),
                    BandPreference::HigherIsBetter => format!(">= {} (band {})", format.render(low), range),
                    BandPreference::Strict => range,
                }
            }
        }
    }
}

/// A compiled benchmark: one typed metric, its target rule and display data.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Benchmark {
    pub key: MetricKey,
    pub label: String,
    pub tier: KpiTier,
    pub rule: TargetRule,
    pub format: ValueFormat,
    pub video_only: bool,
}

impl Benchmark {
    /// Dynamic benchmarks take their target from the price context.
    pub fn is_dynamic(&self) -> bool {
        matches!(
            self.rule,
            TargetRule::LessThan { target: Target::FrontEndPrice }
                | TargetRule::GreaterThan { target: Target::FrontEndPrice }
        )
    }

    pub fn is_hard(&self) -> bool {
        self.tier == KpiTier::Hard
    }

    /// Substitute the front-end price into dynamic targets.
    pub fn resolve(&self, front_end_price: f64) -> Threshold {
        let pick = |t: Target| match t {
            Target::Fixed(v) => v,
            Target::FrontEndPrice => front_end_price,
        };
        match self.rule {
            TargetRule::LessThan { target } => Threshold::LessThan { target: pick(target) },
            TargetRule::GreaterThan { target } => Threshold::GreaterThan { target: pick(target) },
            TargetRule::Between { low, high, band } => Threshold::Between { low, high, band },
        }
    }
}

/// Compiled, immutable benchmark table. Declaration order is preserved.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BenchmarkTable {
    pub id: String,
    benchmarks: Vec<Benchmark>,
}

impl BenchmarkTable {
    /// The table shipped in `data/rules/benchmarks/benchmark-table.yml`,
    /// compiled once per process.
    pub fn standard() -> &'static BenchmarkTable {
        &STANDARD
    }

    /// Parse, validate and compile a BenchmarkTable document.
    pub fn from_yaml(yaml: &str) -> Result<BenchmarkTable> {
        let rule: BenchmarkTableRule = serde_yaml::from_str(yaml)?;
        rule.compile()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Benchmark> {
        self.benchmarks.iter()
    }

    pub fn get(&self, key: MetricKey) -> Option<&Benchmark> {
        self.benchmarks.iter().find(|b| b.key == key)
    }

    pub fn len(&self) -> usize {
        self.benchmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }
}

impl BenchmarkTableRule {
    /// Validate and compile into a [`BenchmarkTable`].
    ///
    /// A misconfigured table is a programmer error; it is reported here, at
    /// load time, and never during evaluation.
    pub fn compile(&self) -> Result<BenchmarkTable> {
        let report = validate_benchmark_table(self);
        if !report.valid {
            return Err(RuleError::Validation(format!(
                "benchmark table '{}': {}",
                self.metadata.id,
                report.summary()
            )));
        }
        let benchmarks = self
            .spec
            .benchmarks
            .iter()
            .map(BenchmarkDef::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(BenchmarkTable {
            id: self.metadata.id.clone(),
            benchmarks,
        })
    }
}

impl BenchmarkDef {
    fn compile(&self) -> Result<Benchmark> {
        let key: MetricKey = self.key.parse().map_err(RuleError::Validation)?;
        let rule = match (self.comparison, self.dynamic, self.target) {
            (Comparison::LessThan, true, None) => TargetRule::LessThan {
                target: Target::FrontEndPrice,
            },
            (Comparison::GreaterThan, true, None) => TargetRule::GreaterThan {
                target: Target::FrontEndPrice,
            },
            (Comparison::LessThan, false, Some(TargetValue::Scalar(t))) => TargetRule::LessThan {
                target: Target::Fixed(t),
            },
            (Comparison::GreaterThan, false, Some(TargetValue::Scalar(t))) => {
                TargetRule::GreaterThan {
                    target: Target::Fixed(t),
                }
            }
            (Comparison::Between, false, Some(TargetValue::Range([low, high]))) => {
                let band = match self.lower_is_better {
                    Some(true) => BandPreference::LowerIsBetter,
                    Some(false) => BandPreference::HigherIsBetter,
                    None => BandPreference::Strict,
                };
                TargetRule::Between { low, high, band }
            }
            _ => {
                return Err(RuleError::Validation(format!(
                    "benchmark '{}': target does not match comparison {:?} (dynamic: {})",
                    self.key, self.comparison, self.dynamic
                )))
            }
        };
        Ok(Benchmark {
            key,
            label: self.label.clone(),
            tier: self.tier.unwrap_or_else(|| key.default_tier()),
            rule,
            format: self.format,
            video_only: self.video_only,
        })
    }
}
