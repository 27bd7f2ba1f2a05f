//! The recommendation engine: an ordered decision list over spend, volume
//! and economics that settles on exactly one [`Action`] per entity.
//!
//! Rules are tried in order and the first match wins:
//!
//! 1. Starving: too little delivery to judge.
//! 2. Kill on zero purchases at a spend multiple of the target CPA.
//! 3. Kill on a bad CPA with only a handful of purchases.
//! 4. Kill on proven low ROAS.
//! 5. Scale on healthy economics.
//! 6. Watch for everything else.
//!
//! The target CPA is the front-end offer price. All multiples and floors come
//! from [`DecisionConfig`].

use std::fmt;

use adlens_core::config::Config;
use adlens_core::KpiTier;
use adlens_rules::DecisionConfig;
use serde::{Deserialize, Serialize};

use crate::benchmark::KpiResult;
use crate::metrics::DerivedMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    Kill,
    Watch,
    Scale,
    Starving,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Kill, Action::Watch, Action::Scale, Action::Starving];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Kill => "kill",
            Action::Watch => "watch",
            Action::Scale => "scale",
            Action::Starving => "starving",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The verdict plus its justification. The first reason is the deciding rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub action: Action,
    pub reasoning: Vec<String>,
}

impl Recommendation {
    fn new(action: Action, reason: String) -> Self {
        Self {
            action,
            reasoning: vec![reason],
        }
    }

    fn note(mut self, line: impl Into<String>) -> Self {
        self.reasoning.push(line.into());
        self
    }

    fn notes(mut self, lines: impl IntoIterator<Item = String>) -> Self {
        self.reasoning.extend(lines);
        self
    }

    /// The deciding reason.
    pub fn primary_reason(&self) -> &str {
        self.reasoning.first().map(String::as_str).unwrap_or_default()
    }
}

/// Caller-supplied context for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationContext {
    /// Front-end offer price; doubles as the target CPA.
    pub front_end_price: f64,
    /// Total spend of the parent scope (the ad set for an ad), when known.
    pub parent_spend: Option<f64>,
}

impl EvaluationContext {
    pub fn new(front_end_price: f64) -> Self {
        Self {
            front_end_price,
            parent_spend: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.pricing.front_end_price)
    }

    pub fn with_parent_spend(mut self, parent_spend: f64) -> Self {
        self.parent_spend = Some(parent_spend);
        self
    }

    /// Target CPA, `0` when the price is unusable.
    pub fn target_cpa(&self) -> f64 {
        usable(self.front_end_price).unwrap_or(0.0)
    }

    fn parent(&self) -> Option<f64> {
        self.parent_spend.and_then(usable)
    }
}

fn usable(v: f64) -> Option<f64> {
    (v.is_finite() && v > 0.0).then_some(v)
}

fn money(v: f64) -> String {
    format!("${:.2}", v)
}

/// Decide the action for one entity. Total: every input maps to exactly one action.
pub fn recommend(
    metrics: &DerivedMetrics,
    kpis: &[KpiResult],
    ctx: &EvaluationContext,
    config: &DecisionConfig,
) -> Recommendation {
    if let Some(rec) = starving(metrics, ctx, config) {
        return rec;
    }

    // Without a usable price there is no CPA target, so only ROAS can decide.
    let target = usable(ctx.front_end_price);
    if let Some(target) = target {
        if let Some(rec) = kill_zero_purchases(metrics, target, config) {
            return rec;
        }
        if let Some(rec) = kill_low_volume(metrics, target, config) {
            return rec;
        }
    }
    if let Some(rec) = kill_unprofitable(metrics, config) {
        return rec;
    }
    if let Some(target) = target {
        if let Some(rec) = scale(metrics, kpis, target, config) {
            return rec;
        }
    }
    watch(metrics, kpis)
}

fn starving(
    m: &DerivedMetrics,
    ctx: &EvaluationContext,
    config: &DecisionConfig,
) -> Option<Recommendation> {
    let floor = &config.starving;
    let below_floor = m.spend < floor.min_spend || m.impressions < floor.min_impressions;
    let floor_line = || {
        format!(
            "Below the delivery floor of {} spend / {:.0} impressions ({} spent, {:.0} impressions)",
            money(floor.min_spend),
            floor.min_impressions,
            money(m.spend),
            m.impressions
        )
    };

    match ctx.parent() {
        Some(parent) => {
            let share = m.spend / parent;
            if share >= floor.parent_share {
                return None;
            }
            let rec = Recommendation::new(
                Action::Starving,
                format!(
                    "Spent {} ({:.2}% of parent spend {}), below the {:.1}% share needed to judge",
                    money(m.spend),
                    share * 100.0,
                    money(parent),
                    floor.parent_share * 100.0
                ),
            );
            Some(if below_floor { rec.note(floor_line()) } else { rec })
        }
        None if below_floor => Some(Recommendation::new(Action::Starving, floor_line())),
        None => None,
    }
}

fn kill_zero_purchases(
    m: &DerivedMetrics,
    target: f64,
    config: &DecisionConfig,
) -> Option<Recommendation> {
    if m.has_purchases() {
        return None;
    }
    let kill = &config.kill;
    let hard_limit = kill.zero_purchase_spend_multiple * target;
    let traffic_limit = kill.zero_purchase_traffic_spend_multiple * target;
    let traffic = format!("{:.0} link clicks, CTR {:.2}%", m.link_clicks, m.ctr);

    if m.spend >= hard_limit {
        return Some(
            Recommendation::new(
                Action::Kill,
                format!(
                    "Spent {} (>= {:.1}x target CPA of {}) with zero purchases",
                    money(m.spend),
                    kill.zero_purchase_spend_multiple,
                    money(target)
                ),
            )
            .note(traffic),
        );
    }
    if m.spend >= traffic_limit && m.link_clicks >= kill.zero_purchase_min_link_clicks {
        return Some(
            Recommendation::new(
                Action::Kill,
                format!(
                    "Spent {} (>= {:.1}x target CPA of {}) with zero purchases after {:.0} link clicks",
                    money(m.spend),
                    kill.zero_purchase_traffic_spend_multiple,
                    money(target),
                    m.link_clicks
                ),
            )
            .note(format!(
                "Traffic was sufficient to convert (>= {:.0} link clicks)",
                kill.zero_purchase_min_link_clicks
            )),
        );
    }
    None
}

fn kill_low_volume(
    m: &DerivedMetrics,
    target: f64,
    config: &DecisionConfig,
) -> Option<Recommendation> {
    let kill = &config.kill;
    let in_band = m.purchases >= 1.0 && m.purchases <= kill.low_volume_max_purchases as f64;
    let limit = kill.low_volume_cpa_multiple * target;
    // Strictly above: exactly at the multiple is not enough to kill.
    if !in_band || m.cpa <= limit {
        return None;
    }
    Some(
        Recommendation::new(
            Action::Kill,
            format!(
                "CPA {} is above {:.1}x target CPA ({}) on {:.0} purchase{}",
                money(m.cpa),
                kill.low_volume_cpa_multiple,
                money(limit),
                m.purchases,
                plural(m.purchases)
            ),
        )
        .note(format!("ROAS {:.2} on {} spend", m.roas, money(m.spend))),
    )
}

fn kill_unprofitable(m: &DerivedMetrics, config: &DecisionConfig) -> Option<Recommendation> {
    let kill = &config.kill;
    if m.purchases < kill.unprofitable_min_purchases as f64 || m.roas >= kill.unprofitable_max_roas {
        return None;
    }
    Some(
        Recommendation::new(
            Action::Kill,
            format!(
                "ROAS {:.2} is below {:.2} after {:.0} purchases",
                m.roas, kill.unprofitable_max_roas, m.purchases
            ),
        )
        .note(format!("CPA {} on {} spend", money(m.cpa), money(m.spend))),
    )
}

fn scale(
    m: &DerivedMetrics,
    kpis: &[KpiResult],
    target: f64,
    config: &DecisionConfig,
) -> Option<Recommendation> {
    let gate = &config.scale;
    let cpa_limit = gate.max_cpa_multiple * target;
    let qualifies = m.has_purchases()
        && m.purchases >= gate.min_purchases as f64
        && m.roas >= gate.min_roas
        && m.cpa <= cpa_limit;
    if !qualifies {
        return None;
    }

    // Soft KPIs never block a scale; they are reported for the media buyer.
    let advisories = kpis
        .iter()
        .filter(|k| k.benchmark.tier == KpiTier::Soft && !k.passing)
        .map(|k| format!("Advisory: {} misses its benchmark", k.describe()));

    Some(
        Recommendation::new(
            Action::Scale,
            format!(
                "ROAS {:.2} on {:.0} purchases at CPA {} (<= {:.1}x target, {})",
                m.roas,
                m.purchases,
                money(m.cpa),
                gate.max_cpa_multiple,
                money(cpa_limit)
            ),
        )
        .notes(advisories),
    )
}

fn watch(m: &DerivedMetrics, kpis: &[KpiResult]) -> Recommendation {
    let context = if m.has_purchases() {
        format!(
            "Accumulating data: {:.0} purchase{}, ROAS {:.2}, CPA {}",
            m.purchases,
            plural(m.purchases),
            m.roas,
            money(m.cpa)
        )
    } else {
        format!(
            "Accumulating data: spent {}, {:.0} link clicks, zero purchases so far",
            money(m.spend),
            m.link_clicks
        )
    };

    let concerns = kpis
        .iter()
        .filter(|k| k.benchmark.tier == KpiTier::Soft && k.confidently_failing)
        .map(|k| format!("Concern: {}", k.describe()));

    Recommendation::new(Action::Watch, context).notes(concerns)
}

fn plural(n: f64) -> &'static str {
    if (n - 1.0).abs() < f64::EPSILON {
        ""
    } else {
        "s"
    }
}
