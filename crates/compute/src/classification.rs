//! Winner/trending tags for surfacing standout creatives. Ranking only; the
//! primary action always comes from the recommendation engine.

use adlens_rules::DecisionConfig;
use serde::{Deserialize, Serialize};

use crate::benchmark::{KpiResult, KpiTally};
use crate::metrics::DerivedMetrics;
use crate::recommendation::{Action, Recommendation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassificationTag {
    Winner,
    Trending,
    None,
}

/// A tag together with the KPI list and recommendation it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub tag: ClassificationTag,
    pub kpis: Vec<KpiResult>,
    pub recommendation: Recommendation,
}

impl Classification {
    pub fn action(&self) -> Action {
        self.recommendation.action
    }
}

/// Tag an entity from its evaluated KPIs and recommendation.
pub fn classify(
    metrics: &DerivedMetrics,
    kpis: Vec<KpiResult>,
    recommendation: Recommendation,
    config: &DecisionConfig,
) -> Classification {
    let tag = tag_for(metrics, &kpis, &recommendation, config);
    Classification {
        tag,
        kpis,
        recommendation,
    }
}

fn tag_for(
    m: &DerivedMetrics,
    kpis: &[KpiResult],
    rec: &Recommendation,
    config: &DecisionConfig,
) -> ClassificationTag {
    let rules = &config.classification;
    let tally = KpiTally::of(kpis);

    let proven = tally.confidently_passing >= rules.winner_min_confident_passes as usize
        && tally.confidently_failing == 0
        && m.spend > rules.winner_min_spend;
    if rec.action == Action::Scale || proven {
        return ClassificationTag::Winner;
    }

    let early = rec.action == Action::Watch
        && tally.passing >= rules.trending_min_passes as usize
        && tally.hard_confidently_failing == 0
        && tally.tentative > 0
        && m.spend > rules.trending_min_spend;
    if early {
        return ClassificationTag::Trending;
    }

    ClassificationTag::None
}
