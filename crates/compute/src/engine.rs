use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use adlens_core::{Config, EntityRef, RawCounterSnapshot};
use adlens_rules::{BenchmarkTable, DecisionConfig, RuleError, RuleLoader};

use crate::benchmark::{evaluate_benchmarks, KpiResult};
use crate::classification::{classify, Classification, ClassificationTag};
use crate::metrics::{derive_metrics, DerivedMetrics, EventNames};
use crate::recommendation::{recommend, Action, EvaluationContext, Recommendation};

/// One entity's counters for one reporting window, as handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityInput {
    pub entity: EntityRef,
    pub snapshot: RawCounterSnapshot,
}

impl EntityInput {
    pub fn new(entity: EntityRef, snapshot: RawCounterSnapshot) -> Self {
        Self { entity, snapshot }
    }
}

/// Everything produced for one entity in one evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityEvaluation {
    pub entity: EntityRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_stop: Option<NaiveDate>,
    pub metrics: DerivedMetrics,
    pub classification: Classification,
}

impl EntityEvaluation {
    pub fn action(&self) -> Action {
        self.classification.recommendation.action
    }

    pub fn tag(&self) -> ClassificationTag {
        self.classification.tag
    }

    pub fn recommendation(&self) -> &Recommendation {
        &self.classification.recommendation
    }

    pub fn kpis(&self) -> &[KpiResult] {
        &self.classification.kpis
    }
}

/// Runs the deriver, estimator, evaluator and decision list for entities.
///
/// Holds only immutable compiled configuration, so one engine can be shared
/// by reference across threads.
#[derive(Debug, Clone)]
pub struct EvaluationEngine {
    table: BenchmarkTable,
    decisions: DecisionConfig,
    events: EventNames,
    /// Batch worker threads; 0 lets rayon decide.
    parallelism: usize,
    /// Built once by [`EvaluationEngine::with_parallelism`]; `None` runs
    /// batches on rayon's global pool.
    pool: Option<Arc<ThreadPool>>,
}

impl EvaluationEngine {
    pub fn new(table: BenchmarkTable, decisions: DecisionConfig, events: EventNames) -> Self {
        Self {
            table,
            decisions,
            events,
            parallelism: 0,
            pool: None,
        }
    }

    /// Engine over the built-in benchmark table and decision config.
    pub fn standard() -> Self {
        Self::new(
            BenchmarkTable::standard().clone(),
            DecisionConfig::standard().clone(),
            EventNames::default(),
        )
    }

    /// Read `.env` and the process environment, then build an engine from the
    /// resulting [`Config`].
    pub fn from_env() -> Result<Self, RuleError> {
        adlens_core::config::load_dotenv();
        let config = Config::from_env();
        config.log_summary();
        Self::from_config(&config)
    }

    /// Load rule documents from `config.rules.rules_dir` and build an engine.
    ///
    /// Kinds missing from the directory fall back to the built-in documents.
    pub fn from_config(config: &Config) -> Result<Self, RuleError> {
        let mut loader = RuleLoader::new(config.rules.rules_dir.clone());
        loader.load_all()?;
        Self::from_loader(&loader, config)
    }

    pub fn from_loader(loader: &RuleLoader, config: &Config) -> Result<Self, RuleError> {
        let table = loader.benchmark_table()?;
        let decisions = loader.decision_config()?;
        info!(
            benchmark_table = %table.id,
            benchmarks = table.len(),
            max_concurrent = config.batch.max_concurrent,
            "evaluation engine ready"
        );
        Ok(Self::new(table, decisions, EventNames::from_config(&config.events))
            .with_parallelism(config.batch.max_concurrent))
    }

    /// Size the batch worker pool. The pool is built here, once, and shared by
    /// every later batch and by clones of this engine.
    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = threads;
        self.pool = if threads == 0 {
            None
        } else {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|i| format!("adlens-eval-{i}"))
                .build()
            {
                Ok(pool) => Some(Arc::new(pool)),
                Err(e) => {
                    warn!(error = %e, threads, "failed to build batch thread pool; using the global pool");
                    None
                }
            }
        };
        self
    }

    pub fn table(&self) -> &BenchmarkTable {
        &self.table
    }

    pub fn decisions(&self) -> &DecisionConfig {
        &self.decisions
    }

    pub fn events(&self) -> &EventNames {
        &self.events
    }

    /// Evaluate one entity. Never fails; sparse input yields a conservative result.
    pub fn evaluate(
        &self,
        entity: &EntityRef,
        snapshot: &RawCounterSnapshot,
        ctx: &EvaluationContext,
    ) -> EntityEvaluation {
        let metrics = derive_metrics(snapshot, &self.events);
        let kpis = evaluate_benchmarks(&self.table, &metrics, ctx.target_cpa());
        let recommendation = recommend(&metrics, &kpis, ctx, &self.decisions);
        let classification = classify(&metrics, kpis, recommendation, &self.decisions);

        debug!(
            entity_id = %entity.id,
            level = %entity.level,
            action = %classification.recommendation.action,
            tag = ?classification.tag,
            spend = metrics.spend,
            purchases = metrics.purchases,
            "entity evaluated"
        );

        EntityEvaluation {
            entity: entity.clone(),
            date_start: snapshot.date_start,
            date_stop: snapshot.date_stop,
            metrics,
            classification,
        }
    }

    /// Evaluate many entities in parallel under one context. Output order
    /// matches input order.
    pub fn evaluate_batch(
        &self,
        inputs: &[EntityInput],
        ctx: &EvaluationContext,
    ) -> Vec<EntityEvaluation> {
        let start = Instant::now();
        let run = || -> Vec<EntityEvaluation> {
            inputs
                .par_iter()
                .map(|input| self.evaluate(&input.entity, &input.snapshot, ctx))
                .collect()
        };

        let results = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        };

        BatchSummary::of(&results).log(start.elapsed().as_secs_f64());
        results
    }

    /// Evaluate the children of one parent (the ads of an ad set), using the
    /// parent's spend for relative starving detection.
    pub fn evaluate_children(
        &self,
        parent: &RawCounterSnapshot,
        children: &[EntityInput],
        front_end_price: f64,
    ) -> Vec<EntityEvaluation> {
        let ctx = EvaluationContext::new(front_end_price).with_parent_spend(parent.spend);
        self.evaluate_batch(children, &ctx)
    }
}

impl Default for EvaluationEngine {
    fn default() -> Self {
        Self::standard()
    }
}

/// Counts across one batch, for logging and dashboards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub by_action: BTreeMap<Action, usize>,
    pub winners: usize,
    pub trending: usize,
    pub total_spend: f64,
}

impl BatchSummary {
    pub fn of(results: &[EntityEvaluation]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };
        for r in results {
            *summary.by_action.entry(r.action()).or_default() += 1;
            match r.tag() {
                ClassificationTag::Winner => summary.winners += 1,
                ClassificationTag::Trending => summary.trending += 1,
                ClassificationTag::None => {}
            }
            summary.total_spend += r.metrics.spend;
        }
        summary
    }

    pub fn count(&self, action: Action) -> usize {
        self.by_action.get(&action).copied().unwrap_or(0)
    }

    fn log(&self, elapsed_secs: f64) {
        info!(
            entities = self.total,
            kill = self.count(Action::Kill),
            scale = self.count(Action::Scale),
            watch = self.count(Action::Watch),
            starving = self.count(Action::Starving),
            winners = self.winners,
            trending = self.trending,
            total_spend = self.total_spend,
            "batch evaluated in {:.2}s",
            elapsed_secs
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adlens_core::{EntityLevel, EventCounts};

    fn snapshot(spend: f64, impressions: f64, clicks: f64, purchases: f64, value: f64) -> RawCounterSnapshot {
        let mut actions = EventCounts::new();
        actions.insert("link_click", clicks);
        actions.insert("offsite_conversion.fb_pixel_purchase", purchases);
        let mut values = EventCounts::new();
        values.insert("offsite_conversion.fb_pixel_purchase", value);
        RawCounterSnapshot {
            impressions,
            clicks,
            spend,
            reach: impressions / 1.5,
            frequency: 1.5,
            actions,
            action_values: values,
            ..Default::default()
        }
    }

    fn ad(id: &str) -> EntityRef {
        EntityRef::new(id, EntityLevel::Ad).with_parent("adset-1")
    }

    #[test]
    fn evaluate_runs_every_stage() {
        let engine = EvaluationEngine::standard();
        let eval = engine.evaluate(
            &ad("a1"),
            &snapshot(300.0, 30_000.0, 350.0, 5.0, 540.0),
            &EvaluationContext::new(70.0),
        );
        assert_eq!(eval.action(), Action::Scale);
        assert_eq!(eval.tag(), ClassificationTag::Winner);
        assert_eq!(eval.metrics.purchases, 5.0);
        assert!(!eval.kpis().is_empty());
        assert_eq!(eval.entity.id, "a1");
    }

    #[test]
    fn batch_preserves_input_order() {
        let engine = EvaluationEngine::standard().with_parallelism(4);
        let inputs: Vec<EntityInput> = (0..40)
            .map(|i| {
                let spend = 20.0 + i as f64 * 10.0;
                EntityInput::new(ad(&format!("ad-{i}")), snapshot(spend, spend * 80.0, spend, 0.0, 0.0))
            })
            .collect();
        let results = engine.evaluate_batch(&inputs, &EvaluationContext::new(70.0));
        assert_eq!(results.len(), inputs.len());
        for (input, result) in inputs.iter().zip(&results) {
            assert_eq!(input.entity, result.entity);
        }
    }

    #[test]
    fn worker_pool_built_once_and_shared() {
        let engine = EvaluationEngine::standard().with_parallelism(3);
        let pool = engine.pool.clone().expect("pool for non-zero parallelism");
        assert_eq!(pool.current_num_threads(), 3);

        let ctx = EvaluationContext::new(70.0);
        let inputs = vec![EntityInput::new(ad("a"), snapshot(50.0, 4_000.0, 60.0, 1.0, 48.0))];
        engine.evaluate_batch(&inputs, &ctx);
        engine.evaluate_batch(&inputs, &ctx);
        let reused = engine.pool.as_ref().unwrap();
        assert!(Arc::ptr_eq(&pool, reused));

        let cloned = engine.clone();
        assert!(Arc::ptr_eq(&pool, cloned.pool.as_ref().unwrap()));

        let global = EvaluationEngine::standard().with_parallelism(0);
        assert!(global.pool.is_none());
        assert_eq!(global.evaluate_batch(&inputs, &ctx).len(), 1);
    }

    #[test]
    fn batch_matches_sequential_evaluation() {
        let engine = EvaluationEngine::standard();
        let ctx = EvaluationContext::new(70.0);
        let inputs = vec![
            EntityInput::new(ad("kill"), snapshot(210.0, 15_000.0, 20.0, 0.0, 0.0)),
            EntityInput::new(ad("scale"), snapshot(300.0, 30_000.0, 350.0, 5.0, 540.0)),
            EntityInput::new(ad("starve"), snapshot(5.0, 80.0, 1.0, 0.0, 0.0)),
            EntityInput::new(ad("empty"), RawCounterSnapshot::default()),
        ];
        let batch = engine.evaluate_batch(&inputs, &ctx);
        for (input, result) in inputs.iter().zip(&batch) {
            assert_eq!(*result, engine.evaluate(&input.entity, &input.snapshot, &ctx));
        }
        let summary = BatchSummary::of(&batch);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.count(Action::Kill), 1);
        assert_eq!(summary.count(Action::Scale), 1);
        assert_eq!(summary.count(Action::Starving), 2);
        assert_eq!(summary.winners, 1);
    }

    #[test]
    fn children_use_parent_spend() {
        let engine = EvaluationEngine::standard();
        let parent = snapshot(2_000.0, 200_000.0, 2_000.0, 10.0, 900.0);
        // 30 of 2000 is 1.5%: starving against the parent even though it
        // clears the absolute floor.
        let children = vec![EntityInput::new(ad("small"), snapshot(30.0, 3_000.0, 40.0, 0.0, 0.0))];
        let results = engine.evaluate_children(&parent, &children, 70.0);
        assert_eq!(results[0].action(), Action::Starving);

        let alone = engine.evaluate(&children[0].entity, &children[0].snapshot, &EvaluationContext::new(70.0));
        assert_eq!(alone.action(), Action::Watch);
    }

    #[test]
    fn unpriced_context_reports_no_cpa_kpi() {
        let engine = EvaluationEngine::standard();
        let eval = engine.evaluate(
            &ad("unpriced"),
            &snapshot(600.0, 60_000.0, 700.0, 20.0, 1_500.0),
            &EvaluationContext::new(0.0),
        );
        assert!(eval.kpis().iter().all(|k| !k.benchmark.is_dynamic()));
        assert!(eval.kpis().iter().all(|k| !k.describe().contains("$0.00")));
    }

    #[test]
    fn empty_batch_is_empty() {
        let engine = EvaluationEngine::standard();
        assert!(engine.evaluate_batch(&[], &EvaluationContext::new(70.0)).is_empty());
        assert_eq!(BatchSummary::of(&[]), BatchSummary::default());
    }

    #[test]
    fn from_config_falls_back_to_builtin_rules() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::for_profile("ENGINE_TEST_NO_RULES");
        config.rules.rules_dir = dir.path().join("missing");
        config.batch.max_concurrent = 2;
        let engine = EvaluationEngine::from_config(&config).unwrap();
        assert_eq!(engine.table(), BenchmarkTable::standard());
        assert_eq!(engine.decisions(), DecisionConfig::standard());
        assert_eq!(engine.parallelism, 2);
        assert_eq!(engine.pool.as_ref().map(|p| p.current_num_threads()), Some(2));
    }
}
