//! End-to-end scenarios: platform insight rows in, actions and tags out.

use adlens_compute::{
    Action, ClassificationTag, EntityInput, EvaluationContext, EvaluationEngine,
};
use adlens_core::{Config, EntityLevel, EntityRef, MetricKey, RawCounterSnapshot};

const PRICE: f64 = 70.0;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A platform row with pixel purchase events and numbers as strings.
fn row(spend: f64, impressions: u64, link_clicks: u64, purchases: u64, revenue: f64) -> RawCounterSnapshot {
    let json = format!(
        r#"{{
            "impressions": "{impressions}",
            "clicks": "{link_clicks}",
            "spend": "{spend}",
            "reach": "{reach}",
            "frequency": "1.4",
            "actions": [
                {{"action_type": "link_click", "value": "{link_clicks}"}},
                {{"action_type": "offsite_conversion.fb_pixel_add_to_cart", "value": "{atc}"}},
                {{"action_type": "offsite_conversion.fb_pixel_purchase", "value": "{purchases}"}}
            ],
            "action_values": [
                {{"action_type": "offsite_conversion.fb_pixel_purchase", "value": "{revenue}"}}
            ],
            "date_start": "2025-03-01",
            "date_stop": "2025-03-07"
        }}"#,
        reach = impressions * 10 / 14,
        atc = purchases * 3,
    );
    RawCounterSnapshot::from_json(&json).expect("valid row")
}

fn ad(id: &str) -> EntityRef {
    EntityRef::new(id, EntityLevel::Ad)
        .with_name(format!("Creative {id}"))
        .with_parent("adset-42")
}

fn evaluate(snapshot: &RawCounterSnapshot, ctx: EvaluationContext) -> adlens_compute::EntityEvaluation {
    init_tracing();
    EvaluationEngine::standard().evaluate(&ad("x"), snapshot, &ctx)
}

#[test]
fn scenario_a_starving_under_parent() {
    let eval = evaluate(
        &row(5.0, 80, 1, 0, 0.0),
        EvaluationContext::new(PRICE).with_parent_spend(2_000.0),
    );
    assert_eq!(eval.action(), Action::Starving);
    assert_eq!(eval.tag(), ClassificationTag::None);
}

#[test]
fn scenario_b_three_times_target_without_purchases() {
    let eval = evaluate(&row(210.0, 15_000, 25, 0, 0.0), EvaluationContext::new(PRICE));
    assert_eq!(eval.action(), Action::Kill);
    assert!(eval.recommendation().primary_reason().contains("3.0x target CPA"));
}

#[test]
fn scenario_c_boundary_at_two_times_target() {
    let at = evaluate(&row(560.0, 40_000, 400, 4, 500.0), EvaluationContext::new(PRICE));
    assert_eq!(at.metrics.cpa, 140.0);
    assert_ne!(at.action(), Action::Kill);

    let over = evaluate(&row(600.0, 40_000, 400, 4, 500.0), EvaluationContext::new(PRICE));
    assert_eq!(over.action(), Action::Kill);
}

#[test]
fn scenario_d_unprofitable_after_enough_purchases() {
    let eval = evaluate(&row(300.0, 30_000, 350, 6, 180.0), EvaluationContext::new(PRICE));
    assert_eq!(eval.action(), Action::Kill);
    assert!(eval.recommendation().primary_reason().starts_with("ROAS 0.60"));
}

#[test]
fn scenario_e_scale_and_winner() {
    let eval = evaluate(&row(300.0, 30_000, 350, 5, 540.0), EvaluationContext::new(PRICE));
    assert_eq!(eval.action(), Action::Scale);
    assert_eq!(eval.tag(), ClassificationTag::Winner);
    assert_eq!(eval.date_start.map(|d| d.to_string()), Some("2025-03-01".to_string()));
}

#[test]
fn scenario_f_one_purchase_keeps_watching() {
    let eval = evaluate(&row(40.0, 4_000, 60, 1, 48.0), EvaluationContext::new(PRICE));
    assert_eq!(eval.action(), Action::Watch);
}

#[test]
fn static_creatives_have_no_video_kpis() {
    let eval = evaluate(&row(300.0, 30_000, 350, 5, 540.0), EvaluationContext::new(PRICE));
    assert!(eval.metrics.hook_rate.is_none());
    assert!(eval
        .kpis()
        .iter()
        .all(|k| !matches!(k.benchmark.key, MetricKey::HookRate | MetricKey::HoldRate)));
}

#[test]
fn garbage_row_is_conservative_not_an_error() {
    let snap = RawCounterSnapshot::from_json(
        r#"{"spend": "abc", "impressions": null, "actions": "oops", "frequency": "NaN"}"#,
    )
    .unwrap();
    let eval = evaluate(&snap, EvaluationContext::new(PRICE));
    assert_eq!(eval.action(), Action::Starving);
    assert!(eval
        .kpis()
        .iter()
        .all(|k| !k.confidently_passing && !k.confidently_failing));
}

#[test]
fn malformed_action_entry_does_not_hide_purchases() {
    let snap = RawCounterSnapshot::from_json(
        r#"{
            "spend": "300", "impressions": "30000", "reach": "20000",
            "actions": [
                {"action_type": "link_click", "value": "350"},
                {"value": "12"},
                {"action_type": "offsite_conversion.fb_pixel_purchase", "value": "5"}
            ],
            "action_values": [
                {"action_type": "offsite_conversion.fb_pixel_purchase", "value": "540"}
            ]
        }"#,
    )
    .unwrap();
    let eval = evaluate(&snap, EvaluationContext::new(PRICE));
    assert_eq!(eval.metrics.purchases, 5.0);
    assert_eq!(eval.metrics.link_clicks, 350.0);
    assert_eq!(eval.action(), Action::Scale);
}

#[test]
fn ad_set_children_judged_against_parent_spend() {
    init_tracing();
    let engine = EvaluationEngine::standard().with_parallelism(2);
    let parent = row(1_000.0, 100_000, 1_200, 12, 1_500.0);
    let children = vec![
        EntityInput::new(ad("big"), row(600.0, 60_000, 700, 9, 1_100.0)),
        EntityInput::new(ad("tiny"), row(12.0, 1_200, 15, 0, 0.0)),
        EntityInput::new(ad("mid"), row(388.0, 38_800, 485, 3, 400.0)),
    ];

    let results = engine.evaluate_children(&parent, &children, PRICE);
    let actions: Vec<(&str, Action)> = results
        .iter()
        .map(|r| (r.entity.id.as_str(), r.action()))
        .collect();
    assert_eq!(actions[0], ("big", Action::Scale));
    assert_eq!(actions[1], ("tiny", Action::Starving));
    assert_eq!(actions[2].0, "mid");
    assert_ne!(actions[2].1, Action::Starving);
}

#[test]
fn custom_conversion_from_config_is_preferred() {
    init_tracing();
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = Config::for_profile("SCENARIO_CUSTOM_EVENTS");
    config.rules.rules_dir = dir.path().to_path_buf();
    config.events.custom_conversion_id = Some("9001".to_string());
    let engine = EvaluationEngine::from_config(&config).unwrap();

    let snap = RawCounterSnapshot::from_json(
        r#"{
            "spend": "300", "impressions": "30000", "reach": "20000",
            "actions": {"link_click": 350, "offsite_conversion.custom.9001": 5,
                        "offsite_conversion.fb_pixel_purchase": 1},
            "action_values": {"offsite_conversion.custom.9001": 540,
                              "offsite_conversion.fb_pixel_purchase": 20}
        }"#,
    )
    .unwrap();
    let eval = engine.evaluate(&ad("c"), &snap, &EvaluationContext::new(PRICE));
    assert_eq!(eval.metrics.purchases, 5.0);
    assert_eq!(eval.action(), Action::Scale);
}

#[test]
fn engine_from_environment_profile() {
    init_tracing();
    let dir = tempfile::TempDir::new().unwrap();
    std::env::set_var("ADLENS_PROFILE", "scenario_env");
    std::env::set_var("SCENARIO_ENV_RULES_DIR", dir.path());
    std::env::set_var("SCENARIO_ENV_META_CUSTOM_CONVERSION_ID", "4242");
    let engine = EvaluationEngine::from_env().unwrap();
    std::env::remove_var("ADLENS_PROFILE");

    assert_eq!(engine.table(), adlens_rules::BenchmarkTable::standard());
    assert_eq!(engine.events().purchase[0], "offsite_conversion.custom.4242");
}

#[test]
fn evaluation_serializes_for_dashboards() {
    let eval = evaluate(&row(300.0, 30_000, 350, 5, 540.0), EvaluationContext::new(PRICE));
    let json = serde_json::to_value(&eval).unwrap();
    assert_eq!(json["classification"]["recommendation"]["action"], "Scale");
    assert_eq!(json["metrics"]["purchaseValue"], 540.0);
    assert!(json["metrics"]["hookRate"].is_null());
}
