//! Integration tests that load the rule documents shipped in `data/rules/`
//! through the filesystem loader and check they match the embedded copies.

use adlens_core::{KpiTier, MetricKey};
use adlens_rules::loader::RuleLoader;
use adlens_rules::schema::RuleKind;
use adlens_rules::{BandPreference, BenchmarkTable, DecisionConfig, Threshold};

/// Integration tests run from the crate directory, so we go up two levels.
fn rules_dir() -> std::path::PathBuf {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest.join("../../data/rules")
}

fn loaded() -> RuleLoader {
    let mut loader = RuleLoader::new(rules_dir());
    let results = loader.load_all().expect("scan rules dir");
    for r in &results {
        assert!(
            r.status.is_loaded(),
            "{} did not load: {:?}",
            r.path.display(),
            r.status
        );
    }
    loader
}

#[test]
fn shipped_directory_has_one_document_per_kind() {
    let loader = loaded();
    let kinds: Vec<RuleKind> = loader.documents().values().map(|d| d.kind()).collect();
    assert_eq!(kinds.len(), 2);
    assert!(kinds.contains(&RuleKind::BenchmarkTable));
    assert!(kinds.contains(&RuleKind::DecisionConfig));
}

#[test]
fn shipped_files_match_embedded_tables() {
    let loader = loaded();
    assert_eq!(loader.benchmark_table().unwrap(), *BenchmarkTable::standard());
    assert_eq!(loader.decision_config().unwrap(), *DecisionConfig::standard());
}

#[test]
fn video_benchmarks_are_video_only_soft_kpis() {
    let table = BenchmarkTable::standard();
    for key in [MetricKey::HookRate, MetricKey::HoldRate] {
        let b = table.get(key).unwrap();
        assert!(b.video_only, "{key} should be video only");
        assert_eq!(b.tier, KpiTier::Soft);
    }
    assert!(table.iter().filter(|b| b.video_only).all(|b| b.key.is_video()));
}

#[test]
fn frequency_band_prefers_low_values() {
    let freq = BenchmarkTable::standard().get(MetricKey::Frequency).unwrap();
    assert_eq!(
        freq.resolve(0.0),
        Threshold::Between { low: 1.0, high: 2.5, band: BandPreference::LowerIsBetter }
    );
}
