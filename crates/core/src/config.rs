use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_f64(profile: &str, key: &str, default: f64) -> f64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(default)
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub pricing: PricingConfig,
    pub events: EventConfig,
    pub rules: RulesConfig,
    pub batch: BatchConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `ADLENS_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("ADLENS_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            pricing: PricingConfig::from_env_profiled(p),
            events: EventConfig::from_env_profiled(p),
            rules: RulesConfig::from_env_profiled(p),
            batch: BatchConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  pricing:  front_end_price={:.2}", self.pricing.front_end_price);
        tracing::info!(
            "  events:   custom_purchase={}, custom_add_to_cart={}",
            self.events.custom_conversion_id.as_deref().unwrap_or("(none)"),
            self.events.custom_atc_conversion_id.as_deref().unwrap_or("(none)")
        );
        tracing::info!("  rules:    dir={}", self.rules.rules_dir.display());
        tracing::info!("  batch:    max_concurrent={}", self.batch.max_concurrent);
    }

    /// Return a view safe for API responses.
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "pricing": { "front_end_price": self.pricing.front_end_price },
            "events": {
                "custom_conversion_configured": self.events.custom_conversion_id.is_some(),
                "custom_atc_conversion_configured": self.events.custom_atc_conversion_id.is_some(),
            },
            "rules": { "dir": self.rules.rules_dir },
            "batch": { "max_concurrent": self.batch.max_concurrent },
        })
    }
}

// ── Pricing ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Front-end offer price. The dynamic CPA target equals this value.
    pub front_end_price: f64,
}

impl PricingConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            front_end_price: profiled_env_f64(p, "FRONT_END_PRICE", 70.0),
        }
    }
}

// ── Conversion events ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    /// Custom conversion id tracked as the purchase event, if any.
    pub custom_conversion_id: Option<String>,
    /// Custom conversion id tracked as the add-to-cart event, if any.
    pub custom_atc_conversion_id: Option<String>,
}

impl EventConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            custom_conversion_id: profiled_env_opt(p, "META_CUSTOM_CONVERSION_ID"),
            custom_atc_conversion_id: profiled_env_opt(p, "META_CUSTOM_ATC_CONVERSION_ID"),
        }
    }
}

// ── Rule documents ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Directory scanned for BenchmarkTable / DecisionConfig YAML documents.
    pub rules_dir: PathBuf,
}

impl RulesConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            rules_dir: PathBuf::from(profiled_env_or(p, "RULES_DIR", "data/rules")),
        }
    }
}

// ── Batch evaluation ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Worker threads for batch evaluation. 0 lets rayon decide.
    pub max_concurrent: usize,
}

impl BatchConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            max_concurrent: profiled_env_usize(p, "MAX_CONCURRENT", 10),
        }
    }
}
