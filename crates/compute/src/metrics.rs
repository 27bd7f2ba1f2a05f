//! Metric derivation: one raw counter snapshot in, one fixed set of derived
//! metrics out.
//!
//! Every ratio guards its denominator. A zero denominator yields `0`, except
//! the two video rates which yield `None` so non-video creatives are never
//! judged on them.

use adlens_core::config::EventConfig;
use adlens_core::{EventCounts, RawCounterSnapshot};
use serde::Serialize;

const PIXEL_PURCHASE: &str = "offsite_conversion.fb_pixel_purchase";
const OMNI_PURCHASE: &str = "omni_purchase";
const PIXEL_ADD_TO_CART: &str = "offsite_conversion.fb_pixel_add_to_cart";
const OMNI_ADD_TO_CART: &str = "omni_add_to_cart";

/// Event names the deriver extracts, including the conversion fallback chains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventNames {
    pub link_click: String,
    /// Tried in order; first positive count wins.
    pub purchase: Vec<String>,
    /// Tried in order; first positive count wins.
    pub add_to_cart: Vec<String>,
    pub video_3s: String,
    /// Action type inside the dedicated `video_p50_watched_actions` list.
    pub video_p50: String,
    /// Key looked up in `actions` when the dedicated list is empty.
    pub video_p50_in_actions: String,
}

impl EventNames {
    /// Build the chains: custom conversion -> pixel event -> omni-channel event.
    pub fn new(custom_purchase_id: Option<&str>, custom_atc_id: Option<&str>) -> Self {
        Self {
            link_click: "link_click".to_string(),
            purchase: chain(custom_purchase_id, PIXEL_PURCHASE, OMNI_PURCHASE),
            add_to_cart: chain(custom_atc_id, PIXEL_ADD_TO_CART, OMNI_ADD_TO_CART),
            video_3s: "video_view".to_string(),
            video_p50: "video_view".to_string(),
            video_p50_in_actions: "video_p50_watched".to_string(),
        }
    }

    pub fn from_config(events: &EventConfig) -> Self {
        Self::new(
            events.custom_conversion_id.as_deref(),
            events.custom_atc_conversion_id.as_deref(),
        )
    }
}

impl Default for EventNames {
    fn default() -> Self {
        Self::new(None, None)
    }
}

fn chain(custom_id: Option<&str>, pixel: &str, omni: &str) -> Vec<String> {
    custom_id
        .filter(|id| !id.trim().is_empty())
        .map(|id| format!("offsite_conversion.custom.{}", id.trim()))
        .into_iter()
        .chain([pixel.to_string(), omni.to_string()])
        .collect()
}

/// Derived metrics for one snapshot. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub impressions: f64,
    pub clicks: f64,
    pub link_clicks: f64,
    pub spend: f64,
    pub reach: f64,
    pub frequency: f64,
    pub cpc: f64,
    pub ctr: f64,
    pub cpm: f64,
    pub hook_rate: Option<f64>,
    pub hold_rate: Option<f64>,
    pub add_to_cart: f64,
    pub purchases: f64,
    pub purchase_value: f64,
    pub cvr: f64,
    pub atc_rate: f64,
    pub atc_to_purchase: f64,
    pub aov: f64,
    pub cpa: f64,
    pub roas: f64,
    #[serde(rename = "video3sViews")]
    pub video_3s_views: f64,
    #[serde(rename = "videoP50Views")]
    pub video_p50_views: f64,
}

impl DerivedMetrics {
    pub fn is_video(&self) -> bool {
        self.hook_rate.is_some()
    }

    pub fn has_purchases(&self) -> bool {
        self.purchases > 0.0
    }
}

fn first_positive(counts: &EventCounts, chain: &[String]) -> f64 {
    counts.first_positive(chain).map(|(_, v)| v).unwrap_or(0.0)
}

/// `num / den`, or `0` when the denominator is not positive.
fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// Derive the fixed metric set from one raw snapshot. Pure and deterministic.
pub fn derive_metrics(snapshot: &RawCounterSnapshot, events: &EventNames) -> DerivedMetrics {
    let impressions = snapshot.impressions;
    let spend = snapshot.spend;
    let link_clicks = snapshot.actions.get(&events.link_click);

    let purchases = first_positive(&snapshot.actions, &events.purchase);
    let purchase_value = first_positive(&snapshot.action_values, &events.purchase);
    let add_to_cart = first_positive(&snapshot.actions, &events.add_to_cart);

    let video_3s_views = snapshot.actions.get(&events.video_3s);
    let video_p50_views = match snapshot.video_p50_watched_actions.get(&events.video_p50) {
        v if v > 0.0 => v,
        _ => snapshot.actions.get(&events.video_p50_in_actions),
    };

    let hook_rate = (video_3s_views > 0.0 && impressions > 0.0)
        .then(|| video_3s_views / impressions * 100.0);
    let hold_rate = (video_p50_views > 0.0 && video_3s_views > 0.0)
        .then(|| video_p50_views / video_3s_views * 100.0);

    DerivedMetrics {
        impressions,
        clicks: snapshot.clicks,
        link_clicks,
        spend,
        reach: snapshot.reach,
        frequency: snapshot.frequency,
        cpc: ratio(spend, link_clicks),
        ctr: ratio(link_clicks, impressions) * 100.0,
        cpm: ratio(spend, impressions) * 1000.0,
        hook_rate,
        hold_rate,
        add_to_cart,
        purchases,
        purchase_value,
        cvr: ratio(purchases, link_clicks) * 100.0,
        atc_rate: ratio(add_to_cart, link_clicks) * 100.0,
        atc_to_purchase: ratio(purchases, add_to_cart) * 100.0,
        aov: ratio(purchase_value, purchases),
        cpa: ratio(spend, purchases),
        roas: ratio(purchase_value, spend),
        video_3s_views,
        video_p50_views,
    }
}
