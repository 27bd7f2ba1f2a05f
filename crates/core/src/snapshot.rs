//! Raw counter snapshots as the ad platform's reporting API emits them.
//!
//! Platform feeds are sparse and loosely typed: numbers arrive as strings,
//! fields go missing, and event collections come either as a list of
//! `{action_type, value}` objects or as a plain map. Deserialization here is
//! lenient by construction. Anything unparseable becomes `0` instead of an
//! error, so a single bad row can never fail a batch.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// One entity's cumulative counters for one reporting window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCounterSnapshot {
    #[serde(default, deserialize_with = "lenient_number")]
    pub impressions: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub clicks: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub spend: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub reach: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub frequency: f64,
    /// Event type -> cumulative count.
    #[serde(default)]
    pub actions: EventCounts,
    /// Event type -> cumulative monetary value.
    #[serde(default, alias = "actionValues")]
    pub action_values: EventCounts,
    /// Dedicated 50%-watched milestone list (action type is usually `video_view`).
    #[serde(default)]
    pub video_p50_watched_actions: EventCounts,
    #[serde(default, deserialize_with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub date_start: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub date_stop: Option<NaiveDate>,
}

impl RawCounterSnapshot {
    /// Parse a snapshot from the platform's JSON insights row.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A keyed bag of named event totals. Missing keys read as `0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EventCounts(BTreeMap<String, f64>);

impl EventCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, event: &str) -> f64 {
        self.0.get(event).copied().unwrap_or(0.0)
    }

    pub fn insert(&mut self, event: impl Into<String>, value: f64) {
        self.0.insert(event.into(), sanitize(value));
    }

    /// First event in `chain` with a positive total, with its value.
    pub fn first_positive<'a, S: AsRef<str>>(&self, chain: &'a [S]) -> Option<(&'a str, f64)> {
        chain
            .iter()
            .map(|name| (name.as_ref(), self.get(name.as_ref())))
            .find(|(_, value)| *value > 0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for EventCounts {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut counts = EventCounts::new();
        for (k, v) in iter {
            counts.insert(k, v);
        }
        counts
    }
}

impl<'de> Deserialize<'de> for EventCounts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct ActionEntry {
            action_type: String,
            #[serde(default)]
            value: Option<Lenient>,
        }

        /// A malformed entry is dropped on its own; its siblings still count.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Entry {
            Valid(ActionEntry),
            Junk(IgnoredAny),
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            List(Vec<Entry>),
            Map(BTreeMap<String, Lenient>),
            Other(IgnoredAny),
        }

        let counts = match Shape::deserialize(deserializer)? {
            Shape::List(entries) => entries
                .into_iter()
                .filter_map(|entry| match entry {
                    Entry::Valid(e) => Some(e),
                    Entry::Junk(_) => None,
                })
                .map(|e| (e.action_type, e.value.map(Lenient::into_f64).unwrap_or(0.0)))
                .collect(),
            Shape::Map(map) => map.into_iter().map(|(k, v)| (k, v.into_f64())).collect(),
            Shape::Other(_) => EventCounts::new(),
        };
        Ok(counts)
    }
}

/// Coerce a raw textual counter to a non-negative float; garbage becomes `0`.
pub fn coerce_number(raw: &str) -> f64 {
    raw.trim().parse::<f64>().map(sanitize).unwrap_or(0.0)
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

impl Lenient {
    fn into_f64(self) -> f64 {
        match self {
            Lenient::Number(n) => sanitize(n),
            Lenient::Text(s) => coerce_number(&s),
            Lenient::Other(_) => 0.0,
        }
    }
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Lenient::deserialize(deserializer)?.into_f64())
}

fn lenient_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    let raw = Option::<Lenient>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Lenient::Text(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
        _ => None,
    })
}
