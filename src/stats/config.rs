use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::Deserialize;

use crate::core::config::load_toml_or_default;

use super::store::{StatCategory, StatKey};

const CONFIG_PATH: &str = "config/stats.toml";

#[derive(Debug, Clone, Deserialize, Default)]
struct RawStatsConfig {
    #[serde(default)]
    bounds: BTreeMap<String, RawBounds>,
    #[serde(default)]
    display: RawDisplay,
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
struct RawBounds {
    min: Option<f32>,
    max: Option<f32>,
    start: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawDisplay {
    currency_seconds: f32,
    vital_seconds: f32,
    emotion_seconds: f32,
}

impl Default for RawDisplay {
    fn default() -> Self {
        Self {
            currency_seconds: 1.2,
            vital_seconds: 0.6,
            emotion_seconds: 0.8,
        }
    }
}

/// Range and starting value of a single stat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatBounds {
    pub min: f32,
    pub max: f32,
    pub start: f32,
}

impl StatBounds {
    pub fn new(min: f32, max: f32, start: f32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min,
            max,
            start: start.clamp(min, max),
        }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }
}

impl Default for StatBounds {
    fn default() -> Self {
        Self::new(0.0, 100.0, 50.0)
    }
}

fn default_bounds(key: StatKey) -> StatBounds {
    match key {
        StatKey::Money => StatBounds::new(0.0, 99_999.0, 200.0),
        StatKey::Health => StatBounds::new(0.0, 100.0, 80.0),
        StatKey::Energy => StatBounds::new(0.0, 100.0, 70.0),
        StatKey::Hunger => StatBounds::new(0.0, 100.0, 30.0),
        StatKey::Mood => StatBounds::new(0.0, 100.0, 60.0),
        StatKey::Affection => StatBounds::new(0.0, 100.0, 20.0),
        StatKey::Stress => StatBounds::new(0.0, 100.0, 25.0),
    }
}

/// How long the displayed value takes to catch up with the true value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayDurations {
    pub currency_seconds: f32,
    pub vital_seconds: f32,
    pub emotion_seconds: f32,
}

impl DisplayDurations {
    pub fn for_category(&self, category: StatCategory) -> f32 {
        match category {
            StatCategory::Currency => self.currency_seconds,
            StatCategory::Vital => self.vital_seconds,
            StatCategory::Emotion => self.emotion_seconds,
        }
    }
}

impl Default for DisplayDurations {
    fn default() -> Self {
        RawDisplay::default().into()
    }
}

impl From<RawDisplay> for DisplayDurations {
    fn from(value: RawDisplay) -> Self {
        Self {
            currency_seconds: value.currency_seconds.max(0.0),
            vital_seconds: value.vital_seconds.max(0.0),
            emotion_seconds: value.emotion_seconds.max(0.0),
        }
    }
}

/// Runtime stat configuration derived from `config/stats.toml`.
#[derive(Resource, Debug, Clone, Default)]
pub struct StatsConfig {
    bounds: BTreeMap<StatKey, StatBounds>,
    pub display: DisplayDurations,
}

impl StatsConfig {
    pub fn load_or_default() -> Self {
        load_toml_or_default::<RawStatsConfig>(CONFIG_PATH).into()
    }

    pub fn bounds_for(&self, key: StatKey) -> StatBounds {
        self.bounds
            .get(&key)
            .copied()
            .unwrap_or_else(|| default_bounds(key))
    }
}

impl From<RawStatsConfig> for StatsConfig {
    fn from(value: RawStatsConfig) -> Self {
        let mut bounds = BTreeMap::new();
        for (label, raw) in value.bounds {
            let Some(key) = StatKey::from_label(&label) else {
                warn!("Ignoring bounds for unknown stat `{}` in {}", label, CONFIG_PATH);
                continue;
            };
            let fallback = default_bounds(key);
            bounds.insert(
                key,
                StatBounds::new(
                    raw.min.unwrap_or(fallback.min),
                    raw.max.unwrap_or(fallback.max),
                    raw.start.unwrap_or(fallback.start),
                ),
            );
        }

        Self {
            bounds,
            display: value.display.into(),
        }
    }
}
