//! Typed stat keys and the authoritative numeric store.
use std::{collections::BTreeMap, fmt};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::config::{StatBounds, StatsConfig};

/// Every numeric value an interaction can touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKey {
    Money,
    Health,
    Energy,
    Hunger,
    Mood,
    Affection,
    Stress,
}

impl StatKey {
    pub const ALL: [StatKey; 7] = [
        StatKey::Money,
        StatKey::Health,
        StatKey::Energy,
        StatKey::Hunger,
        StatKey::Mood,
        StatKey::Affection,
        StatKey::Stress,
    ];

    pub fn category(self) -> StatCategory {
        match self {
            Self::Money => StatCategory::Currency,
            Self::Health | Self::Energy | Self::Hunger => StatCategory::Vital,
            Self::Mood | Self::Affection | Self::Stress => StatCategory::Emotion,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.label().eq_ignore_ascii_case(label.trim()))
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Money => "money",
            Self::Health => "health",
            Self::Energy => "energy",
            Self::Hunger => "hunger",
            Self::Mood => "mood",
            Self::Affection => "affection",
            Self::Stress => "stress",
        }
    }
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Groups stats that share display timing and feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatCategory {
    Currency,
    Vital,
    Emotion,
}

impl StatCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Currency => "currency",
            Self::Vital => "vital",
            Self::Emotion => "emotion",
        }
    }
}

/// Read/write access to numeric game state by typed key.
pub trait NumericStore {
    fn value(&self, key: StatKey) -> f32;

    /// Stores `value` (after any clamping) and returns what was stored.
    fn set_value(&mut self, key: StatKey, value: f32) -> f32;
}

/// Authoritative stat values. Only the result processor writes here.
#[derive(Resource, Debug, Clone)]
pub struct GameStats {
    values: BTreeMap<StatKey, f32>,
    bounds: BTreeMap<StatKey, StatBounds>,
}

impl GameStats {
    pub fn from_config(config: &StatsConfig) -> Self {
        let bounds: BTreeMap<_, _> = StatKey::ALL
            .iter()
            .map(|key| (*key, config.bounds_for(*key)))
            .collect();
        let values = bounds
            .iter()
            .map(|(key, bounds)| (*key, bounds.start))
            .collect();
        Self { values, bounds }
    }

    pub fn bounds(&self, key: StatKey) -> StatBounds {
        self.bounds.get(&key).copied().unwrap_or_default()
    }

    pub fn snapshot(&self) -> BTreeMap<StatKey, f32> {
        self.values.clone()
    }

    /// Overwrites stored values; keys missing from `values` keep their
    /// current value.
    pub fn restore(&mut self, values: &BTreeMap<StatKey, f32>) {
        for (key, value) in values {
            self.set_value(*key, *value);
        }
    }
}

impl Default for GameStats {
    fn default() -> Self {
        Self::from_config(&StatsConfig::default())
    }
}

impl NumericStore for GameStats {
    fn value(&self, key: StatKey) -> f32 {
        self.values.get(&key).copied().unwrap_or(0.0)
    }

    fn set_value(&mut self, key: StatKey, value: f32) -> f32 {
        let stored = self.bounds(key).clamp(value);
        self.values.insert(key, stored);
        stored
    }
}
