//! Displayed-value interpolation. Only the on-screen number moves; the
//! stored value is already final when a tween starts.
use std::collections::BTreeMap;

use crate::stats::{NumericStore, StatKey};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueTween {
    from: f32,
    to: f32,
    elapsed: f32,
    duration: f32,
}

impl ValueTween {
    pub fn new(from: f32, to: f32, duration: f32) -> Self {
        Self {
            from,
            to,
            elapsed: 0.0,
            duration: duration.max(0.0),
        }
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Current value with an ease-out curve.
    pub fn value(&self) -> f32 {
        if self.is_finished() {
            return self.to;
        }
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        let eased = 1.0 - (1.0 - t) * (1.0 - t);
        self.from + (self.to - self.from) * eased
    }

    pub fn advance(&mut self, delta_seconds: f32) -> f32 {
        self.elapsed = (self.elapsed + delta_seconds.max(0.0)).min(self.duration);
        self.value()
    }

    pub fn snap(&mut self) -> f32 {
        self.elapsed = self.duration;
        self.to
    }
}

/// What the HUD shows for each stat. Lags the authoritative store while a
/// result is animating.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayedStats {
    values: BTreeMap<StatKey, f32>,
}

impl DisplayedStats {
    pub fn from_store(store: &dyn NumericStore) -> Self {
        Self {
            values: StatKey::ALL
                .into_iter()
                .map(|key| (key, store.value(key)))
                .collect(),
        }
    }

    pub fn get(&self, key: StatKey) -> f32 {
        self.values.get(&key).copied().unwrap_or_default()
    }

    pub fn set(&mut self, key: StatKey, value: f32) {
        self.values.insert(key, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatKey, f32)> + '_ {
        self.values.iter().map(|(key, value)| (*key, *value))
    }
}
