//! In-game calendar: days split into discrete time slots.
//!
//! The clock only moves when an interaction spends time (its configured
//! time cost), never from wall-clock frames.
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::config::load_toml_or_default;

const CONFIG_PATH: &str = "config/time.toml";

#[derive(Debug, Clone, Deserialize, Default)]
struct RawTimeConfig {
    #[serde(default)]
    clock: RawClockSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawClockSection {
    slots_per_day: u8,
    start_day: u32,
    start_slot: u8,
    slot_labels: Vec<String>,
}

impl Default for RawClockSection {
    fn default() -> Self {
        Self {
            slots_per_day: 10,
            start_day: 1,
            start_slot: 1,
            slot_labels: Vec::new(),
        }
    }
}

/// Tunable parameters describing how the calendar behaves.
#[derive(Resource, Debug, Clone)]
pub struct TimeSettings {
    pub slots_per_day: u8,
    pub start_day: u32,
    pub start_slot: u8,
    pub slot_labels: Vec<String>,
}

impl TimeSettings {
    pub fn load_or_default() -> Self {
        load_toml_or_default::<RawTimeConfig>(CONFIG_PATH).into()
    }

    /// Label for `slot`, falling back to "slot N".
    pub fn slot_label(&self, slot: u8) -> String {
        slot.checked_sub(1)
            .and_then(|index| self.slot_labels.get(usize::from(index)))
            .cloned()
            .unwrap_or_else(|| format!("slot {slot}"))
    }
}

impl Default for TimeSettings {
    fn default() -> Self {
        RawTimeConfig::default().into()
    }
}

impl From<RawTimeConfig> for TimeSettings {
    fn from(value: RawTimeConfig) -> Self {
        let clock = value.clock;
        let slots_per_day = clock.slots_per_day.max(1);
        Self {
            slots_per_day,
            start_day: clock.start_day.max(1),
            start_slot: clock.start_slot.clamp(1, slots_per_day),
            slot_labels: clock.slot_labels,
        }
    }
}

/// Result of spending time on the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockAdvance {
    pub days_rolled: u32,
}

/// Serializable clock position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockReading {
    pub day: u32,
    pub slot: u8,
}

/// Runtime state for the calendar. Slots run `1..=slots_per_day`.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct GameClock {
    day: u32,
    slot: u8,
    slots_per_day: u8,
}

impl GameClock {
    pub fn new(settings: &TimeSettings) -> Self {
        Self {
            day: settings.start_day,
            slot: settings.start_slot,
            slots_per_day: settings.slots_per_day,
        }
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }

    pub fn slots_per_day(&self) -> u8 {
        self.slots_per_day
    }

    pub fn reading(&self) -> ClockReading {
        ClockReading {
            day: self.day,
            slot: self.slot,
        }
    }

    /// Moves the clock forward by `slots`, rolling into following days.
    pub fn advance(&mut self, slots: u32) -> ClockAdvance {
        if slots == 0 {
            return ClockAdvance::default();
        }

        let per_day = u32::from(self.slots_per_day);
        let zero_based = u32::from(self.slot - 1) + slots;
        let days_rolled = zero_based / per_day;
        // remainder < slots_per_day, which is a u8
        self.slot = (zero_based % per_day) as u8 + 1;
        self.day = self.day.saturating_add(days_rolled);
        ClockAdvance { days_rolled }
    }

    /// Jumps to an explicit position (clamped into range).
    pub fn set(&mut self, reading: ClockReading) {
        self.day = reading.day.max(1);
        self.slot = reading.slot.clamp(1, self.slots_per_day);
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new(&TimeSettings::default())
    }
}
