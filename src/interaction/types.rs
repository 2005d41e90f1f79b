//! Value types shared by the gate, dispatcher and result processor.
use std::{collections::BTreeMap, collections::BTreeSet, fmt, ops::RangeInclusive};

use serde::{Deserialize, Serialize};

use crate::{
    mode::state::{InteractionMode, SceneMode},
    stats::StatKey,
};

/// Stable identity of something the player can interact with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`", self.0)
    }
}

/// Monotonic id assigned by the dispatcher to each accepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionCategory {
    Work,
    Care,
    Play,
    Social,
    Rest,
    Travel,
    #[default]
    Misc,
}

/// Numeric predicate on one stat. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatThreshold {
    pub key: StatKey,
    pub min: Option<f32>,
    pub max: Option<f32>,
}

impl StatThreshold {
    pub fn at_least(key: StatKey, min: f32) -> Self {
        Self {
            key,
            min: Some(min),
            max: None,
        }
    }

    pub fn at_most(key: StatKey, max: f32) -> Self {
        Self {
            key,
            min: None,
            max: Some(max),
        }
    }
}

/// Set of allowed day slots.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimeSlotSet(BTreeSet<u8>);

impl TimeSlotSet {
    pub fn from_range(range: RangeInclusive<u8>) -> Self {
        Self(range.collect())
    }

    pub fn contains(&self, slot: u8) -> bool {
        self.0.contains(&slot)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<u8> for TimeSlotSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Renders runs compactly: `1-6, 9`.
impl fmt::Display for TimeSlotSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut runs: Vec<(u8, u8)> = Vec::new();
        for slot in self.iter() {
            match runs.last_mut() {
                Some((_, end)) if end.checked_add(1) == Some(slot) => *end = slot,
                _ => runs.push((slot, slot)),
            }
        }
        let parts: Vec<String> = runs
            .into_iter()
            .map(|(start, end)| {
                if start == end {
                    start.to_string()
                } else {
                    format!("{start}-{end}")
                }
            })
            .collect();
        if parts.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// Conjunction of predicates guarding an interaction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GateRule {
    pub thresholds: Vec<StatThreshold>,
    pub time_slots: Option<TimeSlotSet>,
    pub scene: Option<SceneMode>,
    pub interaction_mode: Option<InteractionMode>,
    pub required_flags: Vec<String>,
    pub forbidden_flags: Vec<String>,
    pub cooldown_seconds: f32,
}

impl GateRule {
    pub fn is_unconstrained(&self) -> bool {
        self.thresholds.is_empty()
            && self.time_slots.is_none()
            && self.scene.is_none()
            && self.interaction_mode.is_none()
            && self.required_flags.is_empty()
            && self.forbidden_flags.is_empty()
            && self.cooldown_seconds <= 0.0
    }

    pub fn with_threshold(mut self, threshold: StatThreshold) -> Self {
        self.thresholds.push(threshold);
        self
    }

    pub fn with_slots(mut self, slots: RangeInclusive<u8>) -> Self {
        self.time_slots = Some(TimeSlotSet::from_range(slots));
        self
    }

    pub fn in_scene(mut self, scene: SceneMode) -> Self {
        self.scene = Some(scene);
        self
    }

    pub fn in_mode(mut self, mode: InteractionMode) -> Self {
        self.interaction_mode = Some(mode);
        self
    }

    pub fn requires_flag(mut self, flag: impl Into<String>) -> Self {
        self.required_flags.push(flag.into());
        self
    }

    pub fn forbids_flag(mut self, flag: impl Into<String>) -> Self {
        self.forbidden_flags.push(flag.into());
        self
    }

    pub fn with_cooldown(mut self, seconds: f32) -> Self {
        self.cooldown_seconds = seconds.max(0.0);
        self
    }
}

/// Animation and sound to play while a result is shown.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeedbackCue {
    pub animation: Option<String>,
    pub sound: Option<String>,
}

impl FeedbackCue {
    pub fn is_empty(&self) -> bool {
        self.animation.is_none() && self.sound.is_none()
    }
}

/// What an interaction does once accepted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EffectTemplate {
    pub deltas: BTreeMap<StatKey, f32>,
    pub set_flags: Vec<String>,
    pub clear_flags: Vec<String>,
    /// Day slots consumed.
    pub time_cost: u32,
    pub feedback: FeedbackCue,
    pub message: String,
    pub travel_to: Option<SceneMode>,
    pub enter_mode: Option<InteractionMode>,
}

impl EffectTemplate {
    pub fn with_delta(mut self, key: StatKey, delta: f32) -> Self {
        *self.deltas.entry(key).or_insert(0.0) += delta;
        self
    }

    pub fn with_time_cost(mut self, slots: u32) -> Self {
        self.time_cost = slots;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn setting_flag(mut self, flag: impl Into<String>) -> Self {
        self.set_flags.push(flag.into());
        self
    }

    pub fn travelling_to(mut self, scene: SceneMode) -> Self {
        self.travel_to = Some(scene);
        self
    }

    pub fn entering_mode(mut self, mode: InteractionMode) -> Self {
        self.enter_mode = Some(mode);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionDescriptor {
    pub name: String,
    pub category: InteractionCategory,
    pub rule: GateRule,
    pub effect: EffectTemplate,
}

impl InteractionDescriptor {
    pub fn new(name: impl Into<String>, category: InteractionCategory) -> Self {
        Self {
            name: name.into(),
            category,
            rule: GateRule::default(),
            effect: EffectTemplate::default(),
        }
    }

    pub fn with_rule(mut self, rule: GateRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_effect(mut self, effect: EffectTemplate) -> Self {
        self.effect = effect;
        self
    }
}

/// Accepted request, carried inside `InteractionStarted`.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionRequest {
    pub id: RequestId,
    pub name: String,
    pub target: TargetId,
    /// Simulation seconds at acceptance.
    pub requested_at: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatDelta {
    pub key: StatKey,
    pub delta: f32,
}

/// Resolved outcome of a request, consumed once by the result processor.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionResult {
    pub request: InteractionRequest,
    pub success: bool,
    pub deltas: Vec<StatDelta>,
    pub message: String,
    pub effect: EffectTemplate,
}

impl InteractionResult {
    /// Builds a result from the request's effect template. A missing
    /// template yields a successful result that changes nothing.
    pub fn resolve(request: InteractionRequest, template: Option<&EffectTemplate>) -> Self {
        let effect = template.cloned().unwrap_or_default();
        let deltas = effect
            .deltas
            .iter()
            .filter(|(_, delta)| **delta != 0.0)
            .map(|(key, delta)| StatDelta {
                key: *key,
                delta: *delta,
            })
            .collect();
        let message = if effect.message.is_empty() {
            request.name.clone()
        } else {
            effect.message.clone()
        };

        Self {
            request,
            success: true,
            deltas,
            message,
            effect,
        }
    }
}
