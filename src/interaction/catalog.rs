//! Interaction descriptors, loaded from `config/interactions.toml`.
//!
//! When the file is missing or unreadable the built-in catalog is used so
//! the game stays playable out of the box.
use std::collections::{BTreeMap, HashMap};

use bevy::prelude::*;
use serde::Deserialize;

use crate::{
    core::config::load_toml_or_default,
    mode::state::{InteractionMode, SceneMode},
    stats::StatKey,
};

use super::types::{
    EffectTemplate, FeedbackCue, GateRule, InteractionCategory, InteractionDescriptor,
    StatThreshold, TimeSlotSet,
};

const CONFIG_PATH: &str = "config/interactions.toml";

#[derive(Debug, Clone, Deserialize, Default)]
struct RawCatalog {
    #[serde(default, rename = "interaction")]
    interactions: Vec<RawInteraction>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawInteraction {
    name: String,
    #[serde(default)]
    category: InteractionCategory,
    #[serde(default)]
    rule: RawRule,
    #[serde(default)]
    effect: RawEffect,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRule {
    min: BTreeMap<String, f32>,
    max: BTreeMap<String, f32>,
    time_slots: Option<Vec<u8>>,
    scene: Option<SceneMode>,
    mode: Option<InteractionMode>,
    required_flags: Vec<String>,
    forbidden_flags: Vec<String>,
    cooldown_seconds: f32,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawEffect {
    deltas: BTreeMap<String, f32>,
    set_flags: Vec<String>,
    clear_flags: Vec<String>,
    time_cost: u32,
    message: String,
    animation: Option<String>,
    sound: Option<String>,
    travel_to: Option<SceneMode>,
    enter_mode: Option<InteractionMode>,
}

fn stat_entries<'a>(
    interaction: &'a str,
    section: &'static str,
    values: BTreeMap<String, f32>,
) -> impl Iterator<Item = (StatKey, f32)> + 'a {
    values.into_iter().filter_map(move |(label, value)| {
        let key = StatKey::from_label(&label);
        if key.is_none() {
            warn!(
                "Ignoring unknown stat `{}` in {}.{} ({})",
                label, interaction, section, CONFIG_PATH
            );
        }
        key.map(|key| (key, value))
    })
}

impl RawInteraction {
    fn into_descriptor(self) -> InteractionDescriptor {
        let name = self.name;
        let rule = self.rule;
        let effect = self.effect;

        let mut thresholds: BTreeMap<StatKey, StatThreshold> = BTreeMap::new();
        for (key, min) in stat_entries(&name, "rule.min", rule.min) {
            thresholds.entry(key).or_insert(StatThreshold::at_least(key, min)).min = Some(min);
        }
        for (key, max) in stat_entries(&name, "rule.max", rule.max) {
            thresholds.entry(key).or_insert(StatThreshold::at_most(key, max)).max = Some(max);
        }

        let gate = GateRule {
            thresholds: thresholds.into_values().collect(),
            time_slots: rule.time_slots.map(TimeSlotSet::from_iter),
            scene: rule.scene,
            interaction_mode: rule.mode,
            required_flags: rule.required_flags,
            forbidden_flags: rule.forbidden_flags,
            cooldown_seconds: rule.cooldown_seconds.max(0.0),
        };

        let mut template = EffectTemplate {
            set_flags: effect.set_flags,
            clear_flags: effect.clear_flags,
            time_cost: effect.time_cost,
            feedback: FeedbackCue {
                animation: effect.animation,
                sound: effect.sound,
            },
            message: effect.message,
            travel_to: effect.travel_to,
            enter_mode: effect.enter_mode,
            ..EffectTemplate::default()
        };
        for (key, delta) in stat_entries(&name, "effect.deltas", effect.deltas) {
            template = template.with_delta(key, delta);
        }

        InteractionDescriptor {
            name,
            category: self.category,
            rule: gate,
            effect: template,
        }
    }
}

/// Lookup table of every configured interaction, keyed by name.
#[derive(Resource, Debug, Clone, Default)]
pub struct InteractionCatalog {
    entries: HashMap<String, InteractionDescriptor>,
}

impl InteractionCatalog {
    pub fn load_or_default() -> Self {
        let raw = load_toml_or_default::<RawCatalog>(CONFIG_PATH);
        if raw.interactions.is_empty() {
            info!("No interactions in {}; using built-in catalog", CONFIG_PATH);
            return Self::builtin();
        }
        Self::from(raw)
    }

    pub fn get(&self, name: &str) -> Option<&InteractionDescriptor> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Adds or replaces a descriptor; returns the one it replaced.
    pub fn insert(&mut self, descriptor: InteractionDescriptor) -> Option<InteractionDescriptor> {
        self.entries.insert(descriptor.name.clone(), descriptor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Default office/home loop used when no config file is present.
    pub fn builtin() -> Self {
        use InteractionCategory as C;
        use StatKey as K;

        let descriptors = [
            InteractionDescriptor::new("HelpWork", C::Work)
                .with_rule(
                    GateRule::default()
                        .in_scene(SceneMode::LocationA)
                        .in_mode(InteractionMode::Overview)
                        .with_slots(1..=6)
                        .with_threshold(StatThreshold::at_least(K::Energy, 15.0)),
                )
                .with_effect(
                    EffectTemplate::default()
                        .with_delta(K::Money, 120.0)
                        .with_delta(K::Energy, -15.0)
                        .with_delta(K::Stress, 10.0)
                        .with_time_cost(2)
                        .setting_flag("worked_once")
                        .with_message("Helped out at work"),
                ),
            InteractionDescriptor::new("TalkBoss", C::Social)
                .with_rule(
                    GateRule::default()
                        .in_scene(SceneMode::LocationA)
                        .in_mode(InteractionMode::Overview)
                        .with_slots(1..=8),
                )
                .with_effect(
                    EffectTemplate::default()
                        .entering_mode(InteractionMode::Dialog)
                        .with_message("The boss looks up from the desk"),
                ),
            InteractionDescriptor::new("AskRaise", C::Social)
                .with_rule(
                    GateRule::default()
                        .in_mode(InteractionMode::Dialog)
                        .requires_flag("worked_once")
                        .forbids_flag("asked_raise"),
                )
                .with_effect(
                    EffectTemplate::default()
                        .with_delta(K::Money, 50.0)
                        .with_delta(K::Stress, 15.0)
                        .setting_flag("asked_raise")
                        .with_message("A small raise, grudgingly"),
                ),
            InteractionDescriptor::new("EndConversation", C::Social)
                .with_rule(GateRule::default().in_mode(InteractionMode::Dialog))
                .with_effect(
                    EffectTemplate::default()
                        .entering_mode(InteractionMode::Overview)
                        .with_message("Back to the desk"),
                ),
            InteractionDescriptor::new("GoHome", C::Travel)
                .with_rule(
                    GateRule::default()
                        .in_scene(SceneMode::LocationA)
                        .in_mode(InteractionMode::Overview),
                )
                .with_effect(
                    EffectTemplate::default()
                        .with_time_cost(1)
                        .travelling_to(SceneMode::LocationB)
                        .with_message("Heading home"),
                ),
            InteractionDescriptor::new("GoToWork", C::Travel)
                .with_rule(
                    GateRule::default()
                        .in_scene(SceneMode::LocationB)
                        .with_slots(1..=5),
                )
                .with_effect(
                    EffectTemplate::default()
                        .with_time_cost(1)
                        .travelling_to(SceneMode::LocationA)
                        .with_message("Off to work"),
                ),
            InteractionDescriptor::new("CatPlay", C::Play)
                .with_rule(
                    GateRule::default()
                        .in_scene(SceneMode::LocationB)
                        .with_threshold(StatThreshold::at_least(K::Energy, 5.0))
                        .with_cooldown(5.0),
                )
                .with_effect(
                    EffectTemplate::default()
                        .with_delta(K::Mood, 8.0)
                        .with_delta(K::Affection, 5.0)
                        .with_delta(K::Energy, -5.0)
                        .with_time_cost(1)
                        .with_message("The cat chases the string"),
                ),
            InteractionDescriptor::new("FeedCat", C::Care)
                .with_rule(
                    GateRule::default()
                        .in_scene(SceneMode::LocationB)
                        .with_threshold(StatThreshold::at_least(K::Money, 10.0)),
                )
                .with_effect(
                    EffectTemplate::default()
                        .with_delta(K::Money, -10.0)
                        .with_delta(K::Affection, 8.0)
                        .with_time_cost(1)
                        .with_message("The cat purrs over its bowl"),
                ),
            InteractionDescriptor::new("Nap", C::Rest)
                .with_rule(
                    GateRule::default()
                        .in_scene(SceneMode::LocationB)
                        .with_threshold(StatThreshold::at_most(K::Energy, 90.0)),
                )
                .with_effect(
                    EffectTemplate::default()
                        .with_delta(K::Energy, 30.0)
                        .with_delta(K::Stress, -10.0)
                        .with_time_cost(3)
                        .with_message("A long nap"),
                ),
            InteractionDescriptor::new("Snack", C::Care)
                .with_rule(
                    GateRule::default()
                        .in_scene(SceneMode::LocationB)
                        .with_threshold(StatThreshold::at_least(K::Money, 15.0)),
                )
                .with_effect(
                    EffectTemplate::default()
                        .with_delta(K::Money, -15.0)
                        .with_delta(K::Hunger, -25.0)
                        .with_time_cost(1)
                        .with_message("Something from the fridge"),
                ),
        ];

        let mut catalog = Self::default();
        for descriptor in descriptors {
            catalog.insert(descriptor);
        }
        catalog
    }
}

impl From<RawCatalog> for InteractionCatalog {
    fn from(value: RawCatalog) -> Self {
        let mut catalog = Self::default();
        for raw in value.interactions {
            let descriptor = raw.into_descriptor();
            if let Some(previous) = catalog.insert(descriptor) {
                warn!(
                    "Interaction `{}` defined twice in {}; keeping the later entry",
                    previous.name, CONFIG_PATH
                );
            }
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rule_and_effect_sections() {
        let raw: RawCatalog = toml::from_str(
            r#"
            [[interaction]]
            name = "HelpWork"
            category = "work"

            [interaction.rule]
            scene = "location_a"
            time_slots = [1, 2, 3, 4, 5, 6]
            min = { energy = 20 }
            max = { energy = 95, stress = 90, charisma = 3 }
            forbidden_flags = ["fired"]
            cooldown_seconds = 1.5

            [interaction.effect]
            deltas = { money = 120, energy = -15 }
            time_cost = 2
            set_flags = ["worked_once"]
            message = "Paid"
            animation = "work_typing"
            "#,
        )
        .expect("catalog should parse");
        let catalog = InteractionCatalog::from(raw);
        let descriptor = catalog.get("HelpWork").expect("HelpWork loaded");

        assert_eq!(descriptor.category, InteractionCategory::Work);
        let rule = &descriptor.rule;
        assert_eq!(rule.scene, Some(SceneMode::LocationA));
        assert!(rule.time_slots.as_ref().is_some_and(|slots| slots.contains(6)));
        assert!(rule.time_slots.as_ref().is_some_and(|slots| !slots.contains(7)));
        assert_eq!(rule.thresholds.len(), 2);
        let energy = rule
            .thresholds
            .iter()
            .find(|threshold| threshold.key == StatKey::Energy)
            .expect("energy threshold");
        assert_eq!((energy.min, energy.max), (Some(20.0), Some(95.0)));
        assert_eq!(rule.cooldown_seconds, 1.5);

        let effect = &descriptor.effect;
        assert_eq!(effect.deltas.get(&StatKey::Money), Some(&120.0));
        assert_eq!(effect.time_cost, 2);
        assert_eq!(effect.feedback.animation.as_deref(), Some("work_typing"));
        assert_eq!(effect.set_flags, vec!["worked_once".to_string()]);
    }

    #[test]
    fn builtin_catalog_has_both_locations() {
        let catalog = InteractionCatalog::builtin();
        assert!(catalog.contains("HelpWork"));
        assert!(catalog.contains("CatPlay"));

        let go_home = catalog.get("GoHome").expect("travel entry");
        assert_eq!(go_home.effect.travel_to, Some(SceneMode::LocationB));
        assert!(catalog
            .get("EndConversation")
            .is_some_and(|d| d.effect.enter_mode == Some(InteractionMode::Overview)));
    }

    #[test]
    fn later_duplicate_wins() {
        let raw: RawCatalog = toml::from_str(
            r#"
            [[interaction]]
            name = "Nap"
            [interaction.effect]
            time_cost = 1

            [[interaction]]
            name = "Nap"
            [interaction.effect]
            time_cost = 4
            "#,
        )
        .expect("catalog should parse");
        let catalog = InteractionCatalog::from(raw);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("Nap").map(|d| d.effect.time_cost), Some(4));
    }
}
