//! Pure predicate evaluation over stats, clock, mode, flags and cooldowns.
//!
//! The gate never mutates anything it reads. `check_interaction` may stop at
//! the first failing predicate; `check_interaction_detailed` evaluates all of
//! them so the player can be told every reason at once.
use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::{Mutex, PoisonError},
};

use bevy::prelude::*;

use crate::{
    core::errors::OrchestrationError,
    mode::state::{InteractionMode, ModeState, SceneMode},
    stats::{GameFlags, NumericStore, StatKey},
};

use super::{
    catalog::InteractionCatalog,
    types::{GateRule, TimeSlotSet},
};

/// Last successful dispatch time per interaction, in simulation seconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CooldownLedger {
    last_started: HashMap<String, f64>,
}

impl CooldownLedger {
    pub fn record(&mut self, name: &str, now_seconds: f64) {
        self.last_started.insert(name.to_string(), now_seconds);
    }

    pub fn last_started(&self, name: &str) -> Option<f64> {
        self.last_started.get(name).copied()
    }

    /// Seconds left before `name` may run again; zero when ready.
    pub fn remaining(&self, name: &str, cooldown_seconds: f32, now_seconds: f64) -> f32 {
        let Some(last) = self.last_started(name) else {
            return 0.0;
        };
        let elapsed = (now_seconds - last).max(0.0);
        (f64::from(cooldown_seconds) - elapsed).max(0.0) as f32
    }

    pub fn clear(&mut self) {
        self.last_started.clear();
    }
}

/// Everything a rule can look at. Borrowed for a single check.
#[derive(Clone, Copy)]
pub struct GateInputs<'a> {
    pub stats: &'a dyn NumericStore,
    pub flags: &'a GameFlags,
    pub slot: u8,
    pub mode: ModeState,
    pub cooldowns: &'a CooldownLedger,
    pub now_seconds: f64,
}

/// One failed predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum DenialReason {
    BelowMinimum { key: StatKey, value: f32, min: f32 },
    AboveMaximum { key: StatKey, value: f32, max: f32 },
    OutsideTimeSlots { slot: u8, allowed: TimeSlotSet },
    WrongScene { required: SceneMode, current: SceneMode },
    WrongMode { required: InteractionMode, current: InteractionMode },
    MissingFlag { flag: String },
    ForbiddenFlag { flag: String },
    CoolingDown { remaining_seconds: f32 },
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BelowMinimum { key, value, min } => {
                write!(f, "{key} is {value:.0}, needs at least {min:.0}")
            }
            Self::AboveMaximum { key, value, max } => {
                write!(f, "{key} is {value:.0}, must be at most {max:.0}")
            }
            Self::OutsideTimeSlots { slot, allowed } => {
                write!(f, "time slot {slot} is outside the allowed slots {allowed}")
            }
            Self::WrongScene { required, current } => {
                write!(f, "only available in {required} (currently {current})")
            }
            Self::WrongMode { required, current } => {
                write!(f, "only available in {required} mode (currently {current})")
            }
            Self::MissingFlag { flag } => write!(f, "requires `{flag}`"),
            Self::ForbiddenFlag { flag } => write!(f, "not available once `{flag}` is set"),
            Self::CoolingDown { remaining_seconds } => {
                write!(f, "cooling down for {remaining_seconds:.1}s")
            }
        }
    }
}

/// Full evaluation of a rule.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GateVerdict {
    pub allowed: bool,
    pub reasons: Vec<DenialReason>,
    /// No descriptor existed; allowed by default.
    pub unconfigured: bool,
    pub bypassed: bool,
}

impl GateVerdict {
    fn allow() -> Self {
        Self {
            allowed: true,
            ..Self::default()
        }
    }

    pub fn reason_texts(&self) -> Vec<String> {
        self.reasons.iter().map(ToString::to_string).collect()
    }
}

/// Stateless apart from its bypass switch and the set of names already
/// reported as unconfigured.
#[derive(Resource, Debug, Default)]
pub struct ConditionGate {
    bypass: bool,
    reported_missing: Mutex<HashSet<String>>,
}

impl ConditionGate {
    pub fn new(bypass: bool) -> Self {
        if bypass {
            warn!(target: "gate", "Condition gate bypass is ON; every interaction will be allowed");
        }
        Self {
            bypass,
            reported_missing: Mutex::default(),
        }
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypass
    }

    pub fn set_bypass(&mut self, bypass: bool) {
        if bypass != self.bypass {
            info!(target: "gate", "Condition gate bypass set to {}", bypass);
        }
        self.bypass = bypass;
    }

    /// Boolean check; stops at the first failing predicate.
    pub fn check_interaction(
        &self,
        name: &str,
        catalog: &InteractionCatalog,
        inputs: &GateInputs<'_>,
    ) -> bool {
        if let Some(verdict) = self.pre_check(name, catalog) {
            return verdict.allowed;
        }
        catalog
            .get(name)
            .map(|descriptor| evaluate(name, &descriptor.rule, inputs, true).is_empty())
            .unwrap_or(true)
    }

    /// Evaluates every predicate and collects each failure.
    pub fn check_interaction_detailed(
        &self,
        name: &str,
        catalog: &InteractionCatalog,
        inputs: &GateInputs<'_>,
    ) -> GateVerdict {
        if let Some(verdict) = self.pre_check(name, catalog) {
            return verdict;
        }
        let reasons = catalog
            .get(name)
            .map(|descriptor| evaluate(name, &descriptor.rule, inputs, false))
            .unwrap_or_default();

        GateVerdict {
            allowed: reasons.is_empty(),
            reasons,
            ..GateVerdict::default()
        }
    }

    fn pre_check(&self, name: &str, catalog: &InteractionCatalog) -> Option<GateVerdict> {
        if self.bypass {
            info!(target: "gate", "Bypass: allowing `{}` without evaluation", name);
            return Some(GateVerdict {
                bypassed: true,
                ..GateVerdict::allow()
            });
        }
        if catalog.contains(name) {
            return None;
        }

        let first_report = self
            .reported_missing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string());
        let error = OrchestrationError::ConfigurationMissing {
            name: name.to_string(),
        };
        if first_report {
            warn!(target: "gate", "{error}");
        } else {
            debug!(target: "gate", "{error}");
        }
        Some(GateVerdict {
            unconfigured: true,
            ..GateVerdict::allow()
        })
    }
}

type Predicate = fn(&GateRule, &GateInputs<'_>, &mut Vec<DenialReason>);

/// Fixed evaluation order; the cooldown check runs last.
const PREDICATES: [Predicate; 4] = [
    check_thresholds,
    check_time_slot,
    check_scene_and_mode,
    check_flags,
];

fn evaluate(
    name: &str,
    rule: &GateRule,
    inputs: &GateInputs<'_>,
    short_circuit: bool,
) -> Vec<DenialReason> {
    let mut reasons = Vec::new();
    for predicate in PREDICATES {
        predicate(rule, inputs, &mut reasons);
        if short_circuit && !reasons.is_empty() {
            return reasons;
        }
    }
    check_cooldown(name, rule, inputs, &mut reasons);
    reasons
}

fn check_thresholds(rule: &GateRule, inputs: &GateInputs<'_>, out: &mut Vec<DenialReason>) {
    for threshold in &rule.thresholds {
        let value = inputs.stats.value(threshold.key);
        if let Some(min) = threshold.min.filter(|min| value < *min) {
            out.push(DenialReason::BelowMinimum {
                key: threshold.key,
                value,
                min,
            });
        }
        if let Some(max) = threshold.max.filter(|max| value > *max) {
            out.push(DenialReason::AboveMaximum {
                key: threshold.key,
                value,
                max,
            });
        }
    }
}

fn check_time_slot(rule: &GateRule, inputs: &GateInputs<'_>, out: &mut Vec<DenialReason>) {
    if let Some(allowed) = rule.time_slots.as_ref() {
        if !allowed.contains(inputs.slot) {
            out.push(DenialReason::OutsideTimeSlots {
                slot: inputs.slot,
                allowed: allowed.clone(),
            });
        }
    }
}

fn check_scene_and_mode(rule: &GateRule, inputs: &GateInputs<'_>, out: &mut Vec<DenialReason>) {
    if let Some(required) = rule.scene.filter(|scene| *scene != inputs.mode.scene) {
        out.push(DenialReason::WrongScene {
            required,
            current: inputs.mode.scene,
        });
    }
    if let Some(required) = rule
        .interaction_mode
        .filter(|mode| *mode != inputs.mode.interaction)
    {
        out.push(DenialReason::WrongMode {
            required,
            current: inputs.mode.interaction,
        });
    }
}

fn check_flags(rule: &GateRule, inputs: &GateInputs<'_>, out: &mut Vec<DenialReason>) {
    for flag in rule.required_flags.iter().filter(|flag| !inputs.flags.is_set(flag)) {
        out.push(DenialReason::MissingFlag { flag: flag.clone() });
    }
    for flag in rule.forbidden_flags.iter().filter(|flag| inputs.flags.is_set(flag)) {
        out.push(DenialReason::ForbiddenFlag { flag: flag.clone() });
    }
}

fn check_cooldown(
    name: &str,
    rule: &GateRule,
    inputs: &GateInputs<'_>,
    out: &mut Vec<DenialReason>,
) {
    if rule.cooldown_seconds <= 0.0 {
        return;
    }
    let remaining = inputs
        .cooldowns
        .remaining(name, rule.cooldown_seconds, inputs.now_seconds);
    if remaining > 0.0 {
        out.push(DenialReason::CoolingDown {
            remaining_seconds: remaining,
        });
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::{
        interaction::types::{InteractionCategory, InteractionDescriptor, StatThreshold},
        mode::state::GameState,
        stats::GameStats,
    };

    struct Fixture {
        stats: GameStats,
        flags: GameFlags,
        cooldowns: CooldownLedger,
        slot: u8,
        mode: ModeState,
        now: f64,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                stats: GameStats::default(),
                flags: GameFlags::default(),
                cooldowns: CooldownLedger::default(),
                slot: 1,
                mode: ModeState::gameplay(SceneMode::LocationA),
                now: 0.0,
            }
        }

        fn inputs(&self) -> GateInputs<'_> {
            GateInputs {
                stats: &self.stats,
                flags: &self.flags,
                slot: self.slot,
                mode: self.mode,
                cooldowns: &self.cooldowns,
                now_seconds: self.now,
            }
        }
    }

    fn catalog_with(rule: GateRule) -> InteractionCatalog {
        let mut catalog = InteractionCatalog::default();
        catalog.insert(InteractionDescriptor::new("HelpWork", InteractionCategory::Work).with_rule(rule));
        catalog
    }

    #[test]
    fn late_slot_denial_mentions_time_slot() {
        let catalog = catalog_with(GateRule::default().with_slots(1..=6));
        let mut fixture = Fixture::new();
        fixture.slot = 8;
        let gate = ConditionGate::default();

        assert!(!gate.check_interaction("HelpWork", &catalog, &fixture.inputs()));
        let verdict = gate.check_interaction_detailed("HelpWork", &catalog, &fixture.inputs());
        assert!(!verdict.allowed);
        assert!(verdict.reason_texts().iter().any(|text| text.contains("time slot")));

        fixture.slot = 6;
        assert!(gate.check_interaction("HelpWork", &catalog, &fixture.inputs()));
    }

    #[test]
    fn detailed_check_reports_every_failure() {
        let rule = GateRule::default()
            .with_threshold(StatThreshold::at_least(StatKey::Money, 1_000.0))
            .with_slots(2..=3)
            .in_scene(SceneMode::LocationB)
            .requires_flag("met_boss");
        let catalog = catalog_with(rule);
        let fixture = Fixture::new();
        let gate = ConditionGate::default();

        let verdict = gate.check_interaction_detailed("HelpWork", &catalog, &fixture.inputs());
        assert_eq!(verdict.reasons.len(), 4);
        assert!(matches!(verdict.reasons[0], DenialReason::BelowMinimum { .. }));
        assert!(matches!(verdict.reasons[1], DenialReason::OutsideTimeSlots { .. }));
        assert!(matches!(verdict.reasons[2], DenialReason::WrongScene { .. }));
        assert!(matches!(verdict.reasons[3], DenialReason::MissingFlag { .. }));
    }

    #[test]
    fn empty_rule_and_unknown_names_pass() {
        let catalog = catalog_with(GateRule::default());
        let fixture = Fixture::new();
        let gate = ConditionGate::default();

        assert!(gate.check_interaction("HelpWork", &catalog, &fixture.inputs()));
        let verdict = gate.check_interaction_detailed("Juggle", &catalog, &fixture.inputs());
        assert!(verdict.allowed);
        assert!(verdict.unconfigured);
        // Second lookup of the same missing name stays allowed.
        assert!(gate.check_interaction("Juggle", &catalog, &fixture.inputs()));
    }

    #[test]
    fn bypass_allows_everything() {
        let catalog = catalog_with(GateRule::default().in_mode(InteractionMode::Dialog));
        let fixture = Fixture::new();
        let gate = ConditionGate::new(true);

        let verdict = gate.check_interaction_detailed("HelpWork", &catalog, &fixture.inputs());
        assert!(verdict.allowed && verdict.bypassed);
    }

    #[test]
    fn forbidden_flags_and_mode_are_checked() {
        let rule = GateRule::default()
            .in_mode(InteractionMode::Dialog)
            .forbids_flag("asked_raise");
        let catalog = catalog_with(rule);
        let mut fixture = Fixture::new();
        fixture.flags.set("asked_raise");
        fixture.mode = ModeState::new(GameState::Dialog, SceneMode::LocationA, InteractionMode::Dialog);
        let gate = ConditionGate::default();

        let verdict = gate.check_interaction_detailed("HelpWork", &catalog, &fixture.inputs());
        assert_eq!(
            verdict.reasons,
            vec![DenialReason::ForbiddenFlag {
                flag: "asked_raise".into()
            }]
        );
    }

    #[test]
    fn cooldown_expires_with_simulation_time() {
        let catalog = catalog_with(GateRule::default().with_cooldown(5.0));
        let mut fixture = Fixture::new();
        fixture.cooldowns.record("HelpWork", 10.0);
        let gate = ConditionGate::default();

        fixture.now = 12.0;
        let verdict = gate.check_interaction_detailed("HelpWork", &catalog, &fixture.inputs());
        assert!(matches!(
            verdict.reasons.as_slice(),
            [DenialReason::CoolingDown { remaining_seconds }] if (*remaining_seconds - 3.0).abs() < 1e-4
        ));

        fixture.now = 15.0;
        assert!(gate.check_interaction("HelpWork", &catalog, &fixture.inputs()));
    }

    proptest! {
        // Lowering a minimum or raising a maximum never turns an allowed
        // check into a denial.
        #[test]
        fn relaxing_thresholds_is_monotonic(
            money in 0.0f32..2_000.0,
            min in 0.0f32..2_000.0,
            max in 0.0f32..2_000.0,
            slack_min in 0.0f32..500.0,
            slack_max in 0.0f32..500.0,
        ) {
            let mut fixture = Fixture::new();
            fixture.stats.set_value(StatKey::Money, money);
            let gate = ConditionGate::default();

            let strict = catalog_with(GateRule::default().with_threshold(StatThreshold {
                key: StatKey::Money,
                min: Some(min),
                max: Some(max),
            }));
            let relaxed = catalog_with(GateRule::default().with_threshold(StatThreshold {
                key: StatKey::Money,
                min: Some(min - slack_min),
                max: Some(max + slack_max),
            }));

            if gate.check_interaction("HelpWork", &strict, &fixture.inputs()) {
                prop_assert!(gate.check_interaction("HelpWork", &relaxed, &fixture.inputs()));
            }
        }
    }
}
