//! Single entry point for every player-initiated interaction.
//!
//! Surfaces and anchors never touch game state themselves; they call
//! [`InteractionDispatcher::trigger_interaction`], which enforces one
//! request in flight per target, consults the gate and announces the
//! outcome on the bus.
use std::collections::HashMap;

use bevy::prelude::*;

use crate::{
    bus::{BusInbox, EventBus},
    core::errors::OrchestrationError,
    mode::ModeStateMachine,
    stats::{GameFlags, NumericStore},
    world::time::GameClock,
};

use super::{
    catalog::InteractionCatalog,
    events::{InteractionCompleted, InteractionDenied, InteractionStarted},
    gate::{ConditionGate, CooldownLedger, DenialReason, GateInputs},
    types::{InteractionRequest, RequestId, TargetId},
};

/// Read-only world state needed to accept a request.
pub struct DispatchContext<'a> {
    pub gate: &'a ConditionGate,
    pub catalog: &'a InteractionCatalog,
    pub stats: &'a dyn NumericStore,
    pub flags: &'a GameFlags,
    pub clock: &'a GameClock,
    pub mode: &'a ModeStateMachine,
    pub now_seconds: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Started(RequestId),
    Denied(Vec<DenialReason>),
    /// The target already has a request in flight.
    Ignored { in_flight: RequestId },
    /// Input is not accepted in the current game state.
    Blocked,
}

impl DispatchOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct InFlight {
    request: RequestId,
    name: String,
}

#[derive(Resource, Debug)]
pub struct InteractionDispatcher {
    in_flight: HashMap<TargetId, InFlight>,
    cooldowns: CooldownLedger,
    next_request: u64,
    completions: BusInbox<InteractionCompleted>,
}

impl InteractionDispatcher {
    pub fn new(bus: &EventBus) -> Self {
        Self {
            in_flight: HashMap::new(),
            cooldowns: CooldownLedger::default(),
            next_request: 1,
            completions: BusInbox::attach(bus),
        }
    }

    pub fn cooldowns(&self) -> &CooldownLedger {
        &self.cooldowns
    }

    pub fn is_in_flight(&self, target: &TargetId) -> bool {
        self.in_flight.contains_key(target)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Builds gate inputs from `context` plus this dispatcher's cooldowns.
    pub fn gate_inputs<'a>(&'a self, context: &DispatchContext<'a>) -> GateInputs<'a> {
        GateInputs {
            stats: context.stats,
            flags: context.flags,
            slot: context.clock.slot(),
            mode: context.mode.state(),
            cooldowns: &self.cooldowns,
            now_seconds: context.now_seconds,
        }
    }

    pub fn trigger_interaction(
        &mut self,
        name: &str,
        target: &TargetId,
        context: &DispatchContext<'_>,
        bus: &EventBus,
    ) -> DispatchOutcome {
        self.collect_completions();

        if !context.mode.accepts_input() {
            debug!(
                target: "dispatch",
                "Dropping `{}` on {}: input blocked in {}",
                name,
                target,
                context.mode.state()
            );
            return DispatchOutcome::Blocked;
        }

        if let Some(active) = self.in_flight.get(target) {
            let error = OrchestrationError::ConcurrentRequestIgnored {
                name: name.to_string(),
                target: target.clone(),
                in_flight: active.request,
            };
            debug!(target: "dispatch", "{error} (`{}`)", active.name);
            return DispatchOutcome::Ignored {
                in_flight: active.request,
            };
        }

        let verdict = context.gate.check_interaction_detailed(
            name,
            context.catalog,
            &self.gate_inputs(context),
        );
        if !verdict.allowed {
            let reasons = verdict.reason_texts();
            let error = OrchestrationError::ConditionDenied {
                name: name.to_string(),
                reasons: reasons.clone(),
            };
            info!(target: "dispatch", "{error}");
            bus.publish(&InteractionDenied {
                name: name.to_string(),
                target: target.clone(),
                reasons,
            });
            return DispatchOutcome::Denied(verdict.reasons);
        }

        let id = RequestId::new(self.next_request);
        self.next_request += 1;
        let request = InteractionRequest {
            id,
            name: name.to_string(),
            target: target.clone(),
            requested_at: context.now_seconds,
        };
        self.in_flight.insert(
            target.clone(),
            InFlight {
                request: id,
                name: name.to_string(),
            },
        );
        self.cooldowns.record(name, context.now_seconds);

        info!(target: "dispatch", "Starting `{}` on {} as {}", name, target, id);
        bus.publish(&InteractionStarted { request });
        DispatchOutcome::Started(id)
    }

    /// Clears in-flight marks for every completion received so far.
    pub fn collect_completions(&mut self) -> usize {
        let completed = self.completions.drain();
        for completion in &completed {
            self.release(&completion.request.target, completion.request.id);
        }
        completed.len()
    }

    /// Drops every in-flight mark. Cooldowns survive.
    pub fn reset(&mut self) {
        self.collect_completions();
        if !self.in_flight.is_empty() {
            debug!(target: "dispatch", "Clearing {} in-flight request(s)", self.in_flight.len());
        }
        self.in_flight.clear();
    }

    fn release(&mut self, target: &TargetId, request: RequestId) {
        match self.in_flight.get(target) {
            Some(active) if active.request == request => {
                self.in_flight.remove(target);
                debug!(target: "dispatch", "{} on {} complete", request, target);
            }
            Some(active) => debug!(
                target: "dispatch",
                "Stale completion {} for {} (in flight: {})",
                request,
                target,
                active.request
            ),
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{
        interaction::types::{
            GateRule, InteractionCategory, InteractionDescriptor, InteractionResult,
        },
        mode::state::{GameState, ModeState, SceneMode},
        stats::GameStats,
    };

    struct Harness {
        bus: EventBus,
        gate: ConditionGate,
        catalog: InteractionCatalog,
        stats: GameStats,
        flags: GameFlags,
        clock: GameClock,
        mode: ModeStateMachine,
        now: f64,
    }

    impl Harness {
        fn new() -> Self {
            let mut catalog = InteractionCatalog::default();
            catalog.insert(
                InteractionDescriptor::new("HelpWork", InteractionCategory::Work)
                    .with_rule(GateRule::default().with_slots(1..=6)),
            );
            catalog.insert(InteractionDescriptor::new("CatPlay", InteractionCategory::Play));
            Self {
                bus: EventBus::default(),
                gate: ConditionGate::default(),
                catalog,
                stats: GameStats::default(),
                flags: GameFlags::default(),
                clock: GameClock::default(),
                mode: ModeStateMachine::new(ModeState::gameplay(SceneMode::LocationA), 0.0),
                now: 0.0,
            }
        }

        fn context(&self) -> DispatchContext<'_> {
            DispatchContext {
                gate: &self.gate,
                catalog: &self.catalog,
                stats: &self.stats,
                flags: &self.flags,
                clock: &self.clock,
                mode: &self.mode,
                now_seconds: self.now,
            }
        }

        fn complete(&self, started: &InteractionStarted) {
            let result = InteractionResult::resolve(started.request.clone(), None);
            self.bus.publish(&InteractionCompleted {
                request: result.request,
                success: true,
                message: result.message,
                travel_to: None,
                enter_mode: None,
            });
        }
    }

    #[test]
    fn second_trigger_on_busy_target_is_ignored() {
        let world = Harness::new();
        let started = BusInbox::<InteractionStarted>::attach(&world.bus);
        let mut dispatcher = InteractionDispatcher::new(&world.bus);
        let cat = TargetId::new("cat");

        let first = dispatcher.trigger_interaction("CatPlay", &cat, &world.context(), &world.bus);
        let second = dispatcher.trigger_interaction("CatPlay", &cat, &world.context(), &world.bus);

        let DispatchOutcome::Started(id) = first else {
            panic!("first trigger should start, got {first:?}");
        };
        assert_eq!(second, DispatchOutcome::Ignored { in_flight: id });
        assert_eq!(started.len(), 1);
        assert!(dispatcher.is_in_flight(&cat));
    }

    #[test]
    fn completion_frees_the_target() {
        let world = Harness::new();
        let started = BusInbox::<InteractionStarted>::attach(&world.bus);
        let mut dispatcher = InteractionDispatcher::new(&world.bus);
        let cat = TargetId::new("cat");

        dispatcher.trigger_interaction("CatPlay", &cat, &world.context(), &world.bus);
        for event in started.drain() {
            world.complete(&event);
        }

        let again = dispatcher.trigger_interaction("CatPlay", &cat, &world.context(), &world.bus);
        assert!(again.is_started());
    }

    #[test]
    fn denial_publishes_reasons_and_leaves_target_free() {
        let mut world = Harness::new();
        world.clock.set(crate::world::time::ClockReading { day: 1, slot: 8 });
        let denied = Arc::new(Mutex::new(Vec::new()));
        let sink = denied.clone();
        world.bus.subscribe::<InteractionDenied, _>(move |event| {
            sink.lock().unwrap().push(event.clone());
            Ok(())
        });
        let started = BusInbox::<InteractionStarted>::attach(&world.bus);
        let mut dispatcher = InteractionDispatcher::new(&world.bus);
        let desk = TargetId::new("desk");

        let outcome = dispatcher.trigger_interaction("HelpWork", &desk, &world.context(), &world.bus);

        assert!(matches!(outcome, DispatchOutcome::Denied(ref reasons) if reasons.len() == 1));
        let denied = denied.lock().unwrap();
        assert_eq!(denied.len(), 1);
        assert!(denied[0].reasons[0].contains("time slot"));
        assert!(started.is_empty());
        assert!(!dispatcher.is_in_flight(&desk));
    }

    #[test]
    fn input_is_blocked_while_paused_or_transitioning() {
        let mut world = Harness::new();
        let mut dispatcher = InteractionDispatcher::new(&world.bus);
        let cat = TargetId::new("cat");

        world.mode.request_game_state(GameState::Paused, &world.bus).unwrap();
        let outcome = dispatcher.trigger_interaction("CatPlay", &cat, &world.context(), &world.bus);
        assert_eq!(outcome, DispatchOutcome::Blocked);

        world.mode.toggle_pause(&world.bus).unwrap();
        world.mode.request_scene(SceneMode::LocationB, &world.bus).unwrap();
        let outcome = dispatcher.trigger_interaction("CatPlay", &cat, &world.context(), &world.bus);
        assert_eq!(outcome, DispatchOutcome::Blocked);
        assert_eq!(dispatcher.in_flight_count(), 0);
    }

    #[test]
    fn cooldown_starts_at_dispatch() {
        let mut world = Harness::new();
        world.now = 42.0;
        let mut dispatcher = InteractionDispatcher::new(&world.bus);

        dispatcher.trigger_interaction("CatPlay", &TargetId::new("cat"), &world.context(), &world.bus);
        assert_eq!(dispatcher.cooldowns().last_started("CatPlay"), Some(42.0));
    }

    #[test]
    fn reset_clears_in_flight_marks() {
        let world = Harness::new();
        let mut dispatcher = InteractionDispatcher::new(&world.bus);
        let cat = TargetId::new("cat");

        dispatcher.trigger_interaction("CatPlay", &cat, &world.context(), &world.bus);
        dispatcher.reset();
        assert!(!dispatcher.is_in_flight(&cat));
    }
}
