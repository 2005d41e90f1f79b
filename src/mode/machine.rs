//! Guarded mode/scene state machine.
//!
//! The machine is the only writer of [`ModeState`]. Every accepted change
//! publishes a before event, mutates the state in one synchronous step,
//! re-applies the input layers and publishes an after event. Rejected
//! requests are logged, published as [`TransitionRejected`] and returned to
//! the caller.
use bevy::prelude::*;

use crate::{bus::EventBus, core::errors::OrchestrationError};

use super::{
    events::{
        GameStateChanged, GameStateChanging, InteractionModeChanged, InteractionModeChanging,
        SceneChanged, SceneChanging, SceneEntered, SceneExited, TransitionRejected,
    },
    state::{GameState, InputLayer, InteractionMode, ModeState, ModeTarget, SceneMode},
    transition::{SceneTransition, TransitionPhase, TransitionRejection},
};

pub const DEFAULT_SETTLE_SECONDS: f32 = 0.6;

#[derive(Resource, Debug)]
pub struct ModeStateMachine {
    state: ModeState,
    paused_from: Option<GameState>,
    transition: Option<SceneTransition>,
    settle_seconds: f32,
}

impl ModeStateMachine {
    pub fn new(initial: ModeState, settle_seconds: f32) -> Self {
        Self {
            state: initial,
            paused_from: None,
            transition: None,
            settle_seconds: settle_seconds.max(0.0),
        }
    }

    pub fn state(&self) -> ModeState {
        self.state
    }

    pub fn transition(&self) -> Option<&SceneTransition> {
        self.transition.as_ref()
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Player input is only routed during play and while no scene change runs.
    pub fn accepts_input(&self) -> bool {
        matches!(self.state.game, GameState::Gameplay | GameState::Dialog)
            && self.transition.is_none()
    }

    /// Applies the current state to every layer without changing anything.
    pub fn sync_layers(&self, layers: &mut [&mut dyn InputLayer]) {
        apply_layers(layers, &self.state);
    }

    pub fn request_game_state(
        &mut self,
        target: GameState,
        bus: &EventBus,
    ) -> Result<(), TransitionRejection> {
        let from = self.state.game;
        if from == target {
            return Err(self.reject(
                TransitionRejection::AlreadyActive {
                    requested: ModeTarget::Game(target),
                },
                bus,
            ));
        }
        if !self.game_transition_allowed(from, target) {
            return Err(self.reject(
                TransitionRejection::NotAllowed {
                    from: ModeTarget::Game(from),
                    to: ModeTarget::Game(target),
                },
                bus,
            ));
        }

        bus.publish(&GameStateChanging { from, to: target });
        self.paused_from = if target == GameState::Paused {
            Some(from)
        } else {
            None
        };
        self.state.game = target;
        info!(target: "mode", "Game state {} -> {}", from, target);
        bus.publish(&GameStateChanged { from, to: target });
        Ok(())
    }

    /// Toggles between paused and whatever state preceded the pause.
    pub fn toggle_pause(&mut self, bus: &EventBus) -> Result<(), TransitionRejection> {
        match (self.state.game, self.paused_from) {
            (GameState::Paused, Some(previous)) => self.request_game_state(previous, bus),
            _ => self.request_game_state(GameState::Paused, bus),
        }
    }

    /// Starts a multi-frame scene change. Only one may run at a time.
    pub fn request_scene(
        &mut self,
        target: SceneMode,
        bus: &EventBus,
    ) -> Result<(), TransitionRejection> {
        let requested = ModeTarget::Scene(target);
        if let Some(active) = &self.transition {
            let rejection = TransitionRejection::InFlight {
                requested,
                active: active.to(),
            };
            return Err(self.reject(rejection, bus));
        }
        if self.state.scene == target {
            return Err(self.reject(TransitionRejection::AlreadyActive { requested }, bus));
        }
        if self.state.game != GameState::Gameplay
            || self.state.interaction != InteractionMode::Overview
        {
            return Err(self.reject(self.blocked(requested), bus));
        }

        let from = self.state.scene;
        bus.publish(&SceneChanging { from, to: target });
        self.transition = Some(SceneTransition::new(from, target, self.settle_seconds));
        info!(target: "mode", "Scene transition {} -> {} started", from, target);
        Ok(())
    }

    pub fn request_interaction_mode(
        &mut self,
        target: InteractionMode,
        layers: &mut [&mut dyn InputLayer],
        bus: &EventBus,
    ) -> Result<(), TransitionRejection> {
        let requested = ModeTarget::Interaction(target);
        if let Some(active) = &self.transition {
            let rejection = TransitionRejection::InFlight {
                requested,
                active: active.to(),
            };
            return Err(self.reject(rejection, bus));
        }
        if self.state.interaction == target {
            return Err(self.reject(TransitionRejection::AlreadyActive { requested }, bus));
        }
        if !matches!(self.state.game, GameState::Gameplay | GameState::Dialog) {
            return Err(self.reject(self.blocked(requested), bus));
        }

        let from = self.state.interaction;
        bus.publish(&InteractionModeChanging { from, to: target });
        self.state.interaction = target;
        apply_layers(layers, &self.state);
        info!(target: "mode", "Interaction mode {} -> {}", from, target);
        bus.publish(&InteractionModeChanged { from, to: target });
        Ok(())
    }

    /// Moves both the interaction mode and the matching game state: entering
    /// dialog also moves gameplay to the dialog state, leaving it moves back.
    pub fn enter_interaction_mode(
        &mut self,
        target: InteractionMode,
        layers: &mut [&mut dyn InputLayer],
        bus: &EventBus,
    ) -> Result<(), TransitionRejection> {
        self.request_interaction_mode(target, layers, bus)?;
        let paired = match (target, self.state.game) {
            (InteractionMode::Dialog, GameState::Gameplay) => Some(GameState::Dialog),
            (InteractionMode::Overview, GameState::Dialog) => Some(GameState::Gameplay),
            _ => None,
        };
        match paired {
            Some(game) => self.request_game_state(game, bus),
            None => Ok(()),
        }
    }

    /// Advances an in-flight scene transition by one frame.
    pub fn tick(
        &mut self,
        delta_seconds: f32,
        layers: &mut [&mut dyn InputLayer],
        bus: &EventBus,
    ) -> Option<TransitionPhase> {
        let transition = self.transition.as_mut()?;
        let executed = transition.step(delta_seconds);
        let (from, to) = (transition.from(), transition.to());
        let complete = transition.is_complete();

        match executed {
            TransitionPhase::ExitCurrent => {
                bus.publish(&SceneExited { scene: from });
            }
            TransitionPhase::Swap => {
                self.state.scene = to;
                apply_layers(layers, &self.state);
            }
            TransitionPhase::EnterNew => {
                bus.publish(&SceneEntered { scene: to });
            }
            TransitionPhase::Settle | TransitionPhase::Complete => {}
        }

        if complete {
            self.transition = None;
            info!(target: "mode", "Scene transition {} -> {} complete", from, to);
            bus.publish(&SceneChanged { from, to });
        }
        Some(executed)
    }

    /// Snaps an in-flight transition to its terminal state, running any
    /// hooks it had not reached yet.
    pub fn finish_transition(&mut self, layers: &mut [&mut dyn InputLayer], bus: &EventBus) {
        let Some(transition) = self.transition.as_ref() else {
            return;
        };
        debug!(
            target: "mode",
            "Snapping scene transition {} -> {} from {:?}",
            transition.from(),
            transition.to(),
            transition.phase()
        );

        while self.transition.is_some() {
            self.tick(f32::INFINITY, layers, bus);
        }
    }

    /// Jumps straight to `scene` (used when restoring a snapshot). Any
    /// running transition is snapped first and the interaction mode drops
    /// back to overview.
    pub fn restore(
        &mut self,
        scene: SceneMode,
        layers: &mut [&mut dyn InputLayer],
        bus: &EventBus,
    ) {
        self.finish_transition(layers, bus);

        let from = self.state.scene;
        let previous_mode = self.state.interaction;
        let previous_game = self.state.game;
        self.state.scene = scene;
        self.state.interaction = InteractionMode::Overview;
        if previous_game == GameState::Dialog {
            self.state.game = GameState::Gameplay;
        }
        // Overview pairs with Gameplay, so unpausing must not resume a dialog.
        if self.paused_from == Some(GameState::Dialog) {
            self.paused_from = Some(GameState::Gameplay);
        }
        apply_layers(layers, &self.state);
        info!(target: "mode", "Mode restored to {}", self.state);

        if previous_game != self.state.game {
            bus.publish(&GameStateChanged {
                from: previous_game,
                to: self.state.game,
            });
        }
        if previous_mode != InteractionMode::Overview {
            bus.publish(&InteractionModeChanged {
                from: previous_mode,
                to: InteractionMode::Overview,
            });
        }
        if from != scene {
            bus.publish(&SceneChanged { from, to: scene });
        }
    }

    fn game_transition_allowed(&self, from: GameState, to: GameState) -> bool {
        match from {
            GameState::Menu => to == GameState::Gameplay,
            GameState::Gameplay => {
                matches!(to, GameState::Dialog | GameState::Paused | GameState::Menu)
            }
            GameState::Dialog => matches!(to, GameState::Gameplay | GameState::Paused),
            GameState::Paused => self.paused_from == Some(to),
        }
    }

    fn blocked(&self, requested: ModeTarget) -> TransitionRejection {
        TransitionRejection::Blocked {
            requested,
            game: self.state.game,
            interaction: self.state.interaction,
        }
    }

    fn reject(&self, rejection: TransitionRejection, bus: &EventBus) -> TransitionRejection {
        let error = OrchestrationError::from(rejection);
        match rejection {
            TransitionRejection::AlreadyActive { .. } => debug!(target: "mode", "{error}"),
            _ => warn!(target: "mode", "{error}"),
        }
        bus.publish(&TransitionRejected { rejection });
        rejection
    }
}

impl Default for ModeStateMachine {
    fn default() -> Self {
        Self::new(ModeState::default(), DEFAULT_SETTLE_SECONDS)
    }
}

fn apply_layers(layers: &mut [&mut dyn InputLayer], state: &ModeState) {
    for layer in layers.iter_mut() {
        layer.apply_mode(state);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::bus::BusInbox;

    use super::*;

    #[derive(Default)]
    struct RecordingLayer {
        applied: Vec<ModeState>,
    }

    impl InputLayer for RecordingLayer {
        fn apply_mode(&mut self, state: &ModeState) {
            self.applied.push(*state);
        }
    }

    fn machine() -> ModeStateMachine {
        ModeStateMachine::new(ModeState::gameplay(SceneMode::LocationA), 0.5)
    }

    fn run_to_completion(machine: &mut ModeStateMachine, layer: &mut RecordingLayer, bus: &EventBus) {
        for _ in 0..32 {
            if !machine.is_transitioning() {
                return;
            }
            machine.tick(0.1, &mut [&mut *layer], bus);
        }
        panic!("transition never completed");
    }

    #[test]
    fn paused_returns_only_to_previous_state() {
        let bus = EventBus::default();
        let mut machine = machine();

        machine
            .request_game_state(GameState::Dialog, &bus)
            .expect("gameplay -> dialog");
        machine.toggle_pause(&bus).expect("dialog -> paused");
        assert_eq!(machine.state().game, GameState::Paused);

        let rejection = machine
            .request_game_state(GameState::Gameplay, &bus)
            .expect_err("paused may only return to dialog");
        assert!(matches!(rejection, TransitionRejection::NotAllowed { .. }));

        machine.toggle_pause(&bus).expect("paused -> dialog");
        assert_eq!(machine.state().game, GameState::Dialog);
    }

    #[test]
    fn menu_only_leads_to_gameplay() {
        let bus = EventBus::default();
        let mut machine = ModeStateMachine::default();

        assert!(machine.request_game_state(GameState::Paused, &bus).is_err());
        assert!(machine.request_game_state(GameState::Gameplay, &bus).is_ok());
        assert!(machine.accepts_input());
    }

    #[test]
    fn scene_transition_runs_hooks_in_order() {
        let bus = EventBus::default();
        let order = Arc::new(Mutex::new(Vec::new()));
        for label in ["changing", "exited", "entered", "changed"] {
            let order = order.clone();
            match label {
                "changing" => bus.subscribe::<SceneChanging, _>(move |_| {
                    order.lock().unwrap().push(label);
                    Ok(())
                }),
                "exited" => bus.subscribe::<SceneExited, _>(move |_| {
                    order.lock().unwrap().push(label);
                    Ok(())
                }),
                "entered" => bus.subscribe::<SceneEntered, _>(move |_| {
                    order.lock().unwrap().push(label);
                    Ok(())
                }),
                _ => bus.subscribe::<SceneChanged, _>(move |_| {
                    order.lock().unwrap().push(label);
                    Ok(())
                }),
            };
        }

        let mut machine = machine();
        let mut layer = RecordingLayer::default();
        machine
            .request_scene(SceneMode::LocationB, &bus)
            .expect("scene change accepted");
        assert!(!machine.accepts_input());

        run_to_completion(&mut machine, &mut layer, &bus);

        assert_eq!(machine.state().scene, SceneMode::LocationB);
        assert_eq!(
            *order.lock().unwrap(),
            vec!["changing", "exited", "entered", "changed"]
        );
        assert_eq!(layer.applied.len(), 1);
        assert_eq!(layer.applied[0].scene, SceneMode::LocationB);
        assert!(machine.accepts_input());
    }

    #[test]
    fn concurrent_scene_request_is_rejected_mid_transition() {
        let bus = EventBus::default();
        let rejections = BusInbox::<TransitionRejected>::attach(&bus);
        let mut machine =
            ModeStateMachine::new(ModeState::gameplay(SceneMode::LocationB), 0.5);
        let mut layer = RecordingLayer::default();

        machine
            .request_scene(SceneMode::LocationA, &bus)
            .expect("first transition accepted");
        while machine
            .transition()
            .map(|transition| transition.progress() < 0.5)
            .unwrap_or(false)
        {
            machine.tick(0.05, &mut [&mut layer], &bus);
        }
        let halfway = machine.transition().map(SceneTransition::progress);
        assert!(matches!(halfway, Some(p) if (0.5..1.0).contains(&p)));

        let rejection = machine
            .request_scene(SceneMode::LocationB, &bus)
            .expect_err("second transition rejected");
        assert_eq!(
            rejection,
            TransitionRejection::InFlight {
                requested: ModeTarget::Scene(SceneMode::LocationB),
                active: SceneMode::LocationA,
            }
        );
        assert_eq!(rejections.drain().len(), 1);

        run_to_completion(&mut machine, &mut layer, &bus);
        assert_eq!(machine.state().scene, SceneMode::LocationA);
    }

    #[test]
    fn scene_change_blocked_in_dialog_mode() {
        let bus = EventBus::default();
        let mut machine = machine();
        let mut layer = RecordingLayer::default();

        machine
            .request_interaction_mode(InteractionMode::Dialog, &mut [&mut layer], &bus)
            .expect("overview -> dialog");
        assert_eq!(layer.applied.last().map(|s| s.interaction), Some(InteractionMode::Dialog));

        let rejection = machine
            .request_scene(SceneMode::LocationB, &bus)
            .expect_err("scene change blocked in dialog");
        assert!(matches!(rejection, TransitionRejection::Blocked { .. }));
    }

    #[test]
    fn mode_change_rejected_during_scene_transition() {
        let bus = EventBus::default();
        let mut machine = machine();
        let mut layer = RecordingLayer::default();

        machine.request_scene(SceneMode::LocationB, &bus).unwrap();
        let rejection = machine
            .request_interaction_mode(InteractionMode::Dialog, &mut [&mut layer], &bus)
            .expect_err("in flight");
        assert!(matches!(rejection, TransitionRejection::InFlight { .. }));
        assert!(layer.applied.is_empty());
    }

    #[test]
    fn finish_transition_snaps_to_terminal_state() {
        let bus = EventBus::default();
        let changed = BusInbox::<SceneChanged>::attach(&bus);
        let mut machine = machine();
        let mut layer = RecordingLayer::default();

        machine.request_scene(SceneMode::LocationB, &bus).unwrap();
        machine.tick(0.0, &mut [&mut layer], &bus);
        machine.finish_transition(&mut [&mut layer], &bus);

        assert!(!machine.is_transitioning());
        assert_eq!(machine.state().scene, SceneMode::LocationB);
        assert_eq!(
            changed.drain(),
            vec![SceneChanged {
                from: SceneMode::LocationA,
                to: SceneMode::LocationB
            }]
        );
    }

    #[test]
    fn entering_dialog_moves_game_state_along() {
        let bus = EventBus::default();
        let mut machine = machine();
        let mut layer = RecordingLayer::default();

        machine
            .enter_interaction_mode(InteractionMode::Dialog, &mut [&mut layer], &bus)
            .expect("overview -> dialog");
        assert_eq!(machine.state().game, GameState::Dialog);
        assert_eq!(machine.state().interaction, InteractionMode::Dialog);

        machine
            .enter_interaction_mode(InteractionMode::Overview, &mut [&mut layer], &bus)
            .expect("dialog -> overview");
        assert_eq!(machine.state(), ModeState::gameplay(SceneMode::LocationA));
    }

    #[test]
    fn restore_resets_mode_and_scene() {
        let bus = EventBus::default();
        let mut machine = machine();
        let mut layer = RecordingLayer::default();
        machine
            .request_interaction_mode(InteractionMode::Dialog, &mut [&mut layer], &bus)
            .unwrap();

        machine.restore(SceneMode::LocationB, &mut [&mut layer], &bus);
        let state = machine.state();
        assert_eq!(state.scene, SceneMode::LocationB);
        assert_eq!(state.interaction, InteractionMode::Overview);
        assert_eq!(layer.applied.last().copied(), Some(state));
    }

    #[test]
    fn restore_while_paused_in_dialog_resumes_into_gameplay() {
        let bus = EventBus::default();
        let mut machine = machine();
        let mut layer = RecordingLayer::default();
        machine
            .enter_interaction_mode(InteractionMode::Dialog, &mut [&mut layer], &bus)
            .expect("overview -> dialog");
        machine.toggle_pause(&bus).expect("dialog -> paused");

        machine.restore(SceneMode::LocationB, &mut [&mut layer], &bus);
        assert_eq!(machine.state().game, GameState::Paused);

        machine.toggle_pause(&bus).expect("paused -> gameplay");
        assert_eq!(machine.state(), ModeState::gameplay(SceneMode::LocationB));
        machine
            .request_scene(SceneMode::LocationA, &bus)
            .expect("travel works again after unpausing");
    }
}
