use bevy::{ecs::system::SystemParam, prelude::*};

use crate::{
    bus::{BusInbox, EventBus},
    core::SimulationClock,
    interaction::events::InteractionCompleted,
    ui::{anchor::ScreenAnchors, surface::StaticSurfaces},
};

use super::{
    machine::ModeStateMachine,
    state::{GameState, InputLayer},
};

/// Mutable access to whichever input layers the app registered. Headless
/// apps may run without either.
#[derive(SystemParam)]
pub struct InputLayers<'w> {
    surfaces: Option<ResMut<'w, StaticSurfaces>>,
    anchors: Option<ResMut<'w, ScreenAnchors>>,
}

impl InputLayers<'_> {
    pub fn as_layers(&mut self) -> Vec<&mut dyn InputLayer> {
        let mut layers: Vec<&mut dyn InputLayer> = Vec::with_capacity(2);
        if let Some(surfaces) = self.surfaces.as_deref_mut() {
            layers.push(surfaces);
        }
        if let Some(anchors) = self.anchors.as_deref_mut() {
            layers.push(anchors);
        }
        layers
    }
}

/// Turns successful interaction completions into travel and mode requests.
#[derive(Resource)]
pub struct ModeDirector {
    completions: BusInbox<InteractionCompleted>,
}

impl ModeDirector {
    pub fn new(bus: &EventBus) -> Self {
        Self {
            completions: BusInbox::attach(bus),
        }
    }
}

impl FromWorld for ModeDirector {
    fn from_world(world: &mut World) -> Self {
        let bus = world.get_resource_or_init::<EventBus>().clone();
        Self::new(&bus)
    }
}

pub(super) fn enter_gameplay(
    mut machine: ResMut<ModeStateMachine>,
    mut layers: InputLayers,
    bus: Res<EventBus>,
) {
    if machine.state().game == GameState::Menu {
        if let Err(rejection) = machine.request_game_state(GameState::Gameplay, &bus) {
            warn!(target: "mode", "Could not leave the menu: {}", rejection);
        }
    }
    machine.sync_layers(&mut layers.as_layers());
}

pub(super) fn toggle_pause_on_escape(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut machine: ResMut<ModeStateMachine>,
    bus: Res<EventBus>,
) {
    if keys.is_some_and(|keys| keys.just_pressed(KeyCode::Escape)) {
        let _ = machine.toggle_pause(&bus);
    }
}

pub(super) fn route_completed_interactions(
    director: Res<ModeDirector>,
    mut machine: ResMut<ModeStateMachine>,
    mut layers: InputLayers,
    bus: Res<EventBus>,
) {
    for completed in director.completions.drain() {
        if !completed.success {
            continue;
        }
        if let Some(scene) = completed.travel_to {
            debug!(
                target: "mode",
                "{} {} requests travel to {}",
                completed.request.name, completed.request.id, scene
            );
            let _ = machine.request_scene(scene, &bus);
        }
        if let Some(mode) = completed.enter_mode {
            debug!(
                target: "mode",
                "{} {} requests {} mode",
                completed.request.name, completed.request.id, mode
            );
            let _ = machine.enter_interaction_mode(mode, &mut layers.as_layers(), &bus);
        }
    }
}

/// Steps a running scene change on simulation time; a paused game holds
/// the transition where it is.
pub(super) fn advance_scene_transition(
    simulation: Res<SimulationClock>,
    mut machine: ResMut<ModeStateMachine>,
    mut layers: InputLayers,
    bus: Res<EventBus>,
) {
    if !machine.is_transitioning() || machine.state().game == GameState::Paused {
        return;
    }
    machine.tick(simulation.delta_secs(), &mut layers.as_layers(), &bus);
}

/// Freezes simulation time while the game is paused.
pub(super) fn sync_simulation_pause(
    machine: Res<ModeStateMachine>,
    mut simulation: ResMut<SimulationClock>,
) {
    let paused = machine.state().game == GameState::Paused;
    if simulation.is_paused() != paused {
        simulation.set_paused(paused);
        info!(target: "mode", "Simulation {}", if paused { "paused" } else { "resumed" });
    }
}
