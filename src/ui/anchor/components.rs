// src/ui/anchor/components.rs
//
// Tracked actors, their hit-region entities and the per-frame anchor state.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::{
    interaction::types::TargetId,
    mode::state::{InputLayer, InteractionMode, ModeState},
    ui::config::AnchorSettings,
};

use super::projection::{place_anchor, smooth_toward, Projector, ScreenRect};

/// Marks a moving world-space actor that owns a clickable screen region.
#[derive(Component, Debug, Clone)]
pub struct TrackedActor {
    pub target: TargetId,
    /// Interaction fired when the region is clicked.
    pub interaction: String,
    /// World-space offset from the actor origin (e.g. above the head).
    pub offset: Vec3,
}

impl TrackedActor {
    pub fn new(target: impl Into<String>, interaction: impl Into<String>) -> Self {
        Self {
            target: TargetId::new(target),
            interaction: interaction.into(),
            offset: Vec3::ZERO,
        }
    }

    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }
}

/// UI button that follows a tracked actor on screen.
#[derive(Component, Debug, Clone, Copy)]
pub struct AnchorHitRegion {
    pub actor: Entity,
}

/// Per-actor anchor state, recomputed every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorState {
    pub target: TargetId,
    pub interaction: String,
    pub world_position: Vec3,
    /// Displayed (possibly smoothed) centre of the region.
    pub screen_position: Vec2,
    pub visible: bool,
}

/// Result of a successful anchor hit-test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorHit {
    pub actor: Entity,
    pub interaction: String,
    pub target: TargetId,
}

#[derive(Resource, Debug, Clone)]
pub struct ScreenAnchors {
    settings: AnchorSettings,
    states: HashMap<Entity, AnchorState>,
    enabled: bool,
}

impl ScreenAnchors {
    pub fn new(settings: AnchorSettings) -> Self {
        Self {
            settings,
            states: HashMap::new(),
            enabled: false,
        }
    }

    pub fn settings(&self) -> &AnchorSettings {
        &self.settings
    }

    /// Anchors only take input in overview mode.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, actor: Entity) -> Option<&AnchorState> {
        self.states.get(&actor)
    }

    /// Projects one actor and moves its region toward the clamped target.
    /// The first placement of an actor snaps instead of smoothing in from
    /// the origin.
    pub fn track(
        &mut self,
        actor: Entity,
        tracked: &TrackedActor,
        world_position: Vec3,
        projector: &dyn Projector,
        delta_seconds: f32,
    ) -> &AnchorState {
        let viewport = projector.viewport_size();
        let anchor_point = world_position + tracked.offset;
        let placement = place_anchor(projector.project(anchor_point), viewport, &self.settings);
        let settings = self.settings;

        let state = self.states.entry(actor).or_insert_with(|| AnchorState {
            target: tracked.target.clone(),
            interaction: tracked.interaction.clone(),
            world_position,
            screen_position: placement.target,
            visible: placement.visible,
        });

        if state.visible != placement.visible {
            trace!(
                target: "anchor",
                "Anchor {} is now {}",
                state.target,
                if placement.visible { "visible" } else { "hidden" }
            );
        }

        state.target = tracked.target.clone();
        state.interaction = tracked.interaction.clone();
        state.world_position = world_position;
        state.visible = placement.visible;
        state.screen_position = if settings.smoothing {
            smooth_toward(
                state.screen_position,
                placement.target,
                settings.smoothing_rate,
                delta_seconds,
            )
        } else {
            placement.target
        };
        state
    }

    /// Marks an actor hidden for this frame (e.g. it belongs to another scene).
    pub fn hide(&mut self, actor: Entity) {
        if let Some(state) = self.states.get_mut(&actor) {
            state.visible = false;
        }
    }

    /// Drops state for actors that no longer exist.
    pub fn retain(&mut self, mut alive: impl FnMut(Entity) -> bool) {
        self.states.retain(|actor, _| alive(*actor));
    }

    /// Current clickable rectangle for `actor`.
    pub fn region(&self, actor: Entity) -> Option<ScreenRect> {
        self.states
            .get(&actor)
            .map(|state| ScreenRect::from_center(state.screen_position, self.settings.region_size))
    }

    pub fn is_clickable(&self, actor: Entity) -> bool {
        self.enabled && self.states.get(&actor).is_some_and(|state| state.visible)
    }

    /// Resolves a click on `actor`'s region, if the region currently takes
    /// input.
    pub fn click(&self, actor: Entity) -> Option<AnchorHit> {
        if !self.is_clickable(actor) {
            return None;
        }
        self.states.get(&actor).map(|state| AnchorHit {
            actor,
            interaction: state.interaction.clone(),
            target: state.target.clone(),
        })
    }

    /// Finds the clickable region under `point`. Overlaps resolve to the
    /// region whose centre is nearest.
    pub fn hit_test(&self, point: Vec2) -> Option<AnchorHit> {
        if !self.enabled {
            return None;
        }
        self.states
            .iter()
            .filter(|(_, state)| state.visible)
            .filter(|(actor, _)| {
                self.region(**actor)
                    .is_some_and(|rect| rect.contains(point))
            })
            .min_by(|(_, a), (_, b)| {
                let da = a.screen_position.distance_squared(point);
                let db = b.screen_position.distance_squared(point);
                da.total_cmp(&db)
            })
            .map(|(actor, state)| AnchorHit {
                actor: *actor,
                interaction: state.interaction.clone(),
                target: state.target.clone(),
            })
    }
}

impl Default for ScreenAnchors {
    fn default() -> Self {
        Self::new(AnchorSettings::default())
    }
}

impl InputLayer for ScreenAnchors {
    fn apply_mode(&mut self, state: &ModeState) {
        let enabled = state.interaction == InteractionMode::Overview;
        if self.enabled != enabled {
            debug!(
                target: "anchor",
                "Anchors {} for {}",
                if enabled { "enabled" } else { "disabled" },
                state
            );
        }
        self.enabled = enabled;
    }
}
