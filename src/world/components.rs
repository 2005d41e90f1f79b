//! Components used by the world module.
use bevy::prelude::*;

use crate::mode::state::SceneMode;

/// Marker for the camera that renders the active scene; screen anchors
/// project through it.
#[derive(Component, Debug, Default)]
pub struct SceneCamera;

/// Marker component identifying the main directional light (the "sun").
#[derive(Component, Default)]
pub struct PrimarySun;

/// Entity that belongs to one location and is hidden while the other is active.
#[derive(Component, Debug, Clone, Copy)]
pub struct SceneProp {
    pub scene: SceneMode,
}

/// Moves an actor along a slow figure-eight around `origin`.
#[derive(Component, Debug, Clone, Copy)]
pub struct Wanderer {
    pub origin: Vec3,
    pub radius: f32,
    /// Radians per second.
    pub speed: f32,
    pub phase: f32,
}

impl Wanderer {
    pub fn new(origin: Vec3, radius: f32, speed: f32) -> Self {
        Self {
            origin,
            radius,
            speed,
            phase: 0.0,
        }
    }

    pub fn with_phase(mut self, phase: f32) -> Self {
        self.phase = phase;
        self
    }

    /// Position after `elapsed_seconds` of simulation time. Stays on the
    /// ground plane and within `radius` of the origin on each axis.
    pub fn position_at(&self, elapsed_seconds: f32) -> Vec3 {
        let angle = self.phase + self.speed * elapsed_seconds;
        self.origin
            + Vec3::new(
                self.radius * angle.sin(),
                0.0,
                self.radius * (angle * 2.0).sin() * 0.5,
            )
    }
}
