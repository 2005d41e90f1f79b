// src/ui/anchor/projection.rs
//
// World-to-screen projection and the clamping rules for anchored regions.

use bevy::prelude::*;

use crate::ui::config::AnchorSettings;

/// A projected point. `screen` uses UI coordinates (origin top-left, y
/// down). `depth` is the distance in front of the camera; negative when the
/// point is behind it, in which case `screen` is not mirrored yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub screen: Vec2,
    pub depth: f32,
}

pub trait Projector {
    fn viewport_size(&self) -> Vec2;
    fn project(&self, world: Vec3) -> Option<Projection>;
}

/// Projects through a Bevy camera.
pub struct CameraProjector<'a> {
    camera: &'a Camera,
    transform: &'a GlobalTransform,
    viewport: Vec2,
}

impl<'a> CameraProjector<'a> {
    pub fn new(camera: &'a Camera, transform: &'a GlobalTransform, viewport: Vec2) -> Self {
        Self {
            camera,
            transform,
            viewport,
        }
    }
}

impl Projector for CameraProjector<'_> {
    fn viewport_size(&self) -> Vec2 {
        self.viewport
    }

    fn project(&self, world: Vec3) -> Option<Projection> {
        let view = self.transform.affine().inverse();
        let view_point = view.transform_point3(world);
        let clip = self.camera.clip_from_view() * view_point.extend(1.0);
        if clip.w.abs() <= f32::EPSILON {
            return None;
        }

        let ndc = clip.truncate().truncate() / clip.w.abs();
        let screen = Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.x,
            (1.0 - ndc.y) * 0.5 * self.viewport.y,
        );
        // Bevy cameras look down -Z.
        Some(Projection {
            screen,
            depth: -view_point.z,
        })
    }
}

/// Axis-aligned screen rectangle in UI coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl ScreenRect {
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// Where an anchored region goes this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPlacement {
    /// Clamped so the region of `region_size` around it stays at least
    /// `margin` inside the viewport and never spills off-screen.
    pub target: Vec2,
    /// Decided on the unclamped position.
    pub visible: bool,
}

/// Mirrors behind-camera points, clamps into the inset viewport and decides
/// visibility from the unclamped position.
pub fn place_anchor(
    projection: Option<Projection>,
    viewport: Vec2,
    settings: &AnchorSettings,
) -> AnchorPlacement {
    let center = viewport * 0.5;
    let inset = Vec2::splat(settings.margin).max(settings.region_size * 0.5);
    let Some(projection) = projection.filter(|p| p.screen.is_finite() && p.depth.is_finite())
    else {
        return AnchorPlacement {
            target: clamp_to_inset(center, viewport, inset),
            visible: false,
        };
    };

    let behind = projection.depth < 0.0;
    let unclamped = if behind {
        viewport - projection.screen
    } else {
        projection.screen
    };

    let extended = Vec2::splat(settings.offscreen_margin);
    let inside = unclamped.cmpge(-extended).all() && unclamped.cmple(viewport + extended).all();

    AnchorPlacement {
        target: clamp_to_inset(unclamped, viewport, inset),
        visible: !behind && inside,
    }
}

/// Clamps `point` into the viewport inset per axis by `inset`. When the
/// viewport is too small for the inset the centre is used.
pub fn clamp_to_inset(point: Vec2, viewport: Vec2, inset: Vec2) -> Vec2 {
    let lo = inset;
    let hi = viewport - lo;
    let center = viewport * 0.5;
    Vec2::new(
        clamp_axis(point.x, lo.x, hi.x, center.x),
        clamp_axis(point.y, lo.y, hi.y, center.y),
    )
}

fn clamp_axis(value: f32, lo: f32, hi: f32, center: f32) -> f32 {
    if lo > hi {
        return center;
    }
    if value.is_nan() {
        return center.clamp(lo, hi);
    }
    value.clamp(lo, hi)
}

/// Moves `current` toward `target` with an exponential approach.
pub fn smooth_toward(current: Vec2, target: Vec2, rate: f32, delta_seconds: f32) -> Vec2 {
    if rate <= 0.0 {
        return target;
    }
    let t = 1.0 - (-rate * delta_seconds.max(0.0)).exp();
    current.lerp(target, t.clamp(0.0, 1.0))
}
