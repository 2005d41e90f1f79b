//! Systems for the world module.
use bevy::{math::primitives::Plane3d, prelude::*};

use crate::{
    core::SimulationClock,
    mode::{state::SceneMode, ModeStateMachine},
    ui::anchor::TrackedActor,
    world::components::{PrimarySun, SceneCamera, SceneProp, Wanderer},
};

const GROUND_SCALE: f32 = 12.0;
const CAMERA_START_POS: Vec3 = Vec3::new(0.0, 7.0, 11.0);
const ACTOR_LABEL_OFFSET: Vec3 = Vec3::new(0.0, 1.4, 0.0);

/// Spawns both locations (office and home), the light and the scene camera.
/// Props of the inactive location are hidden by `apply_scene_visibility`.
pub fn spawn_world_environment(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let mut material = |color: Color| {
        materials.add(StandardMaterial {
            base_color: color,
            perceptual_roughness: 0.9,
            metallic: 0.0,
            ..default()
        })
    };

    let office_floor = material(Color::srgb_u8(120, 124, 132));
    let home_floor = material(Color::srgb_u8(168, 130, 92));
    let desk = material(Color::srgb_u8(96, 72, 52));
    let boss = material(Color::srgb_u8(60, 70, 120));
    let cat = material(Color::srgb_u8(230, 150, 60));
    let couch = material(Color::srgb_u8(140, 60, 70));

    let plane = meshes.add(Mesh::from(Plane3d::default()));
    for (scene, floor) in [
        (SceneMode::LocationA, office_floor),
        (SceneMode::LocationB, home_floor),
    ] {
        commands.spawn((
            Mesh3d(plane.clone()),
            MeshMaterial3d(floor),
            Transform::from_scale(Vec3::splat(GROUND_SCALE)),
            Visibility::Hidden,
            SceneProp { scene },
        ));
    }

    // Office
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(3.0, 1.0, 1.5))),
        MeshMaterial3d(desk),
        Transform::from_xyz(-2.5, 0.5, 0.0),
        Visibility::Hidden,
        SceneProp {
            scene: SceneMode::LocationA,
        },
    ));
    commands.spawn((
        Mesh3d(meshes.add(Capsule3d::new(0.4, 1.0))),
        MeshMaterial3d(boss),
        Transform::from_xyz(2.0, 0.9, -1.0),
        Visibility::Hidden,
        SceneProp {
            scene: SceneMode::LocationA,
        },
        Wanderer::new(Vec3::new(2.0, 0.9, -1.0), 1.5, 0.35),
        TrackedActor::new("boss", "TalkBoss").with_offset(ACTOR_LABEL_OFFSET),
        Name::new("Boss"),
    ));

    // Home
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(3.5, 0.8, 1.2))),
        MeshMaterial3d(couch),
        Transform::from_xyz(-3.0, 0.4, -2.0),
        Visibility::Hidden,
        SceneProp {
            scene: SceneMode::LocationB,
        },
    ));
    commands.spawn((
        Mesh3d(meshes.add(Sphere::new(0.35))),
        MeshMaterial3d(cat),
        Transform::from_xyz(1.0, 0.35, 1.0),
        Visibility::Hidden,
        SceneProp {
            scene: SceneMode::LocationB,
        },
        Wanderer::new(Vec3::new(1.0, 0.35, 1.0), 3.0, 0.8).with_phase(0.6),
        TrackedActor::new("cat", "CatPlay").with_offset(ACTOR_LABEL_OFFSET * 0.6),
        Name::new("Cat"),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 15_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(8.0, 16.0, 8.0).looking_at(Vec3::ZERO, Vec3::Y),
        PrimarySun,
    ));

    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(CAMERA_START_POS).looking_at(Vec3::ZERO, Vec3::Y),
        SceneCamera,
    ));
}

/// Shows props of the active scene and hides the rest. Runs when the
/// swap step of a transition changes the scene.
pub fn apply_scene_visibility(
    machine: Res<ModeStateMachine>,
    mut shown: Local<Option<SceneMode>>,
    mut props: Query<(&SceneProp, &mut Visibility)>,
    added: Query<(), Added<SceneProp>>,
) {
    let scene = machine.state().scene;
    if *shown == Some(scene) && added.is_empty() {
        return;
    }

    for (prop, mut visibility) in &mut props {
        let wanted = if prop.scene == scene {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        if *visibility != wanted {
            *visibility = wanted;
        }
    }
    if *shown != Some(scene) {
        debug!(target: "mode", "Showing props for {}", scene);
    }
    *shown = Some(scene);
}

/// Moves wandering actors; frozen while the simulation is paused.
pub fn wander_actors(
    simulation: Res<SimulationClock>,
    mut actors: Query<(&Wanderer, &mut Transform)>,
) {
    let elapsed = simulation.elapsed_secs() as f32;
    for (wanderer, mut transform) in &mut actors {
        transform.translation = wanderer.position_at(elapsed);
    }
}
