// src/ui/anchor/systems.rs
//
// Systems that keep anchored hit regions glued to their actors on screen.

use bevy::{prelude::*, window::PrimaryWindow};

use crate::{interaction::InteractionTrigger, world::components::SceneCamera};

use super::{
    components::{AnchorHitRegion, ScreenAnchors, TrackedActor},
    projection::CameraProjector,
};

// Visual constants
const REGION_COLOR: Color = Color::srgba(1.0, 1.0, 1.0, 0.04);
const REGION_HOVER_COLOR: Color = Color::srgba(1.0, 0.95, 0.6, 0.18);
const REGION_BORDER_COLOR: Color = Color::srgba(1.0, 1.0, 1.0, 0.25);

/// Spawns a hidden hit region for every newly tracked actor.
pub fn spawn_anchor_regions(
    mut commands: Commands,
    anchors: Res<ScreenAnchors>,
    actors: Query<(Entity, &TrackedActor), Added<TrackedActor>>,
) {
    let size = anchors.settings().region_size;
    for (actor, tracked) in &actors {
        commands.spawn((
            Node {
                position_type: PositionType::Absolute,
                width: Val::Px(size.x),
                height: Val::Px(size.y),
                border: UiRect::all(Val::Px(1.0)),
                display: Display::None,
                ..default()
            },
            Button,
            Interaction::None,
            BackgroundColor(REGION_COLOR),
            BorderColor::from(REGION_BORDER_COLOR),
            ZIndex(50),
            AnchorHitRegion { actor },
            Name::new(format!("Anchor Region {}", tracked.target)),
        ));
        debug!(target: "anchor", "Hit region spawned for {}", tracked.target);
    }
}

/// Projects every tracked actor through the scene camera.
pub fn track_actors(
    time: Res<Time>,
    mut anchors: ResMut<ScreenAnchors>,
    camera_query: Query<(&Camera, &GlobalTransform), With<SceneCamera>>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    actors: Query<(Entity, &TrackedActor, &GlobalTransform, Option<&Visibility>)>,
) {
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };
    let viewport = camera
        .logical_viewport_size()
        .or_else(|| window_query.single().ok().map(Window::size));
    let Some(viewport) = viewport else {
        return;
    };

    let projector = CameraProjector::new(camera, camera_transform, viewport);
    let delta = time.delta_secs();
    for (actor, tracked, transform, visibility) in &actors {
        anchors.track(actor, tracked, transform.translation(), &projector, delta);
        if visibility == Some(&Visibility::Hidden) {
            anchors.hide(actor);
        }
    }
    anchors.retain(|actor| actors.contains(actor));
}

/// Moves hit regions to their anchors and despawns orphans.
pub fn position_anchor_regions(
    mut commands: Commands,
    anchors: Res<ScreenAnchors>,
    mut regions: Query<(Entity, &AnchorHitRegion, &Interaction, &mut Node, &mut BackgroundColor)>,
    actors: Query<(), With<TrackedActor>>,
) {
    for (entity, region, interaction, mut node, mut background) in &mut regions {
        if !actors.contains(region.actor) {
            commands.entity(entity).despawn();
            continue;
        }

        let Some(rect) = anchors.region(region.actor) else {
            node.display = Display::None;
            continue;
        };
        node.display = if anchors.is_clickable(region.actor) {
            Display::Flex
        } else {
            Display::None
        };
        node.left = Val::Px(rect.min.x);
        node.top = Val::Px(rect.min.y);
        node.width = Val::Px(rect.size().x);
        node.height = Val::Px(rect.size().y);

        background.0 = match interaction {
            Interaction::Hovered | Interaction::Pressed => REGION_HOVER_COLOR,
            Interaction::None => REGION_COLOR,
        };
    }
}

/// Routes pressed anchor regions into the dispatcher.
#[allow(clippy::type_complexity)]
pub fn handle_anchor_clicks(
    anchors: Res<ScreenAnchors>,
    mut trigger: InteractionTrigger,
    regions: Query<(&Interaction, &AnchorHitRegion), (Changed<Interaction>, With<Button>)>,
) {
    for (interaction, region) in &regions {
        if *interaction != Interaction::Pressed {
            continue;
        }
        let Some(hit) = anchors.click(region.actor) else {
            debug!(target: "anchor", "Click on inactive anchor region ignored");
            continue;
        };
        let outcome = trigger.trigger(&hit.interaction, &hit.target);
        debug!(
            target: "anchor",
            "Anchor {} -> {}: {:?}",
            hit.target, hit.interaction, outcome
        );
    }
}
