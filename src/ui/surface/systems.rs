// src/ui/surface/systems.rs
//
// Spawning, click routing and visibility for static surface buttons.

use bevy::prelude::*;

use crate::interaction::InteractionTrigger;

use super::components::{StaticSurfaces, SurfaceButton};

// Visual constants
const BUTTON_WIDTH_PX: f32 = 180.0;
const BUTTON_COLOR: Color = Color::srgba(0.18, 0.18, 0.22, 0.95);
const BUTTON_HOVER_COLOR: Color = Color::srgba(0.26, 0.26, 0.32, 0.95);
const BUTTON_PRESSED_COLOR: Color = Color::srgba(0.35, 0.32, 0.18, 0.95);
const BORDER_COLOR: Color = Color::srgb(0.4, 0.4, 0.45);
const TEXT_COLOR: Color = Color::WHITE;

/// Spawns one hidden button per configured surface; visibility is synced
/// from `StaticSurfaces` every frame.
pub fn spawn_surface_buttons(mut commands: Commands, surfaces: Res<StaticSurfaces>) {
    for spec in surfaces.specs() {
        commands
            .spawn((
                Node {
                    position_type: PositionType::Absolute,
                    left: Val::Px(spec.position.x),
                    top: Val::Px(spec.position.y),
                    width: Val::Px(BUTTON_WIDTH_PX),
                    padding: UiRect::all(Val::Px(8.0)),
                    border: UiRect::all(Val::Px(1.5)),
                    justify_content: JustifyContent::Center,
                    align_items: AlignItems::Center,
                    display: Display::None,
                    ..default()
                },
                Button,
                Interaction::None,
                BackgroundColor(BUTTON_COLOR),
                BorderColor::from(BORDER_COLOR),
                SurfaceButton {
                    name: spec.name.clone(),
                },
                Name::new(format!("Surface Button {}", spec.name)),
            ))
            .with_children(|button| {
                button.spawn((
                    Text::new(spec.label.clone()),
                    TextFont {
                        font_size: 15.0,
                        ..default()
                    },
                    TextColor(TEXT_COLOR),
                ));
            });
    }
    info!(target: "surface", "Spawned {} surface button(s)", surfaces.specs().count());
}

/// Routes pressed surface buttons into the dispatcher.
#[allow(clippy::type_complexity)]
pub fn handle_surface_clicks(
    time: Res<Time>,
    mut surfaces: ResMut<StaticSurfaces>,
    mut trigger: InteractionTrigger,
    buttons: Query<(&Interaction, &SurfaceButton), (Changed<Interaction>, With<Button>)>,
) {
    for (interaction, button) in &buttons {
        if *interaction != Interaction::Pressed {
            continue;
        }
        let Some(click) = surfaces.register_click(&button.name, time.elapsed_secs_f64()) else {
            continue;
        };
        let outcome = trigger.trigger(&click.interaction, &click.target);
        debug!(
            target: "surface",
            "Surface `{}` -> {} on {}: {:?}",
            button.name, click.interaction, click.target, outcome
        );
    }
}

/// Shows enabled surfaces, hides the rest and tints by pointer state.
pub fn sync_surface_buttons(
    surfaces: Res<StaticSurfaces>,
    mut buttons: Query<(&SurfaceButton, &Interaction, &mut Node, &mut BackgroundColor)>,
) {
    for (button, interaction, mut node, mut background) in &mut buttons {
        let display = if surfaces.is_enabled(&button.name) {
            Display::Flex
        } else {
            Display::None
        };
        if node.display != display {
            node.display = display;
        }

        let color = match interaction {
            Interaction::Pressed => BUTTON_PRESSED_COLOR,
            Interaction::Hovered => BUTTON_HOVER_COLOR,
            Interaction::None => BUTTON_COLOR,
        };
        if background.0 != color {
            background.0 = color;
        }
    }
}
