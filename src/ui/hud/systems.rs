// src/ui/hud/systems.rs
//
// Systems for spawning and refreshing the stat HUD.

use bevy::prelude::*;

use crate::{
    interaction::ResultProcessor, mode::ModeStateMachine, stats::StatKey,
    world::time::{GameClock, TimeSettings},
};

use super::components::{
    HudClockLine, HudFeed, HudMessageLine, HudRoot, HudSettings, HudStatLine, MessageTone,
};

// Visual constants
const BACKGROUND_COLOR: Color = Color::srgba(0.1, 0.1, 0.1, 0.85);
const BORDER_COLOR: Color = Color::srgb(0.3, 0.3, 0.3);
const TEXT_COLOR: Color = Color::WHITE;
const CLOCK_COLOR: Color = Color::srgb(1.0, 0.9, 0.4);
const DENIED_COLOR: Color = Color::srgb(1.0, 0.45, 0.4);

/// Spawns the top-right HUD panel with one line per stat.
pub fn spawn_hud(mut commands: Commands, settings: Res<HudSettings>) {
    let text_font = TextFont {
        font_size: settings.font_size,
        ..default()
    };

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                top: Val::Px(settings.edge_offset),
                right: Val::Px(settings.edge_offset),
                width: Val::Px(settings.panel_width),
                padding: UiRect::all(Val::Px(settings.padding)),
                border: UiRect::all(Val::Px(2.0)),
                flex_direction: FlexDirection::Column,
                row_gap: Val::Px(4.0),
                ..default()
            },
            BackgroundColor(BACKGROUND_COLOR),
            BorderColor::from(BORDER_COLOR),
            HudRoot,
            Name::new("HUD"),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(""),
                text_font.clone(),
                TextColor(CLOCK_COLOR),
                HudClockLine,
            ));
            for key in StatKey::ALL {
                parent.spawn((
                    Text::new(""),
                    text_font.clone(),
                    TextColor(TEXT_COLOR),
                    HudStatLine { key },
                ));
            }
            parent.spawn((
                Text::new(""),
                text_font.clone(),
                TextColor(TEXT_COLOR),
                Node {
                    margin: UiRect::top(Val::Px(8.0)),
                    max_width: Val::Px(settings.panel_width - settings.padding * 2.0),
                    ..default()
                },
                HudMessageLine,
            ));
        });

    info!("HUD spawned");
}

/// Writes the animated (displayed) stat values, never the true ones.
pub fn update_hud_stats(
    processor: Res<ResultProcessor>,
    mut lines: Query<(&HudStatLine, &mut Text)>,
) {
    let displayed = processor.displayed();
    for (line, mut text) in &mut lines {
        let value = format!("{:<10}{:>6.0}", line.key.label(), displayed.get(line.key));
        if text.0 != value {
            text.0 = value;
        }
    }
}

pub fn update_hud_clock(
    clock: Option<Res<GameClock>>,
    time_settings: Option<Res<TimeSettings>>,
    machine: Res<ModeStateMachine>,
    mut lines: Query<&mut Text, With<HudClockLine>>,
) {
    let Some(clock) = clock else {
        return;
    };
    let slot = time_settings
        .map(|settings| settings.slot_label(clock.slot()))
        .unwrap_or_else(|| format!("slot {}", clock.slot()));
    let value = format!("Day {} | {} | {}", clock.day(), slot, machine.state());

    for mut text in &mut lines {
        if text.0 != value {
            text.0 = value.clone();
        }
    }
}

pub fn update_hud_message(
    time: Res<Time>,
    mut feed: ResMut<HudFeed>,
    mut lines: Query<(&mut Text, &mut TextColor), With<HudMessageLine>>,
) {
    feed.tick(time.delta());
    feed.poll();

    let (value, color) = match feed.current() {
        Some(message) => {
            let base = match message.tone {
                MessageTone::Applied => TEXT_COLOR,
                MessageTone::Denied => DENIED_COLOR,
            };
            (message.text.clone(), base.with_alpha(message.fade_alpha()))
        }
        None => (String::new(), TEXT_COLOR),
    };

    for (mut text, mut text_color) in &mut lines {
        if text.0 != value {
            text.0 = value.clone();
        }
        text_color.0 = color;
    }
}
