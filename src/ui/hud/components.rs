// src/ui/hud/components.rs
//
// Components and resources for the stat HUD and the interaction message line.

use std::time::Duration;

use bevy::prelude::*;

use crate::{
    bus::{BusInbox, EventBus},
    interaction::events::{InteractionApplied, InteractionDenied},
    stats::StatKey,
};

/// Root node of the HUD panel.
#[derive(Component, Debug, Default)]
pub struct HudRoot;

/// Text line showing one displayed stat.
#[derive(Component, Debug, Clone, Copy)]
pub struct HudStatLine {
    pub key: StatKey,
}

/// Text line showing day, slot and mode.
#[derive(Component, Debug, Default)]
pub struct HudClockLine;

/// Text line showing the latest interaction message.
#[derive(Component, Debug, Default)]
pub struct HudMessageLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTone {
    Applied,
    Denied,
}

/// A message with a lifetime; it fades out during its last `fade` seconds.
#[derive(Debug, Clone)]
pub struct HudMessage {
    pub text: String,
    pub tone: MessageTone,
    lifetime: Timer,
    fade_seconds: f32,
}

impl HudMessage {
    fn new(text: String, tone: MessageTone, lifetime_secs: f32, fade_seconds: f32) -> Self {
        Self {
            text,
            tone,
            lifetime: Timer::from_seconds(lifetime_secs, TimerMode::Once),
            fade_seconds,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.lifetime.is_finished()
    }

    /// 1.0 while fresh, falling to 0.0 as the lifetime runs out.
    pub fn fade_alpha(&self) -> f32 {
        let remaining = self.lifetime.remaining_secs();
        if self.fade_seconds > 0.0 && remaining < self.fade_seconds {
            remaining / self.fade_seconds
        } else {
            1.0
        }
    }
}

/// Collects applied/denied notifications from the bus for the message line.
#[derive(Resource)]
pub struct HudFeed {
    applied: BusInbox<InteractionApplied>,
    denied: BusInbox<InteractionDenied>,
    current: Option<HudMessage>,
    settings: HudSettings,
}

impl HudFeed {
    pub fn new(bus: &EventBus, settings: HudSettings) -> Self {
        Self {
            applied: BusInbox::attach(bus),
            denied: BusInbox::attach(bus),
            current: None,
            settings,
        }
    }

    pub fn current(&self) -> Option<&HudMessage> {
        self.current.as_ref()
    }

    /// Takes the newest pending notification, if any. Denials win over
    /// applications arriving in the same frame.
    pub fn poll(&mut self) -> bool {
        let applied = self.applied.drain().pop().map(|event| {
            let text = if event.deltas.is_empty() {
                event.message
            } else {
                let changes: Vec<String> = event
                    .deltas
                    .iter()
                    .map(|delta| format!("{} {:+.0}", delta.key.label(), delta.delta))
                    .collect();
                format!("{} ({})", event.message, changes.join(", "))
            };
            (text, MessageTone::Applied)
        });
        let denied = self.denied.drain().pop().map(|event| {
            let reason = event
                .reasons
                .first()
                .cloned()
                .unwrap_or_else(|| "not available".to_string());
            (format!("{}: {}", event.name, reason), MessageTone::Denied)
        });

        let Some((text, tone)) = denied.or(applied) else {
            return false;
        };
        self.current = Some(HudMessage::new(
            text,
            tone,
            self.settings.message_seconds,
            self.settings.fade_seconds,
        ));
        true
    }

    /// Advances the current message; drops it once expired.
    pub fn tick(&mut self, delta: Duration) {
        if let Some(message) = self.current.as_mut() {
            message.lifetime.tick(delta);
            if message.is_finished() {
                self.current = None;
            }
        }
    }
}

impl FromWorld for HudFeed {
    fn from_world(world: &mut World) -> Self {
        let settings = *world.get_resource_or_init::<HudSettings>();
        let bus = world.get_resource_or_init::<EventBus>().clone();
        Self::new(&bus, settings)
    }
}

/// Resource containing settings for HUD layout and message behaviour.
#[derive(Resource, Debug, Clone, Copy)]
pub struct HudSettings {
    /// How long a message stays visible (seconds).
    pub message_seconds: f32,

    /// Duration of the message fade-out (seconds).
    pub fade_seconds: f32,

    /// Panel width (pixels).
    pub panel_width: f32,

    /// Offset from the top and right screen edges (pixels).
    pub edge_offset: f32,

    pub padding: f32,
    pub font_size: f32,
}

impl Default for HudSettings {
    fn default() -> Self {
        Self {
            message_seconds: 4.0,
            fade_seconds: 1.0,
            panel_width: 260.0,
            edge_offset: 20.0,
            padding: 12.0,
            font_size: 16.0,
        }
    }
}
