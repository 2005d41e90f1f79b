//! CorePlugin owns the simulation clock that cooldowns, scene transitions
//! and value animations are measured against, and fixes the frame order of
//! the orchestration systems.
use std::time::Duration;

use bevy::prelude::*;

#[cfg(feature = "core_debug")]
use crate::bus::EventBus;

const DEFAULT_TIME_SCALE: f32 = 1.0;
const MIN_TIME_SCALE: f32 = 0.001;

/// Scaled, pausable game time derived from Bevy's real frame delta.
///
/// Every timed check in the orchestration core reads this clock rather than
/// `Time`, so pausing freezes cooldowns and animations in one place.
#[derive(Resource, Debug, Clone)]
pub struct SimulationClock {
    scale: f32,
    paused: bool,
    frame: FrameDelta,
    elapsed: Duration,
}

/// Real and scaled delta of the most recent frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct FrameDelta {
    real: Duration,
    scaled: Duration,
}

impl SimulationClock {
    pub fn new(time_scale: f32) -> Self {
        Self {
            scale: time_scale.max(MIN_TIME_SCALE),
            paused: false,
            frame: FrameDelta::default(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn time_scale(&self) -> f32 {
        self.scale
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn set_time_scale(&mut self, scale: f32) {
        self.scale = scale.max(MIN_TIME_SCALE);
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    #[cfg_attr(not(any(test, feature = "core_debug")), allow(dead_code))]
    pub fn last_real_delta(&self) -> Duration {
        self.frame.real
    }

    /// Zero while paused.
    pub fn last_scaled_delta(&self) -> Duration {
        self.frame.scaled
    }

    /// Scaled frame delta in seconds, the unit every tween and timer uses.
    pub fn delta_secs(&self) -> f32 {
        self.frame.scaled.as_secs_f32()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Scaled seconds since startup; cooldowns are stamped with this.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Feeds one real frame delta into the clock.
    pub fn tick(&mut self, real: Duration) {
        let scaled = match self.paused {
            true => Duration::ZERO,
            false => real.mul_f32(self.scale),
        };
        self.frame = FrameDelta { real, scaled };
        self.elapsed += scaled;
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_SCALE)
    }
}

/// Frame order of the orchestration pipeline inside `Update`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionSet {
    /// Pointer and keyboard input; clicks are turned into dispatch calls.
    Input,
    /// Completion bookkeeping for the dispatcher.
    Dispatch,
    /// Result processing and display animation.
    Process,
    /// Mode/scene state machine.
    Mode,
    /// HUD and anchored widgets.
    Present,
}

#[derive(Debug, Clone, Copy)]
pub struct CorePlugin {
    time_scale: f32,
}

impl CorePlugin {
    pub const fn with_time_scale(time_scale: f32) -> Self {
        Self { time_scale }
    }
}

impl Default for CorePlugin {
    fn default() -> Self {
        Self::with_time_scale(DEFAULT_TIME_SCALE)
    }
}

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        let clock = SimulationClock::new(self.time_scale);
        info!("CorePlugin registered (time scale {:.3})", clock.time_scale());

        app.insert_resource(clock)
            .add_systems(First, advance_simulation_clock)
            .configure_sets(
                Update,
                (
                    InteractionSet::Input,
                    InteractionSet::Dispatch,
                    InteractionSet::Process,
                    InteractionSet::Mode,
                    InteractionSet::Present,
                )
                    .chain(),
            );

        #[cfg(feature = "core_debug")]
        app.add_systems(Last, log_orchestration_heartbeat);
    }
}

fn advance_simulation_clock(mut clock: ResMut<SimulationClock>, time: Res<Time>) {
    clock.tick(time.delta());
}

/// Once per real second: clock state plus the most recent bus publish.
#[cfg(feature = "core_debug")]
fn log_orchestration_heartbeat(
    mut timer: Local<Option<Timer>>,
    clock: Res<SimulationClock>,
    bus: Option<Res<EventBus>>,
) {
    let timer = timer.get_or_insert_with(|| Timer::from_seconds(1.0, TimerMode::Repeating));
    if !timer.tick(clock.last_real_delta()).just_finished() {
        return;
    }

    let last_publish = bus
        .and_then(|bus| bus.history().pop())
        .map(|record| format!("#{} {}", record.sequence, record.channel))
        .unwrap_or_else(|| "none".to_string());
    info!(
        target: "core_debug",
        "sim {:.2}s x{:.3}{} | dt {:.4}s real / {:.4}s scaled | last publish {}",
        clock.elapsed().as_secs_f32(),
        clock.time_scale(),
        if clock.is_paused() { " (paused)" } else { "" },
        clock.last_real_delta().as_secs_f32(),
        clock.delta_secs(),
        last_publish,
    );
}
