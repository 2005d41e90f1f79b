//! Multi-frame scene transition sequence and transition rejections.
use thiserror::Error;

use super::state::{GameState, InteractionMode, ModeTarget, SceneMode};

/// Why a requested transition was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionRejection {
    #[error("{requested} requested while a transition to {active} is in flight")]
    InFlight {
        requested: ModeTarget,
        active: SceneMode,
    },
    #[error("{from} cannot move to {to}")]
    NotAllowed { from: ModeTarget, to: ModeTarget },
    #[error("{requested} is already active")]
    AlreadyActive { requested: ModeTarget },
    #[error("{requested} is unavailable in {game} / {interaction}")]
    Blocked {
        requested: ModeTarget,
        game: GameState,
        interaction: InteractionMode,
    },
}

/// Steps of a scene change, advanced at most one per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TransitionPhase {
    ExitCurrent,
    Swap,
    EnterNew,
    Settle,
    Complete,
}

/// In-flight scene change: `{phase, elapsed, duration}`.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneTransition {
    from: SceneMode,
    to: SceneMode,
    phase: TransitionPhase,
    elapsed: f32,
    settle_seconds: f32,
}

impl SceneTransition {
    pub fn new(from: SceneMode, to: SceneMode, settle_seconds: f32) -> Self {
        Self {
            from,
            to,
            phase: TransitionPhase::ExitCurrent,
            elapsed: 0.0,
            settle_seconds: settle_seconds.max(0.0),
        }
    }

    pub fn from(&self) -> SceneMode {
        self.from
    }

    pub fn to(&self) -> SceneMode {
        self.to
    }

    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase == TransitionPhase::Complete
    }

    /// Overall completion in `[0, 1]`. The hook steps are instantaneous, so
    /// progress is measured across the settle delay.
    pub fn progress(&self) -> f32 {
        match self.phase {
            TransitionPhase::ExitCurrent | TransitionPhase::Swap | TransitionPhase::EnterNew => 0.0,
            TransitionPhase::Settle if self.settle_seconds <= f32::EPSILON => 1.0,
            TransitionPhase::Settle => (self.elapsed / self.settle_seconds).clamp(0.0, 1.0),
            TransitionPhase::Complete => 1.0,
        }
    }

    /// Advances by one frame and returns the phase that was executed.
    pub fn step(&mut self, delta_seconds: f32) -> TransitionPhase {
        let executed = self.phase;
        self.phase = match self.phase {
            TransitionPhase::ExitCurrent => TransitionPhase::Swap,
            TransitionPhase::Swap => TransitionPhase::EnterNew,
            TransitionPhase::EnterNew => TransitionPhase::Settle,
            TransitionPhase::Settle => {
                self.elapsed += delta_seconds.max(0.0);
                if self.elapsed + f32::EPSILON >= self.settle_seconds {
                    TransitionPhase::Complete
                } else {
                    TransitionPhase::Settle
                }
            }
            TransitionPhase::Complete => TransitionPhase::Complete,
        };
        executed
    }
}
