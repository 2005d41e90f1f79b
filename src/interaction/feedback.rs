//! Animation/audio feedback seam.
//!
//! The processor only talks to [`FeedbackPlayer`]; the default player logs
//! cues and times them so completion can wait for playback.
use bevy::prelude::*;

use super::types::FeedbackCue;

pub trait FeedbackPlayer: Send + Sync {
    fn play(&mut self, cue: &FeedbackCue);
    fn stop(&mut self);
    fn is_finished(&self) -> bool;

    /// Advances playback; players driven by an external engine may ignore it.
    fn update(&mut self, _delta_seconds: f32) {}
}

/// Bevy-side owner of the active player.
#[derive(Resource)]
pub struct ActiveFeedbackPlayer(pub Box<dyn FeedbackPlayer>);

impl ActiveFeedbackPlayer {
    pub fn new(player: impl FeedbackPlayer + 'static) -> Self {
        Self(Box::new(player))
    }

    pub fn player_mut(&mut self) -> &mut dyn FeedbackPlayer {
        self.0.as_mut()
    }
}

impl Default for ActiveFeedbackPlayer {
    fn default() -> Self {
        Self::new(TimedFeedbackPlayer::default())
    }
}

pub const DEFAULT_CUE_SECONDS: f32 = 0.5;

/// Logs each cue and reports it playing for a fixed duration.
#[derive(Debug, Clone)]
pub struct TimedFeedbackPlayer {
    cue_seconds: f32,
    remaining: f32,
    current: Option<FeedbackCue>,
    played: u64,
}

impl TimedFeedbackPlayer {
    pub fn new(cue_seconds: f32) -> Self {
        Self {
            cue_seconds: cue_seconds.max(0.0),
            remaining: 0.0,
            current: None,
            played: 0,
        }
    }

    pub fn current(&self) -> Option<&FeedbackCue> {
        self.current.as_ref()
    }

    pub fn played(&self) -> u64 {
        self.played
    }
}

impl Default for TimedFeedbackPlayer {
    fn default() -> Self {
        Self::new(DEFAULT_CUE_SECONDS)
    }
}

impl FeedbackPlayer for TimedFeedbackPlayer {
    fn play(&mut self, cue: &FeedbackCue) {
        if cue.is_empty() {
            // A newer result with no cue still ends the one that was playing.
            self.stop();
            return;
        }
        debug!(
            target: "processor",
            "Feedback: animation={:?} sound={:?}",
            cue.animation,
            cue.sound
        );
        self.current = Some(cue.clone());
        self.remaining = self.cue_seconds;
        self.played += 1;
    }

    fn stop(&mut self) {
        self.current = None;
        self.remaining = 0.0;
    }

    fn is_finished(&self) -> bool {
        self.current.is_none()
    }

    fn update(&mut self, delta_seconds: f32) {
        if self.current.is_none() {
            return;
        }
        self.remaining -= delta_seconds.max(0.0);
        if self.remaining <= 0.0 {
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue() -> FeedbackCue {
        FeedbackCue {
            animation: Some("cat_play".into()),
            sound: None,
        }
    }

    #[test]
    fn timed_player_finishes_after_cue_length() {
        let mut player = TimedFeedbackPlayer::new(0.3);
        player.play(&cue());
        assert!(!player.is_finished());

        player.update(0.2);
        assert!(!player.is_finished());
        player.update(0.2);
        assert!(player.is_finished());
        assert_eq!(player.played(), 1);
    }

    #[test]
    fn empty_cue_is_ignored() {
        let mut player = TimedFeedbackPlayer::default();
        player.play(&FeedbackCue::default());
        assert!(player.is_finished());
        assert_eq!(player.played(), 0);
    }

    #[test]
    fn empty_cue_stops_the_playing_one() {
        let mut player = TimedFeedbackPlayer::new(5.0);
        player.play(&cue());
        assert!(!player.is_finished());

        player.play(&FeedbackCue::default());
        assert!(player.is_finished());
        assert!(player.current().is_none());
        assert_eq!(player.played(), 1);
    }
}
