//! FIFO consumer of accepted interactions.
//!
//! Each result is applied in one synchronous step when it reaches the front
//! of the queue: true stat values, flags and the clock move to their final
//! values and `InteractionApplied` is published. Only the displayed values
//! then animate; `InteractionCompleted` follows once the animation and the
//! feedback cue have both finished (or were snapped).
use std::collections::VecDeque;

use bevy::prelude::*;
use serde_json::json;

use crate::{
    bus::{BusInbox, EventBus},
    stats::{config::DisplayDurations, GameFlags, NumericStore, StatKey},
    world::time::GameClock,
};

use super::{
    catalog::InteractionCatalog,
    events::{DayStarted, InteractionApplied, InteractionCompleted, InteractionStarted},
    feedback::FeedbackPlayer,
    tween::{DisplayedStats, ValueTween},
    types::InteractionResult,
};

/// Signal carrying one stat change for HUD flashes.
pub const STAT_FEEDBACK_SIGNAL: &str = "feedback.stat";

/// Everything the processor writes while applying a result.
pub struct ApplyTargets<'a> {
    pub stats: &'a mut dyn NumericStore,
    pub flags: &'a mut GameFlags,
    pub clock: &'a mut GameClock,
    pub feedback: &'a mut dyn FeedbackPlayer,
    pub bus: &'a EventBus,
}

#[derive(Debug)]
struct ActiveResult {
    result: InteractionResult,
    tweens: Vec<(StatKey, ValueTween)>,
}

impl ActiveResult {
    fn animation_finished(&self) -> bool {
        self.tweens.iter().all(|(_, tween)| tween.is_finished())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorMetrics {
    pub enqueued: u64,
    pub applied: u64,
    pub completed: u64,
    pub snapped: u64,
}

#[derive(Resource, Debug)]
pub struct ResultProcessor {
    queue: VecDeque<InteractionResult>,
    active: Option<ActiveResult>,
    displayed: DisplayedStats,
    durations: DisplayDurations,
    started: BusInbox<InteractionStarted>,
    metrics: ProcessorMetrics,
}

impl ResultProcessor {
    pub fn new(bus: &EventBus, durations: DisplayDurations, store: &dyn NumericStore) -> Self {
        Self {
            queue: VecDeque::new(),
            active: None,
            displayed: DisplayedStats::from_store(store),
            durations,
            started: BusInbox::attach(bus),
            metrics: ProcessorMetrics::default(),
        }
    }

    pub fn displayed(&self) -> &DisplayedStats {
        &self.displayed
    }

    pub fn metrics(&self) -> ProcessorMetrics {
        self.metrics
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn active_result(&self) -> Option<&InteractionResult> {
        self.active.as_ref().map(|active| &active.result)
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    /// Turns every `InteractionStarted` received since the last call into a
    /// queued result.
    pub fn collect_started(&mut self, catalog: &InteractionCatalog) -> usize {
        let started = self.started.drain();
        let count = started.len();
        for event in started {
            let template = catalog
                .get(&event.request.name)
                .map(|descriptor| &descriptor.effect);
            self.enqueue(InteractionResult::resolve(event.request, template));
        }
        count
    }

    pub fn enqueue(&mut self, result: InteractionResult) {
        debug!(
            target: "processor",
            "Queued {} `{}` ({} ahead)",
            result.request.id,
            result.request.name,
            self.queue.len() + usize::from(self.active.is_some())
        );
        self.metrics.enqueued += 1;
        self.queue.push_back(result);
    }

    /// Advances the active animation and starts the next queued result
    /// once it completes.
    pub fn tick(&mut self, delta_seconds: f32, targets: &mut ApplyTargets<'_>) {
        if let Some(active) = self.active.as_mut() {
            for (key, tween) in &mut active.tweens {
                self.displayed.set(*key, tween.advance(delta_seconds));
            }
        }
        self.drain_finished(targets);
    }

    /// Applies `result` now, snapping whatever was animating first. Queued
    /// results keep their place.
    pub fn process_immediate(&mut self, result: InteractionResult, targets: &mut ApplyTargets<'_>) {
        self.cancel_active(targets);
        self.metrics.enqueued += 1;
        self.begin(result, targets);
        self.cancel_active(targets);
    }

    /// Snaps the active animation to its target and completes it.
    pub fn cancel_active(&mut self, targets: &mut ApplyTargets<'_>) -> bool {
        let Some(mut active) = self.active.take() else {
            return false;
        };
        for (key, tween) in &mut active.tweens {
            self.displayed.set(*key, tween.snap());
        }
        targets.feedback.stop();
        self.metrics.snapped += 1;
        debug!(target: "processor", "Snapped {}", active.result.request.id);
        self.complete(active, targets.bus);
        true
    }

    /// Drops queued results without applying them and snaps the active one.
    /// Used when a snapshot replaces the game state.
    pub fn abandon_pending(&mut self, targets: &mut ApplyTargets<'_>) -> usize {
        self.cancel_active(targets);
        let dropped: Vec<_> = self.queue.drain(..).collect();
        for result in &dropped {
            targets.bus.publish(&InteractionCompleted {
                request: result.request.clone(),
                success: false,
                message: result.message.clone(),
                travel_to: None,
                enter_mode: None,
            });
        }
        if !dropped.is_empty() {
            info!(target: "processor", "Abandoned {} queued result(s)", dropped.len());
        }
        dropped.len()
    }

    /// Re-reads every displayed value from the store.
    pub fn resync_displayed(&mut self, store: &dyn NumericStore) {
        self.displayed = DisplayedStats::from_store(store);
    }

    fn drain_finished(&mut self, targets: &mut ApplyTargets<'_>) {
        loop {
            if let Some(active) = self.active.as_ref() {
                if !(active.animation_finished() && targets.feedback.is_finished()) {
                    return;
                }
                if let Some(active) = self.active.take() {
                    self.complete(active, targets.bus);
                }
            }

            let Some(next) = self.queue.pop_front() else {
                return;
            };
            self.begin(next, targets);
        }
    }

    fn begin(&mut self, result: InteractionResult, targets: &mut ApplyTargets<'_>) {
        let mut tweens = Vec::with_capacity(result.deltas.len());
        let mut applied = Vec::with_capacity(result.deltas.len());

        for delta in &result.deltas {
            let before = targets.stats.value(delta.key);
            let after = targets.stats.set_value(delta.key, before + delta.delta);
            let shown = self.displayed.get(delta.key);
            let duration = self.durations.for_category(delta.key.category());
            tweens.push((delta.key, ValueTween::new(shown, after, duration)));
            applied.push(*delta);

            targets.bus.publish_signal(
                STAT_FEEDBACK_SIGNAL,
                json!({
                    "stat": delta.key.label(),
                    "category": delta.key.category().label(),
                    "delta": delta.delta,
                    "value": after,
                }),
            );
        }

        let effect = &result.effect;
        for flag in &effect.set_flags {
            targets.flags.set(flag.clone());
        }
        for flag in &effect.clear_flags {
            targets.flags.clear(flag);
        }
        if effect.time_cost > 0 {
            let advance = targets.clock.advance(effect.time_cost);
            if advance.days_rolled > 0 {
                info!(target: "processor", "Day {} begins", targets.clock.day());
                targets.bus.publish(&DayStarted {
                    day: targets.clock.day(),
                });
            }
        }
        targets.feedback.play(&effect.feedback);

        info!(
            target: "processor",
            "Applied {} `{}`: {}",
            result.request.id,
            result.request.name,
            result.message
        );
        self.metrics.applied += 1;
        targets.bus.publish(&InteractionApplied {
            request_id: result.request.id,
            name: result.request.name.clone(),
            deltas: applied,
            message: result.message.clone(),
        });

        self.active = Some(ActiveResult { result, tweens });
    }

    fn complete(&mut self, active: ActiveResult, bus: &EventBus) {
        let result = active.result;
        self.metrics.completed += 1;
        debug!(target: "processor", "Completed {} `{}`", result.request.id, result.request.name);
        bus.publish(&InteractionCompleted {
            travel_to: result.effect.travel_to,
            enter_mode: result.effect.enter_mode,
            request: result.request,
            success: result.success,
            message: result.message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        interaction::{
            feedback::TimedFeedbackPlayer,
            types::{EffectTemplate, FeedbackCue, InteractionRequest, RequestId, TargetId},
        },
        stats::GameStats,
    };

    struct Harness {
        bus: EventBus,
        stats: GameStats,
        flags: GameFlags,
        clock: GameClock,
        feedback: TimedFeedbackPlayer,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                bus: EventBus::default(),
                stats: GameStats::default(),
                flags: GameFlags::default(),
                clock: GameClock::default(),
                feedback: TimedFeedbackPlayer::new(0.0),
            }
        }

        fn targets(&mut self) -> ApplyTargets<'_> {
            ApplyTargets {
                stats: &mut self.stats,
                flags: &mut self.flags,
                clock: &mut self.clock,
                feedback: &mut self.feedback,
                bus: &self.bus,
            }
        }

        fn processor(&self) -> ResultProcessor {
            ResultProcessor::new(&self.bus, DisplayDurations::default(), &self.stats)
        }
    }

    fn result(id: u64, effect: EffectTemplate) -> InteractionResult {
        let request = InteractionRequest {
            id: RequestId::new(id),
            name: format!("Test{id}"),
            target: TargetId::new("desk"),
            requested_at: 0.0,
        };
        InteractionResult::resolve(request, Some(&effect))
    }

    fn money(delta: f32) -> EffectTemplate {
        EffectTemplate::default().with_delta(StatKey::Money, delta)
    }

    #[test]
    fn true_value_is_final_while_display_lags() {
        let mut harness = Harness::new();
        harness.stats.set_value(StatKey::Money, 100.0);
        let mut processor = harness.processor();
        let completed = BusInbox::<InteractionCompleted>::attach(&harness.bus);

        processor.enqueue(result(1, money(120.0)));
        processor.tick(0.0, &mut harness.targets());

        assert_eq!(harness.stats.value(StatKey::Money), 220.0);
        assert_eq!(processor.displayed().get(StatKey::Money), 100.0);

        processor.tick(0.6, &mut harness.targets());
        let midway = processor.displayed().get(StatKey::Money);
        assert!(midway > 100.0 && midway < 220.0);
        assert_eq!(harness.stats.value(StatKey::Money), 220.0);
        assert!(completed.is_empty());

        processor.tick(0.7, &mut harness.targets());
        assert_eq!(processor.displayed().get(StatKey::Money), 220.0);
        assert_eq!(completed.len(), 1);
        assert!(processor.is_idle());
    }

    #[test]
    fn results_run_one_at_a_time_in_order() {
        let mut harness = Harness::new();
        harness.stats.set_value(StatKey::Money, 0.0);
        let mut processor = harness.processor();
        let applied = BusInbox::<InteractionApplied>::attach(&harness.bus);

        processor.enqueue(result(1, money(10.0)));
        processor.enqueue(result(2, money(20.0)));
        processor.tick(0.0, &mut harness.targets());

        assert_eq!(harness.stats.value(StatKey::Money), 10.0);
        assert_eq!(processor.queue_len(), 1);

        processor.tick(5.0, &mut harness.targets());
        assert_eq!(harness.stats.value(StatKey::Money), 30.0);
        let ids: Vec<u64> = applied.drain().iter().map(|e| e.request_id.value()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn each_result_applies_exactly_once() {
        let mut harness = Harness::new();
        harness.stats.set_value(StatKey::Mood, 10.0);
        let mut processor = harness.processor();

        processor.enqueue(result(1, EffectTemplate::default().with_delta(StatKey::Mood, 5.0)));
        for _ in 0..20 {
            processor.tick(0.1, &mut harness.targets());
        }
        processor.cancel_active(&mut harness.targets());

        assert_eq!(harness.stats.value(StatKey::Mood), 15.0);
        assert_eq!(processor.metrics().applied, 1);
        assert_eq!(processor.metrics().completed, 1);
    }

    #[test]
    fn process_immediate_snaps_the_active_animation() {
        let mut harness = Harness::new();
        harness.stats.set_value(StatKey::Money, 0.0);
        let mut processor = harness.processor();
        let completed = BusInbox::<InteractionCompleted>::attach(&harness.bus);

        processor.enqueue(result(1, money(50.0)));
        processor.tick(0.1, &mut harness.targets());
        processor.process_immediate(result(2, money(25.0)), &mut harness.targets());

        assert_eq!(harness.stats.value(StatKey::Money), 75.0);
        assert_eq!(processor.displayed().get(StatKey::Money), 75.0);
        let ids: Vec<u64> = completed.drain().iter().map(|e| e.request.id.value()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(processor.metrics().snapped, 2);
    }

    #[test]
    fn flags_clock_and_day_rollover_are_applied() {
        let mut harness = Harness::new();
        harness.clock.set(crate::world::time::ClockReading { day: 1, slot: 9 });
        let mut processor = harness.processor();
        let days = BusInbox::<DayStarted>::attach(&harness.bus);

        let effect = EffectTemplate::default()
            .with_time_cost(3)
            .setting_flag("worked_once");
        processor.enqueue(result(1, effect));
        processor.tick(0.0, &mut harness.targets());

        assert!(harness.flags.is_set("worked_once"));
        assert_eq!(harness.clock.day(), 2);
        assert_eq!(days.drain(), vec![DayStarted { day: 2 }]);
    }

    #[test]
    fn completion_waits_for_feedback() {
        let mut harness = Harness::new();
        harness.feedback = TimedFeedbackPlayer::new(2.0);
        let mut processor = harness.processor();
        let completed = BusInbox::<InteractionCompleted>::attach(&harness.bus);

        let mut effect = EffectTemplate::default().with_delta(StatKey::Energy, -5.0);
        effect.feedback = FeedbackCue {
            animation: Some("yawn".into()),
            sound: None,
        };
        processor.enqueue(result(1, effect));
        processor.tick(0.0, &mut harness.targets());
        processor.tick(1.0, &mut harness.targets());
        assert!(completed.is_empty());

        harness.feedback.update(2.0);
        processor.tick(0.0, &mut harness.targets());
        assert_eq!(completed.len(), 1);
    }

    #[test]
    fn collect_started_resolves_through_catalog() {
        let harness = Harness::new();
        let mut processor = harness.processor();
        let catalog = InteractionCatalog::builtin();

        harness.bus.publish(&InteractionStarted {
            request: InteractionRequest {
                id: RequestId::new(7),
                name: "HelpWork".into(),
                target: TargetId::new("desk"),
                requested_at: 0.0,
            },
        });
        assert_eq!(processor.collect_started(&catalog), 1);
        assert_eq!(processor.queue_len(), 1);
    }

    #[test]
    fn stat_changes_emit_feedback_signal() {
        let mut harness = Harness::new();
        let mut processor = harness.processor();
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        harness.bus.subscribe_signal(STAT_FEEDBACK_SIGNAL, move |payload| {
            sink.lock().unwrap().push(payload.clone());
            Ok(())
        });

        processor.enqueue(result(1, money(5.0)));
        processor.tick(0.0, &mut harness.targets());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["stat"], "money");
        assert_eq!(seen[0]["category"], "currency");
    }
}
