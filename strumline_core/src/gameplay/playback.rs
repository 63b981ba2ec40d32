use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use log::{debug, info, warn};
use parking_lot::Mutex;
use strumline_chart::{Chart, Lane, ScriptEvent, Side, LANE_COUNT};

use super::hit_window::Rating;
use super::judge::{HoldOutcome, JudgeMachine, JudgmentResult, Miss, MissKind, ReleaseOutcome};
use super::rating::{RatingAggregator, RatingDelta, RatingSnapshot};
use super::scheduler::NoteScheduler;
use crate::audio::AudioTransport;
use crate::config::EngineConfig;
use crate::hooks::Hook;
use crate::input::events::{Button, InputEvent};
use crate::input::strategy::InputStrategy;
use crate::input::InputQueue;
use crate::presentation::{EngineContext, VisualEntityFactory};
use crate::time::conductor::{Conductor, Pulse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Finished,
    TornDown,
}

/// What happened during one tick, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Pulse(Pulse),
    BpmChanged(f64),
    ScriptEvent(ScriptEvent),
    Hit(JudgmentResult, RatingDelta),
    OpponentHit(JudgmentResult),
    Miss(Miss, RatingDelta),
    /// A press with nothing in range while ghost tapping is off.
    GhostMiss(Lane, RatingDelta),
    HoldCompleted(HoldOutcome),
    HoldReleased(HoldOutcome),
    HealthDepleted,
    BotToggled(InputStrategy),
    PauseRequested,
    ResetRequested,
    SongEnded(RatingSnapshot),
}

pub type SharedPlayback<F> = Arc<Mutex<Playback<F>>>;

/// Runs one chart against one audio transport.
///
/// Call [`tick`](Self::tick) once per frame. The chart's notes are owned here
/// and lent to the scheduler and the judge in turn.
pub struct Playback<F: VisualEntityFactory> {
    chart: Chart,
    config: EngineConfig,
    conductor: Conductor,
    scheduler: NoteScheduler,
    judge: JudgeMachine,
    rating: RatingAggregator,
    strategy: InputStrategy,
    input: InputQueue,
    held: [bool; LANE_COUNT],
    transport: Box<dyn AudioTransport>,
    ctx: EngineContext<F>,
    completed: Arc<AtomicBool>,
    phase: Phase,
    next_bpm_change: usize,
    next_script_event: usize,
    health_depleted: bool,
    position: f64,
}

impl<F: VisualEntityFactory> Playback<F> {
    pub fn new(
        chart: Chart,
        config: EngineConfig,
        mut transport: Box<dyn AudioTransport>,
        ctx: EngineContext<F>,
    ) -> Self {
        let completed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&completed);
        transport.on_complete(Box::new(move || flag.store(true, Ordering::Release)));

        let conductor = Conductor::new(chart.bpm).with_fill(config.beat_fill);
        let scheduler = NoteScheduler::new(config.scroll, config.layout, chart.bpm, chart.speed);
        let judge = JudgeMachine::new(config.hit_window.clone());
        let rating = RatingAggregator::new(config.hit_window.clone(), config.score_curve, config.health);
        let strategy = config.input;

        info!(
            "playback ready: {:?}, {} notes, strategy {:?}",
            chart.song,
            chart.notes.len(),
            strategy
        );

        Self {
            chart,
            config,
            conductor,
            scheduler,
            judge,
            rating,
            strategy,
            input: InputQueue::new(),
            held: [false; LANE_COUNT],
            transport,
            ctx,
            completed,
            phase: Phase::Running,
            next_bpm_change: 0,
            next_script_event: 0,
            health_depleted: false,
            position: 0.0,
        }
    }

    pub fn into_shared(self) -> SharedPlayback<F> {
        Arc::new(Mutex::new(self))
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn conductor(&self) -> &Conductor {
        &self.conductor
    }

    pub fn scheduler(&self) -> &NoteScheduler {
        &self.scheduler
    }

    pub fn judge(&self) -> &JudgeMachine {
        &self.judge
    }

    pub fn rating(&self) -> &RatingAggregator {
        &self.rating
    }

    pub fn strategy(&self) -> InputStrategy {
        self.strategy
    }

    pub fn context(&self) -> &EngineContext<F> {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut EngineContext<F> {
        &mut self.ctx
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Song position seen by the last tick.
    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn push_input(&self, event: InputEvent) {
        self.input.push(event);
    }

    /// For input threads; events are applied on the next tick.
    pub fn input_sender(&self) -> Sender<InputEvent> {
        self.input.sender()
    }

    pub fn tick(&mut self) -> Vec<PlaybackEvent> {
        if self.phase != Phase::Running {
            return Vec::new();
        }
        let pos = self.transport.position_ms();
        self.position = pos;
        let mut events = Vec::new();

        while let Some(change) = self.chart.bpm_changes.get(self.next_bpm_change) {
            if change.time > pos {
                break;
            }
            self.conductor.set_bpm_at(change.time, change.bpm);
            self.scheduler.set_bpm(change.bpm);
            debug!("bpm -> {} at {:.1}ms", change.bpm, change.time);
            events.push(PlaybackEvent::BpmChanged(change.bpm));
            self.next_bpm_change += 1;
        }

        for pulse in self.conductor.update_from_song(pos) {
            let hook = match pulse {
                Pulse::Step(step) => Hook::StepHit(step),
                Pulse::Beat(beat) => Hook::BeatHit(beat),
            };
            self.ctx.hooks.dispatch(&hook);
            events.push(PlaybackEvent::Pulse(pulse));
        }

        while let Some(event) = self.chart.events.get(self.next_script_event) {
            if event.time > pos {
                break;
            }
            self.ctx.hooks.dispatch(&Hook::ScriptEvent(event));
            events.push(PlaybackEvent::ScriptEvent(event.clone()));
            self.next_script_event += 1;
        }

        self.scheduler
            .spawn_notes_in_range(pos, &mut self.chart.notes, &mut self.ctx.factory);
        self.scheduler
            .update_note_positions(pos, &self.chart.notes, &mut self.ctx.factory);
        self.scheduler
            .update_active_holds(pos, &mut self.chart.notes, &mut self.ctx.factory);

        self.process_input(&mut events);
        if self.strategy.is_bot() {
            for result in self.judge.auto_hit(Side::Player, pos, &mut self.chart.notes) {
                self.on_player_hit(result, &mut events);
            }
        }
        for result in self.judge.auto_hit(Side::Opponent, pos, &mut self.chart.notes) {
            self.on_opponent_hit(result, &mut events);
        }

        for outcome in self.judge.update_holds(pos, &mut self.chart.notes) {
            self.scheduler.release(outcome.note_index, &mut self.ctx.factory);
            events.push(PlaybackEvent::HoldCompleted(outcome));
        }
        for miss in self.judge.check_misses(pos, &mut self.chart.notes) {
            self.on_miss(miss, &mut events);
        }
        self.scheduler.purge_passed(pos, &self.chart.notes, &mut self.ctx.factory);

        if self.completed.load(Ordering::Acquire) {
            events.extend(self.finish());
        }
        events
    }

    fn process_input(&mut self, events: &mut Vec<PlaybackEvent>) {
        for input in self.input.drain() {
            let Some(lane) = input.button.lane() else {
                if input.pressed {
                    match input.button {
                        Button::Pause => events.push(PlaybackEvent::PauseRequested),
                        Button::Reset => events.push(PlaybackEvent::ResetRequested),
                        Button::ToggleBot => events.extend(self.toggle_bot()),
                        _ => {}
                    }
                }
                continue;
            };
            if !self.strategy.reads_lanes() {
                debug!("bot input active, ignoring {:?}", input.button);
                continue;
            }

            if input.pressed {
                if std::mem::replace(&mut self.held[lane.index()], true) {
                    continue;
                }
                match self.judge.judge_input(lane, input.timestamp, &mut self.chart.notes) {
                    Some(result) => self.on_player_hit(result, events),
                    None if !self.config.ghost_tapping => self.on_ghost_miss(lane, events),
                    None => {}
                }
            } else {
                self.held[lane.index()] = false;
                match self.judge.release_hold(lane, input.timestamp, &mut self.chart.notes) {
                    Some(ReleaseOutcome::Clean(outcome)) => {
                        self.scheduler.release(outcome.note_index, &mut self.ctx.factory);
                        events.push(PlaybackEvent::HoldReleased(outcome));
                    }
                    Some(ReleaseOutcome::Early(miss)) => self.on_miss(miss, events),
                    None => {}
                }
            }
        }
    }

    /// Switches between player input and bot play. Leaving bot play lets go
    /// of the holds the bot was keeping.
    pub fn toggle_bot(&mut self) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        if self.phase != Phase::Running {
            return events;
        }
        let was_bot = self.strategy.is_bot();
        self.strategy = self.strategy.toggled();
        self.held = [false; LANE_COUNT];
        if was_bot {
            for outcome in self.judge.release_all(Side::Player, &mut self.chart.notes) {
                self.scheduler.release(outcome.note_index, &mut self.ctx.factory);
                events.push(PlaybackEvent::HoldReleased(outcome));
            }
        }
        info!("input strategy -> {:?}", self.strategy);
        events.push(PlaybackEvent::BotToggled(self.strategy));
        events
    }

    fn on_player_hit(&mut self, result: JudgmentResult, events: &mut Vec<PlaybackEvent>) {
        let delta = self.rating.process_hit(result.rating, result.delta);
        self.present(Some(result.rating));
        self.dispatch_hit(&result);
        events.push(PlaybackEvent::Hit(result, delta));
        self.check_health(&delta, events);
    }

    fn on_opponent_hit(&mut self, result: JudgmentResult, events: &mut Vec<PlaybackEvent>) {
        self.dispatch_hit(&result);
        events.push(PlaybackEvent::OpponentHit(result));
    }

    fn dispatch_hit(&mut self, result: &JudgmentResult) {
        self.ctx.hooks.dispatch(&Hook::NoteHit {
            side: result.side,
            lane: result.lane,
            rating: result.rating,
            delta: result.delta,
        });
        if result.is_hold {
            self.scheduler.hide_head(result.note_index, &mut self.ctx.factory);
        } else {
            self.scheduler.release(result.note_index, &mut self.ctx.factory);
        }
    }

    fn on_miss(&mut self, miss: Miss, events: &mut Vec<PlaybackEvent>) {
        let delta = self.rating.process_miss();
        self.present(None);
        self.ctx.hooks.dispatch(&Hook::NoteMiss {
            side: miss.side,
            lane: miss.lane,
            note_index: Some(miss.note_index),
        });
        match miss.kind {
            MissKind::Late => self.scheduler.dim(miss.note_index, &mut self.ctx.factory),
            MissKind::EarlyRelease => {
                self.scheduler.release(miss.note_index, &mut self.ctx.factory);
            }
        }
        events.push(PlaybackEvent::Miss(miss, delta));
        self.check_health(&delta, events);
    }

    fn on_ghost_miss(&mut self, lane: Lane, events: &mut Vec<PlaybackEvent>) {
        let delta = self.rating.process_miss();
        self.present(None);
        self.ctx.hooks.dispatch(&Hook::NoteMiss {
            side: Side::Player,
            lane,
            note_index: None,
        });
        events.push(PlaybackEvent::GhostMiss(lane, delta));
        self.check_health(&delta, events);
    }

    fn present(&mut self, rating: Option<Rating>) {
        let snapshot = self.rating.snapshot();
        let presentation = &mut self.ctx.presentation;
        presentation.popup(rating);
        presentation.score_changed(&snapshot);
        presentation.health_changed(self.rating.health(), self.rating.max_health());
    }

    fn check_health(&mut self, delta: &RatingDelta, events: &mut Vec<PlaybackEvent>) {
        if delta.health_depleted && !self.health_depleted {
            self.health_depleted = true;
            warn!("health depleted at {:.1}ms", self.position);
            events.push(PlaybackEvent::HealthDepleted);
        }
    }

    /// Runs end-of-song and tears down. Only the first call does anything.
    pub fn finish(&mut self) -> Vec<PlaybackEvent> {
        if self.phase != Phase::Running {
            return Vec::new();
        }
        self.phase = Phase::Finished;
        self.ctx.hooks.dispatch(&Hook::SongEnd);
        let snapshot = self.rating.snapshot();
        info!(
            "song ended: score {} accuracy {:.2}% misses {} max combo {}",
            snapshot.score,
            snapshot.accuracy * 100.0,
            snapshot.misses,
            snapshot.max_combo
        );
        self.teardown();
        vec![PlaybackEvent::SongEnded(snapshot)]
    }

    /// Stops consuming input and releases every visual. Safe to call any
    /// number of times, from any phase.
    pub fn teardown(&mut self) {
        if self.phase == Phase::TornDown {
            return;
        }
        self.phase = Phase::TornDown;
        for side in [Side::Player, Side::Opponent] {
            self.judge.release_all(side, &mut self.chart.notes);
        }
        let released = self.scheduler.teardown(&mut self.ctx.factory);
        let dropped = self.input.drain().len();
        self.held = [false; LANE_COUNT];
        self.ctx.hooks.dispatch(&Hook::Destroy);
        debug!("playback torn down: {released} visual(s) released, {dropped} input event(s) dropped");
    }
}
