use anyhow::bail;
use serde::Serialize;
use strumline_chart::{Chart, Side};
use strumline_core::audio::ManualTransport;
use strumline_core::gameplay::judge::MissKind;
use strumline_core::gameplay::rating::RatingSnapshot;
use strumline_core::input::strategy::InputStrategy;
use strumline_core::presentation::{EngineContext, HeadlessFactory};
use strumline_core::{EngineConfig, Playback, PlaybackEvent};

pub struct Options {
    pub idle: bool,
    pub step_ms: f64,
    pub timeline: bool,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub song: Option<String>,
    pub strategy: InputStrategy,
    pub duration_ms: f64,
    pub ticks: u64,
    pub player_notes: usize,
    pub opponent_hits: u32,
    pub holds_completed: u32,
    pub holds_dropped: u32,
    pub health_depleted: bool,
    pub hook_failures: u64,
    pub result: RatingSnapshot,
}

pub fn run_simulation(chart: Chart, mut config: EngineConfig, options: &Options) -> anyhow::Result<Report> {
    if !(options.step_ms.is_finite() && options.step_ms > 0.0) {
        bail!("--step-ms must be a positive number, got {}", options.step_ms);
    }
    config.input = if options.idle {
        InputStrategy::RealInput
    } else {
        InputStrategy::BotInput
    };

    let end = chart.last_note_end() + config.hit_window.widest_ms() + options.step_ms;
    let mut report = Report {
        song: chart.song.clone(),
        strategy: config.input,
        duration_ms: end,
        ticks: 0,
        player_notes: chart.notes_for(Side::Player).count(),
        opponent_hits: 0,
        holds_completed: 0,
        holds_dropped: 0,
        health_depleted: false,
        hook_failures: 0,
        result: RatingSnapshot::default(),
    };

    let transport = ManualTransport::new();
    transport.play();
    let ctx = EngineContext::new(HeadlessFactory::new());
    let mut playback = Playback::new(chart, config, Box::new(transport.clone()), ctx);

    if options.timeline {
        println!("    Time | Event");
        println!("---------|------------------------------");
    }

    let mut pos = 0.0;
    let mut ended = None;
    while playback.is_running() {
        transport.set_position(pos);
        if pos >= end {
            transport.finish();
        }
        for event in playback.tick() {
            if options.timeline {
                if let Some(line) = describe(&event) {
                    println!("{pos:8.1} | {line}");
                }
            }
            match event {
                PlaybackEvent::OpponentHit(_) => report.opponent_hits += 1,
                PlaybackEvent::HoldCompleted(hold) if hold.side == Side::Player => {
                    report.holds_completed += 1;
                }
                PlaybackEvent::Miss(miss, _) if miss.kind == MissKind::EarlyRelease => {
                    report.holds_dropped += 1;
                }
                PlaybackEvent::HealthDepleted => report.health_depleted = true,
                PlaybackEvent::SongEnded(snapshot) => ended = Some(snapshot),
                _ => {}
            }
        }
        report.ticks += 1;
        pos += options.step_ms;
    }

    report.hook_failures = playback.context().hooks.failure_count();
    report.result = ended.unwrap_or_else(|| playback.rating().snapshot());
    Ok(report)
}

fn describe(event: &PlaybackEvent) -> Option<String> {
    let line = match event {
        PlaybackEvent::Pulse(_) => return None,
        PlaybackEvent::BpmChanged(bpm) => format!("bpm {bpm}"),
        PlaybackEvent::ScriptEvent(ev) => {
            format!("script {} ({})", ev.script.as_deref().unwrap_or("-"), ev.kind)
        }
        PlaybackEvent::Hit(hit, delta) => format!(
            "hit   {:<5} {:<4} {:+6.1}ms combo {}",
            hit.lane.name(),
            hit.rating.name(),
            hit.delta,
            delta.combo
        ),
        PlaybackEvent::OpponentHit(hit) => format!("opp   {:<5}", hit.lane.name()),
        PlaybackEvent::Miss(miss, _) => {
            let kind = match miss.kind {
                MissKind::Late => "late",
                MissKind::EarlyRelease => "early release",
            };
            format!("miss  {:<5} {kind}", miss.lane.name())
        }
        PlaybackEvent::GhostMiss(lane, _) => format!("miss  {:<5} ghost tap", lane.name()),
        PlaybackEvent::HoldCompleted(hold) => format!("hold  {:<5} done ({:?})", hold.lane.name(), hold.side),
        PlaybackEvent::HoldReleased(hold) => format!("hold  {:<5} released ({:?})", hold.lane.name(), hold.side),
        PlaybackEvent::HealthDepleted => "health depleted".to_string(),
        PlaybackEvent::BotToggled(strategy) => format!("input {strategy:?}"),
        PlaybackEvent::PauseRequested => "pause".to_string(),
        PlaybackEvent::ResetRequested => "reset".to_string(),
        PlaybackEvent::SongEnded(_) => "song end".to_string(),
    };
    Some(line)
}

pub fn print_report(report: &Report) {
    let r = &report.result;
    println!("song:       {}", report.song.as_deref().unwrap_or("(untitled)"));
    println!("input:      {:?}", report.strategy);
    println!("ticks:      {} ({:.0} ms)", report.ticks, report.duration_ms);
    println!("score:      {}", r.score);
    println!("accuracy:   {:.2}%", r.accuracy * 100.0);
    println!(
        "judgments:  sick {} / good {} / bad {} / shit {} / miss {}",
        r.sick, r.good, r.bad, r.shit, r.misses
    );
    println!("max combo:  {} of {}", r.max_combo, report.player_notes);
    println!("health:     {:.3}", r.health);
    if report.health_depleted {
        println!("            (health ran out)");
    }
}
