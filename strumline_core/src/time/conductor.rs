use log::warn;
use serde::{Deserialize, Serialize};

const FALLBACK_BPM: f64 = 100.0;

/// A beat or step boundary crossed by the song position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pulse {
    Step(i64),
    Beat(i64),
}

/// What to do with indices skipped by a jump in song position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeatFill {
    /// Fire only the newest index.
    #[default]
    Latest,
    /// Fire every skipped index, oldest first.
    Backfill,
}

/// Beat count reached at `time`, and the beat length from there on.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TempoAnchor {
    time: f64,
    beat: f64,
    crochet: f64,
}

/// Derives beat and step pulses from an externally supplied song position.
///
/// Holds no clock of its own: feed it positions with
/// [`update_from_song`](Self::update_from_song) once per tick. Tempo changes
/// are anchored where they happen, so beats after a change stay on the new
/// tempo's grid.
#[derive(Debug, Clone)]
pub struct Conductor {
    bpm: f64,
    /// Sorted by time; the first anchor is at 0 and also covers the count-in.
    anchors: Vec<TempoAnchor>,
    song_position: f64,
    last_beat: Option<i64>,
    last_step: Option<i64>,
    fill: BeatFill,
}

impl Conductor {
    pub fn new(bpm: f64) -> Self {
        let bpm = sanitize_bpm(bpm).unwrap_or_else(|| {
            warn!("conductor got bpm {bpm}, using {FALLBACK_BPM}");
            FALLBACK_BPM
        });
        Self {
            bpm,
            anchors: vec![TempoAnchor {
                time: 0.0,
                beat: 0.0,
                crochet: 60_000.0 / bpm,
            }],
            song_position: 0.0,
            last_beat: None,
            last_step: None,
            fill: BeatFill::Latest,
        }
    }

    pub fn with_fill(mut self, fill: BeatFill) -> Self {
        self.fill = fill;
        self
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Length of one beat in ms at the latest tempo.
    pub fn crochet(&self) -> f64 {
        60_000.0 / self.bpm
    }

    pub fn step_crochet(&self) -> f64 {
        self.crochet() / 4.0
    }

    pub fn song_position(&self) -> f64 {
        self.song_position
    }

    /// Fractional beat count at `time` ms.
    pub fn beat_at(&self, time: f64) -> f64 {
        let found = self.anchors.partition_point(|a| a.time <= time);
        let anchor = &self.anchors[found.saturating_sub(1)];
        anchor.beat + (time - anchor.time) / anchor.crochet
    }

    pub fn current_beat(&self) -> i64 {
        self.beat_at(self.song_position).floor() as i64
    }

    pub fn current_step(&self) -> i64 {
        (self.beat_at(self.song_position) * 4.0).floor() as i64
    }

    pub fn last_beat(&self) -> Option<i64> {
        self.last_beat
    }

    pub fn last_step(&self) -> Option<i64> {
        self.last_step
    }

    /// Changes tempo from the last position seen, without touching the
    /// fired indices.
    pub fn set_bpm(&mut self, bpm: f64) {
        self.set_bpm_at(self.song_position, bpm);
    }

    /// Changes tempo from `time` ms on. Anchors at or after `time` are
    /// replaced.
    pub fn set_bpm_at(&mut self, time: f64, bpm: f64) {
        let Some(bpm) = sanitize_bpm(bpm) else {
            warn!("ignoring bpm change to {bpm}");
            return;
        };
        let time = time.max(0.0);
        let beat = self.beat_at(time);
        let keep = self.anchors.partition_point(|a| a.time < time).max(1);
        self.anchors.truncate(keep);
        let anchor = TempoAnchor {
            time,
            beat,
            crochet: 60_000.0 / bpm,
        };
        if time == 0.0 {
            self.anchors[0] = anchor;
        } else {
            self.anchors.push(anchor);
        }
        self.bpm = bpm;
    }

    /// Steps fire before the beat they belong to.
    pub fn update_from_song(&mut self, song_position: f64) -> Vec<Pulse> {
        self.song_position = song_position;

        let mut pulses = Vec::new();
        let step = self.current_step();
        let beat = self.current_beat();
        advance(&mut self.last_step, step, self.fill, &mut pulses, Pulse::Step);
        advance(&mut self.last_beat, beat, self.fill, &mut pulses, Pulse::Beat);
        pulses
    }
}

fn advance(
    last: &mut Option<i64>,
    current: i64,
    fill: BeatFill,
    pulses: &mut Vec<Pulse>,
    make: fn(i64) -> Pulse,
) {
    if let Some(previous) = *last {
        if current <= previous {
            // Backward seek: resync so the next crossing fires again.
            *last = Some(current);
            return;
        }
    }
    if current < 0 {
        return;
    }

    let first = match (fill, *last) {
        (BeatFill::Backfill, Some(previous)) => (previous + 1).max(0),
        (BeatFill::Backfill, None) => 0,
        (BeatFill::Latest, _) => current,
    };
    pulses.extend((first..=current).map(make));
    *last = Some(current);
}

fn sanitize_bpm(bpm: f64) -> Option<f64> {
    (bpm.is_finite() && bpm > 0.0).then_some(bpm)
}
