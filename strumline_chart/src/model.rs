use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const LANE_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Lane {
    Left,
    Down,
    Up,
    Right,
}

impl Lane {
    pub const ALL: [Lane; LANE_COUNT] = [Lane::Left, Lane::Down, Lane::Up, Lane::Right];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Lane::Left => "left",
            Lane::Down => "down",
            Lane::Up => "up",
            Lane::Right => "right",
        }
    }
}

/// Which strumline a note belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Player,
    Opponent,
}

impl Side {
    pub fn index(self) -> usize {
        match self {
            Side::Player => 0,
            Side::Opponent => 1,
        }
    }
}

/// Lifecycle flags of a note during playback.
///
/// Fields are only reachable through [`Note`]'s transition methods, which keep
/// `was_hit`/`too_late` exclusive and one-way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteState {
    spawned: bool,
    was_hit: bool,
    too_late: bool,
    is_being_held: bool,
    hold_released: bool,
    hold_dropped: bool,
    hold_end_passed: bool,
    hold_segments_destroyed: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Absolute song time (ms) at which the note should be hit.
    pub strum_time: f64,
    pub lane: Lane,
    /// Hold duration in ms; 0 for taps.
    pub sustain_length: f64,
    pub side: Side,
    /// Index of the chart section the note came from.
    pub section: usize,
    state: NoteState,
}

impl Note {
    pub fn new(strum_time: f64, lane: Lane, sustain_length: f64, side: Side) -> Self {
        Self {
            strum_time,
            lane,
            sustain_length: sustain_length.max(0.0),
            side,
            section: 0,
            state: NoteState::default(),
        }
    }

    pub fn with_section(mut self, section: usize) -> Self {
        self.section = section;
        self
    }

    pub fn is_hold(&self) -> bool {
        self.sustain_length > 0.0
    }

    pub fn end_time(&self) -> f64 {
        self.strum_time + self.sustain_length
    }

    pub fn state(&self) -> &NoteState {
        &self.state
    }

    pub fn spawned(&self) -> bool {
        self.state.spawned
    }

    pub fn was_hit(&self) -> bool {
        self.state.was_hit
    }

    pub fn too_late(&self) -> bool {
        self.state.too_late
    }

    pub fn is_being_held(&self) -> bool {
        self.state.is_being_held
    }

    pub fn hold_released(&self) -> bool {
        self.state.hold_released
    }

    pub fn hold_dropped(&self) -> bool {
        self.state.hold_dropped
    }

    pub fn hold_end_passed(&self) -> bool {
        self.state.hold_end_passed
    }

    pub fn hold_segments_destroyed(&self) -> u32 {
        self.state.hold_segments_destroyed
    }

    /// Still eligible for a hit or an auto-miss.
    pub fn is_pending(&self) -> bool {
        !self.state.was_hit && !self.state.too_late
    }

    /// Nothing left to judge on this note.
    pub fn is_resolved(&self) -> bool {
        if self.state.too_late {
            return true;
        }
        self.state.was_hit
            && (!self.is_hold()
                || self.state.hold_end_passed
                || self.state.hold_released
                || self.state.hold_dropped)
    }

    pub fn mark_spawned(&mut self) -> bool {
        if self.state.spawned {
            return false;
        }
        self.state.spawned = true;
        true
    }

    pub fn mark_hit(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.state.was_hit = true;
        true
    }

    pub fn mark_too_late(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.state.too_late = true;
        true
    }

    pub fn begin_hold(&mut self) -> bool {
        if !self.state.was_hit
            || !self.is_hold()
            || self.state.is_being_held
            || self.state.hold_released
            || self.state.hold_end_passed
        {
            return false;
        }
        self.state.is_being_held = true;
        true
    }

    /// The sustain reached its end while held.
    pub fn finish_hold(&mut self) -> bool {
        if !self.state.was_hit || !self.is_hold() || self.state.hold_end_passed {
            return false;
        }
        self.state.hold_end_passed = true;
        self.state.is_being_held = false;
        true
    }

    /// Key released close enough to the end to count as a full hold.
    pub fn release_hold(&mut self) -> bool {
        if !self.state.is_being_held {
            return false;
        }
        self.state.is_being_held = false;
        self.state.hold_released = true;
        true
    }

    /// The rest of the sustain is forfeited.
    pub fn drop_hold(&mut self) -> bool {
        if !self.state.was_hit
            || !self.is_hold()
            || self.state.hold_dropped
            || self.state.hold_end_passed
        {
            return false;
        }
        self.state.hold_dropped = true;
        self.state.hold_released = true;
        self.state.is_being_held = false;
        true
    }

    pub fn eat_hold_segment(&mut self) -> u32 {
        self.state.hold_segments_destroyed += 1;
        self.state.hold_segments_destroyed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptEvent {
    pub time: f64,
    pub script: Option<String>,
    /// Entry point to invoke on the script; `"run"` when the chart omits it.
    pub kind: String,
    pub params: Value,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BpmChange {
    pub time: f64,
    pub bpm: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub song: Option<String>,
    pub bpm: f64,
    pub speed: f64,
    pub needs_voices: bool,
    pub notes: Vec<Note>,
    pub events: Vec<ScriptEvent>,
    pub bpm_changes: Vec<BpmChange>,
}

impl Chart {
    pub fn new(bpm: f64, speed: f64, mut notes: Vec<Note>) -> Self {
        sort_notes(&mut notes);
        Self {
            song: None,
            bpm,
            speed,
            needs_voices: false,
            notes,
            events: Vec::new(),
            bpm_changes: Vec::new(),
        }
    }

    pub fn lane_count(&self) -> usize {
        LANE_COUNT
    }

    pub fn notes_for(&self, side: Side) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(move |n| n.side == side)
    }

    pub fn hold_count(&self) -> usize {
        self.notes.iter().filter(|n| n.is_hold()).count()
    }

    /// Time at which the last note (including its sustain) ends.
    pub fn last_note_end(&self) -> f64 {
        self.notes.iter().map(Note::end_time).fold(0.0, f64::max)
    }
}

/// Ascending strum time, ties by lane. Stable, so duplicates keep chart order.
pub fn sort_notes(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        a.strum_time
            .total_cmp(&b.strum_time)
            .then(a.lane.cmp(&b.lane))
    });
}
