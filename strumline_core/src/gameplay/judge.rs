use log::debug;
use strumline_chart::{Lane, Note, Side, LANE_COUNT};

use super::hit_window::{HitWindow, Rating};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JudgmentResult {
    pub note_index: usize,
    pub lane: Lane,
    pub side: Side,
    pub rating: Rating,
    /// Song position minus strum time; negative means early.
    pub delta: f64,
    pub is_hold: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissKind {
    /// The note scrolled past the widest window unhit.
    Late,
    /// A held sustain was let go before its end.
    EarlyRelease,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Miss {
    pub note_index: usize,
    pub lane: Lane,
    pub side: Side,
    pub kind: MissKind,
    pub delta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldEnd {
    Completed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldOutcome {
    pub note_index: usize,
    pub lane: Lane,
    pub side: Side,
    pub end: HoldEnd,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReleaseOutcome {
    Clean(HoldOutcome),
    Early(Miss),
}

/// Hit/miss evaluation and the hold lifecycle.
///
/// Notes are borrowed per call; the machine itself only remembers the active
/// hold of each (side, lane) and how far late misses have been swept.
pub struct JudgeMachine {
    window: HitWindow,
    active_holds: [[Option<usize>; LANE_COUNT]; 2],
    /// Every note before this index is out of reach of `check_misses`.
    miss_head: usize,
    /// Per side, every note before this index is resolved or belongs to the
    /// other side.
    auto_head: [usize; 2],
}

impl Default for JudgeMachine {
    fn default() -> Self {
        Self::new(HitWindow::default())
    }
}

impl JudgeMachine {
    pub fn new(window: HitWindow) -> Self {
        Self {
            window,
            active_holds: [[None; LANE_COUNT]; 2],
            miss_head: 0,
            auto_head: [0; 2],
        }
    }

    pub fn window(&self) -> &HitWindow {
        &self.window
    }

    pub fn active_hold(&self, side: Side, lane: Lane) -> Option<usize> {
        self.active_holds[side.index()][lane.index()]
    }

    pub fn active_hold_count(&self) -> usize {
        self.active_holds.iter().flatten().filter(|h| h.is_some()).count()
    }

    /// Judges a player press in `lane` against the closest eligible note.
    ///
    /// Returns `None` when nothing is within the widest window.
    pub fn judge_input(&mut self, lane: Lane, pos: f64, notes: &mut [Note]) -> Option<JudgmentResult> {
        let widest = self.window.widest_ms();
        let range = time_range(notes, pos - widest, pos + widest);

        let mut best: Option<(usize, f64)> = None;
        for index in range {
            let note = &notes[index];
            if note.side != Side::Player || note.lane != lane || !note.spawned() || !note.is_pending() {
                continue;
            }
            let diff = (note.strum_time - pos).abs();
            if best.map_or(true, |(_, d)| diff < d) {
                best = Some((index, diff));
            }
        }

        let (index, _) = best?;
        let delta = pos - notes[index].strum_time;
        let rating = self.window.classify(delta)?;
        self.hit(index, rating, delta, notes)
    }

    /// Hits every spawned, pending note of `side` whose strum time has arrived,
    /// however far back it lies.
    pub fn auto_hit(&mut self, side: Side, pos: f64, notes: &mut [Note]) -> Vec<JudgmentResult> {
        let head = &mut self.auto_head[side.index()];
        while *head < notes.len() && (notes[*head].side != side || !notes[*head].is_pending()) {
            *head += 1;
        }
        let start = *head;
        let end = notes.partition_point(|n| n.strum_time <= pos);

        let mut results = Vec::new();
        for index in start..end.max(start) {
            let note = &notes[index];
            if note.side != side || !note.spawned() || !note.is_pending() {
                continue;
            }
            if let Some(result) = self.hit(index, Rating::Sick, 0.0, notes) {
                results.push(result);
            }
        }
        results
    }

    fn hit(&mut self, index: usize, rating: Rating, delta: f64, notes: &mut [Note]) -> Option<JudgmentResult> {
        let note = &mut notes[index];
        if !note.mark_hit() {
            return None;
        }
        let is_hold = note.is_hold();
        let (side, lane) = (note.side, note.lane);
        if is_hold && note.begin_hold() {
            let slot = &mut self.active_holds[side.index()][lane.index()];
            if let Some(previous) = slot.replace(index) {
                // Overlapping sustains in one lane: the older one ends here.
                notes[previous].release_hold();
                debug!("hold {previous} on {side:?}/{} superseded by {index}", lane.name());
            }
        }
        Some(JudgmentResult {
            note_index: index,
            lane,
            side,
            rating,
            delta,
            is_hold,
        })
    }

    /// Marks unhit player notes that fell out of the widest window as late misses.
    pub fn check_misses(&mut self, pos: f64, notes: &mut [Note]) -> Vec<Miss> {
        let cutoff = pos - self.window.widest_ms();
        let mut misses = Vec::new();
        while self.miss_head < notes.len() && notes[self.miss_head].strum_time < cutoff {
            let index = self.miss_head;
            if notes[index].side == Side::Player {
                if let Some(miss) = self.miss_note(index, MissKind::Late, pos, notes) {
                    misses.push(miss);
                }
            }
            self.miss_head += 1;
        }
        misses
    }

    /// Ends every active hold whose sustain has run out.
    pub fn update_holds(&mut self, pos: f64, notes: &mut [Note]) -> Vec<HoldOutcome> {
        let mut finished = Vec::new();
        for side in [Side::Player, Side::Opponent] {
            for lane in Lane::ALL {
                let slot = &mut self.active_holds[side.index()][lane.index()];
                let Some(index) = *slot else { continue };
                let note = &mut notes[index];
                if pos < note.end_time() {
                    continue;
                }
                *slot = None;
                if note.finish_hold() {
                    finished.push(HoldOutcome {
                        note_index: index,
                        lane,
                        side,
                        end: HoldEnd::Completed,
                    });
                }
            }
        }
        finished
    }

    /// Handles a player key release in `lane`.
    ///
    /// Letting go earlier than `end_time - widest` forfeits the sustain.
    pub fn release_hold(&mut self, lane: Lane, pos: f64, notes: &mut [Note]) -> Option<ReleaseOutcome> {
        let index = self.active_holds[Side::Player.index()][lane.index()]?;
        let note = &notes[index];

        if note.hold_end_passed() {
            self.active_holds[Side::Player.index()][lane.index()] = None;
            return None;
        }
        if pos < note.end_time() - self.window.widest_ms() {
            return self
                .miss_note(index, MissKind::EarlyRelease, pos, notes)
                .map(ReleaseOutcome::Early);
        }

        self.active_holds[Side::Player.index()][lane.index()] = None;
        notes[index].release_hold().then_some(ReleaseOutcome::Clean(HoldOutcome {
            note_index: index,
            lane,
            side: Side::Player,
            end: HoldEnd::Released,
        }))
    }

    /// Resolves a note as missed. A second call for the same note is a no-op.
    pub fn miss_note(&mut self, index: usize, kind: MissKind, pos: f64, notes: &mut [Note]) -> Option<Miss> {
        let note = notes.get_mut(index)?;
        let changed = match kind {
            MissKind::Late => note.mark_too_late(),
            MissKind::EarlyRelease => note.drop_hold(),
        };
        if !changed {
            return None;
        }

        let (side, lane) = (note.side, note.lane);
        let delta = match kind {
            MissKind::Late => pos - note.strum_time,
            MissKind::EarlyRelease => pos - note.end_time(),
        };
        let slot = &mut self.active_holds[side.index()][lane.index()];
        if *slot == Some(index) {
            *slot = None;
        }
        Some(Miss {
            note_index: index,
            lane,
            side,
            kind,
            delta,
        })
    }

    /// Cleanly lets go of every active hold of `side`.
    pub fn release_all(&mut self, side: Side, notes: &mut [Note]) -> Vec<HoldOutcome> {
        let mut released = Vec::new();
        for lane in Lane::ALL {
            let Some(index) = self.active_holds[side.index()][lane.index()].take() else {
                continue;
            };
            if notes[index].release_hold() {
                released.push(HoldOutcome {
                    note_index: index,
                    lane,
                    side,
                    end: HoldEnd::Released,
                });
            }
        }
        released
    }

    pub fn reset(&mut self) {
        self.active_holds = [[None; LANE_COUNT]; 2];
        self.miss_head = 0;
        self.auto_head = [0; 2];
    }
}

/// Indices of notes with `from <= strum_time <= to`. Notes must be sorted.
fn time_range(notes: &[Note], from: f64, to: f64) -> std::ops::Range<usize> {
    let start = notes.partition_point(|n| n.strum_time < from);
    let end = notes.partition_point(|n| n.strum_time <= to);
    start..end.max(start)
}
