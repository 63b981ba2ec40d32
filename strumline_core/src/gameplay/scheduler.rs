use std::collections::{BTreeMap, VecDeque};

use glam::Vec2;
use log::debug;
use serde::{Deserialize, Serialize};
use strumline_chart::{Lane, Note, Side, LANE_COUNT};

use crate::presentation::{VisualEntityFactory, VisualHandle, VisualKind, VisualState};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Pixels per ms at chart speed 1 and the reference bpm.
    pub scroll_multiplier: f64,
    pub reference_bpm: f64,
    /// How far ahead (ms, at speed 1) notes get their visuals.
    pub base_lead_ms: f64,
    /// Notes this far behind the strum line are never spawned, and their
    /// visuals are released once resolved.
    pub late_purge_ms: f64,
    pub hold_segment_px: f64,
    /// Upper bound on pieces per sustain; longer holds get wider spacing.
    pub max_hold_segments: u32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            scroll_multiplier: 0.45,
            reference_bpm: 100.0,
            base_lead_ms: 2000.0,
            late_purge_ms: 1500.0,
            hold_segment_px: 32.0,
            max_hold_segments: 256,
        }
    }
}

/// Strum target positions per side and lane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrumLayout {
    pub player: [[f32; 2]; LANE_COUNT],
    pub opponent: [[f32; 2]; LANE_COUNT],
}

impl StrumLayout {
    pub fn target(&self, side: Side, lane: Lane) -> Vec2 {
        let [x, y] = match side {
            Side::Player => self.player[lane.index()],
            Side::Opponent => self.opponent[lane.index()],
        };
        Vec2::new(x, y)
    }
}

impl Default for StrumLayout {
    fn default() -> Self {
        let row = |left: f32| [0, 1, 2, 3].map(|i| [left + i as f32 * 112.0, 50.0]);
        Self {
            player: row(732.0),
            opponent: row(100.0),
        }
    }
}

#[derive(Debug, Default)]
struct NoteVisual {
    head: Option<VisualHandle>,
    /// Sustain pieces top to bottom; the last is the hold-end cap.
    segments: VecDeque<VisualHandle>,
    segment_count: u32,
}

impl NoteVisual {
    fn handles(&self) -> impl Iterator<Item = VisualHandle> + '_ {
        self.head.iter().copied().chain(self.segments.iter().copied())
    }
}

/// Decides which notes have visuals and where they are.
pub struct NoteScheduler {
    config: ScrollConfig,
    layout: StrumLayout,
    bpm: f64,
    speed: f64,
    visuals: BTreeMap<usize, NoteVisual>,
    torn_down: bool,
}

impl NoteScheduler {
    pub fn new(config: ScrollConfig, layout: StrumLayout, bpm: f64, speed: f64) -> Self {
        Self {
            config,
            layout,
            bpm,
            speed,
            visuals: BTreeMap::new(),
            torn_down: false,
        }
    }

    /// Pixels per ms.
    pub fn scroll_speed(&self) -> f64 {
        self.config.scroll_multiplier * self.speed * (self.bpm / self.config.reference_bpm)
    }

    pub fn spawn_lead_ms(&self) -> f64 {
        self.config.base_lead_ms / self.speed
    }

    pub fn set_bpm(&mut self, bpm: f64) {
        if bpm.is_finite() && bpm > 0.0 {
            self.bpm = bpm;
        }
    }

    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() && speed > 0.0 {
            self.speed = speed;
        }
    }

    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    /// Distance in px from the strum line; positive while the note is still coming.
    pub fn offset_for(&self, strum_time: f64, pos: f64) -> f64 {
        (strum_time - pos) * self.scroll_speed()
    }

    pub fn active_count(&self) -> usize {
        self.visuals.len()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn has_visuals(&self, index: usize) -> bool {
        self.visuals.contains_key(&index)
    }

    pub fn head_handle(&self, index: usize) -> Option<VisualHandle> {
        self.visuals.get(&index).and_then(|v| v.head)
    }

    pub fn segment_handles(&self, index: usize) -> Vec<VisualHandle> {
        self.visuals
            .get(&index)
            .map(|v| v.segments.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Gives visuals to every unspawned note inside the spawn window.
    /// Returns the indices spawned this call.
    pub fn spawn_notes_in_range(
        &mut self,
        pos: f64,
        notes: &mut [Note],
        factory: &mut dyn VisualEntityFactory,
    ) -> Vec<usize> {
        if self.torn_down {
            return Vec::new();
        }
        let earliest = pos - self.config.late_purge_ms;
        let latest = pos + self.spawn_lead_ms();
        let start = notes.partition_point(|n| n.strum_time < earliest);

        let mut spawned = Vec::new();
        for index in start..notes.len() {
            if notes[index].strum_time > latest {
                break;
            }
            if !notes[index].mark_spawned() {
                continue;
            }
            let visual = self.create_visual(&notes[index], pos, factory);
            self.visuals.insert(index, visual);
            spawned.push(index);
        }
        if !spawned.is_empty() {
            debug!("spawned {} note(s) at {pos:.1}ms, {} active", spawned.len(), self.visuals.len());
        }
        spawned
    }

    fn create_visual(&self, note: &Note, pos: f64, factory: &mut dyn VisualEntityFactory) -> NoteVisual {
        let (lane, side) = (note.lane, note.side);
        let head_pos = self.head_position(note, pos);
        let mut visual = NoteVisual {
            head: Some(factory.create(VisualKind::Note { lane, side }, head_pos)),
            ..NoteVisual::default()
        };

        if note.is_hold() {
            let length_px = note.sustain_length * self.scroll_speed();
            let count = self.hold_segment_count(length_px);
            let spacing = (length_px / f64::from(count)) as f32;
            for i in 0..count {
                let kind = if i + 1 == count {
                    VisualKind::HoldEnd { lane, side }
                } else {
                    VisualKind::HoldPiece { lane, side }
                };
                let at = head_pos + Vec2::new(0.0, spacing * i as f32);
                visual.segments.push_back(factory.create(kind, at));
            }
            visual.segment_count = count;
        }
        visual
    }

    fn hold_segment_count(&self, length_px: f64) -> u32 {
        let max = self.config.max_hold_segments.max(1);
        let wanted = (length_px / self.config.hold_segment_px).ceil();
        if wanted.is_nan() {
            return 1;
        }
        wanted.clamp(1.0, f64::from(max)) as u32
    }

    fn head_position(&self, note: &Note, pos: f64) -> Vec2 {
        let target = self.layout.target(note.side, note.lane);
        target + Vec2::new(0.0, self.offset_for(note.strum_time, pos) as f32)
    }

    fn segment_spacing(&self, note: &Note, segment_count: u32) -> f64 {
        note.sustain_length * self.scroll_speed() / f64::from(segment_count.max(1))
    }

    /// Moves every live visual to its offset for `pos`.
    pub fn update_note_positions(&mut self, pos: f64, notes: &[Note], factory: &mut dyn VisualEntityFactory) {
        for (&index, visual) in &self.visuals {
            let note = &notes[index];
            let head_pos = self.head_position(note, pos);
            if let Some(head) = visual.head {
                factory.set_position(head, head_pos);
            }
            let spacing = self.segment_spacing(note, visual.segment_count) as f32;
            let first = note.hold_segments_destroyed();
            for (i, &segment) in visual.segments.iter().enumerate() {
                let slot = first + i as u32;
                factory.set_position(segment, head_pos + Vec2::new(0.0, spacing * slot as f32));
            }
        }
    }

    /// Eats, in order, the held sustain pieces whose top crossed the strum line.
    /// Returns how many pieces were destroyed.
    pub fn update_active_holds(
        &mut self,
        pos: f64,
        notes: &mut [Note],
        factory: &mut dyn VisualEntityFactory,
    ) -> usize {
        let scroll = self.scroll_speed();
        let mut eaten = 0;
        for (&index, visual) in self.visuals.iter_mut() {
            let note = &mut notes[index];
            if !note.is_being_held() {
                continue;
            }
            let head_offset = (note.strum_time - pos) * scroll;
            let spacing = note.sustain_length * scroll / f64::from(visual.segment_count.max(1));
            while let Some(&segment) = visual.segments.front() {
                let top = head_offset + spacing * f64::from(note.hold_segments_destroyed());
                if top > 0.0 {
                    break;
                }
                factory.destroy(segment);
                visual.segments.pop_front();
                note.eat_hold_segment();
                eaten += 1;
            }
        }
        eaten
    }

    /// Releases the visuals of notes that ended more than `late_purge_ms` ago.
    pub fn purge_passed(&mut self, pos: f64, notes: &[Note], factory: &mut dyn VisualEntityFactory) -> usize {
        let cutoff = pos - self.config.late_purge_ms;
        let stale: Vec<usize> = self
            .visuals
            .keys()
            .copied()
            .filter(|&index| notes[index].end_time() < cutoff && !notes[index].is_being_held())
            .collect();
        for &index in &stale {
            self.release(index, factory);
        }
        stale.len()
    }

    /// Destroys all visuals of a note now.
    pub fn release(&mut self, index: usize, factory: &mut dyn VisualEntityFactory) -> bool {
        let Some(visual) = self.visuals.remove(&index) else {
            return false;
        };
        for handle in visual.handles() {
            factory.destroy(handle);
        }
        true
    }

    /// Removes the note head but keeps the sustain trail, for a hit hold.
    pub fn hide_head(&mut self, index: usize, factory: &mut dyn VisualEntityFactory) {
        if let Some(head) = self.visuals.get_mut(&index).and_then(|v| v.head.take()) {
            factory.destroy(head);
        }
    }

    pub fn dim(&mut self, index: usize, factory: &mut dyn VisualEntityFactory) {
        if let Some(visual) = self.visuals.get(&index) {
            for handle in visual.handles() {
                factory.set_visual_state(handle, VisualState::MISSED);
            }
        }
    }

    /// Destroys every visual and stops spawning. Repeated calls do nothing.
    pub fn teardown(&mut self, factory: &mut dyn VisualEntityFactory) -> usize {
        if self.torn_down {
            return 0;
        }
        self.torn_down = true;
        let visuals = std::mem::take(&mut self.visuals);
        let mut destroyed = 0;
        for visual in visuals.values() {
            for handle in visual.handles() {
                factory.destroy(handle);
                destroyed += 1;
            }
        }
        debug!("scheduler teardown released {destroyed} visual(s)");
        destroyed
    }
}
