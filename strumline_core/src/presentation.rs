use std::collections::HashMap;

use glam::Vec2;
use strumline_chart::{Lane, Side};

use crate::gameplay::hit_window::Rating;
use crate::gameplay::rating::RatingSnapshot;
use crate::hooks::HookBus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualKind {
    Note { lane: Lane, side: Side },
    HoldPiece { lane: Lane, side: Side },
    HoldEnd { lane: Lane, side: Side },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualState {
    /// 0xRRGGBB; `None` keeps the sprite's own colors.
    pub tint: Option<u32>,
    pub alpha: f32,
    pub frame: Option<u32>,
}

impl VisualState {
    pub const NORMAL: VisualState = VisualState { tint: None, alpha: 1.0, frame: None };
    pub const MISSED: VisualState = VisualState { tint: Some(0x808080), alpha: 0.6, frame: None };
}

impl Default for VisualState {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Creates and moves whatever draws notes. Positions are in strumline space.
pub trait VisualEntityFactory: Send {
    fn create(&mut self, kind: VisualKind, position: Vec2) -> VisualHandle;
    fn set_position(&mut self, handle: VisualHandle, position: Vec2);
    fn destroy(&mut self, handle: VisualHandle);
    fn set_visual_state(&mut self, handle: VisualHandle, state: VisualState);
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessEntity {
    pub kind: VisualKind,
    pub position: Vec2,
    pub state: VisualState,
}

/// Factory that only keeps books. Used by the CLI host and tests.
#[derive(Debug, Default)]
pub struct HeadlessFactory {
    next_id: u64,
    live: HashMap<VisualHandle, HeadlessEntity>,
    created: u64,
    destroyed: u64,
}

impl HeadlessFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn created_count(&self) -> u64 {
        self.created
    }

    pub fn destroyed_count(&self) -> u64 {
        self.destroyed
    }

    pub fn get(&self, handle: VisualHandle) -> Option<&HeadlessEntity> {
        self.live.get(&handle)
    }

    pub fn entities(&self) -> impl Iterator<Item = (&VisualHandle, &HeadlessEntity)> {
        self.live.iter()
    }
}

impl VisualEntityFactory for HeadlessFactory {
    fn create(&mut self, kind: VisualKind, position: Vec2) -> VisualHandle {
        let handle = VisualHandle(self.next_id);
        self.next_id += 1;
        self.created += 1;
        self.live.insert(
            handle,
            HeadlessEntity {
                kind,
                position,
                state: VisualState::NORMAL,
            },
        );
        handle
    }

    fn set_position(&mut self, handle: VisualHandle, position: Vec2) {
        if let Some(entity) = self.live.get_mut(&handle) {
            entity.position = position;
        }
    }

    fn destroy(&mut self, handle: VisualHandle) {
        if self.live.remove(&handle).is_some() {
            self.destroyed += 1;
        }
    }

    fn set_visual_state(&mut self, handle: VisualHandle, state: VisualState) {
        if let Some(entity) = self.live.get_mut(&handle) {
            entity.state = state;
        }
    }
}

/// Judgment popups, score text and the health bar.
pub trait PresentationSink: Send {
    /// `None` is a miss.
    fn popup(&mut self, _rating: Option<Rating>) {}
    fn score_changed(&mut self, _snapshot: &RatingSnapshot) {}
    fn health_changed(&mut self, _value: f64, _max: f64) {}
}

pub struct NullPresentation;

impl PresentationSink for NullPresentation {}

/// Collaborators handed to one playback. Nothing here is global, so several
/// engines can run side by side.
pub struct EngineContext<F: VisualEntityFactory> {
    pub factory: F,
    pub presentation: Box<dyn PresentationSink>,
    pub hooks: HookBus,
}

impl<F: VisualEntityFactory> EngineContext<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            presentation: Box::new(NullPresentation),
            hooks: HookBus::new(),
        }
    }

    pub fn with_presentation(mut self, presentation: impl PresentationSink + 'static) -> Self {
        self.presentation = Box::new(presentation);
        self
    }

    pub fn with_hooks(mut self, hooks: HookBus) -> Self {
        self.hooks = hooks;
        self
    }
}
