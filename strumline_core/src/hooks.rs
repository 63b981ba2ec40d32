use log::warn;
use strumline_chart::{Lane, ScriptEvent, Side};

use crate::gameplay::hit_window::Rating;

/// Everything scripts can react to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hook<'a> {
    BeatHit(i64),
    StepHit(i64),
    NoteHit {
        side: Side,
        lane: Lane,
        rating: Rating,
        delta: f64,
    },
    /// `note_index` is `None` for a ghost tap.
    NoteMiss {
        side: Side,
        lane: Lane,
        note_index: Option<usize>,
    },
    ScriptEvent(&'a ScriptEvent),
    SongEnd,
    Destroy,
}

impl Hook<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Hook::BeatHit(_) => "beatHit",
            Hook::StepHit(_) => "stepHit",
            Hook::NoteHit { .. } => "noteHit",
            Hook::NoteMiss { .. } => "noteMiss",
            Hook::ScriptEvent(_) => "scriptEvent",
            Hook::SongEnd => "songEnd",
            Hook::Destroy => "destroy",
        }
    }
}

pub trait HookListener: Send {
    fn name(&self) -> &str;

    fn on_hook(&mut self, hook: &Hook<'_>) -> anyhow::Result<()>;
}

/// Fans hooks out to listeners. A failing listener is logged and skipped.
#[derive(Default)]
pub struct HookBus {
    listeners: Vec<Box<dyn HookListener>>,
    failures: u64,
}

impl HookBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: impl HookListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn dispatch(&mut self, hook: &Hook<'_>) {
        for listener in &mut self.listeners {
            if let Err(err) = listener.on_hook(hook) {
                self.failures += 1;
                warn!("hook listener {} failed on {}: {err:#}", listener.name(), hook.name());
            }
        }
    }

    pub fn failure_count(&self) -> u64 {
        self.failures
    }
}
