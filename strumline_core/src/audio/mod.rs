use std::sync::Arc;

use parking_lot::Mutex;

pub type CompletionCallback = Box<dyn FnOnce() + Send>;

/// The playing song, as seen by the engine. Polled once per tick.
pub trait AudioTransport: Send {
    /// Current song position in ms.
    fn position_ms(&mut self) -> f64;

    fn is_playing(&self) -> bool;

    /// Registers a callback fired once when the song reaches its end.
    /// Registering after completion fires immediately.
    fn on_complete(&mut self, callback: CompletionCallback);
}

#[derive(Default)]
struct ManualState {
    position_ms: f64,
    playing: bool,
    completed: bool,
    callbacks: Vec<CompletionCallback>,
}

/// A transport moved by hand. Clones share state, so a host or test keeps
/// one handle while the engine owns another.
#[derive(Clone, Default)]
pub struct ManualTransport {
    inner: Arc<Mutex<ManualState>>,
}

impl ManualTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position(&self, position_ms: f64) {
        self.inner.lock().position_ms = position_ms;
    }

    pub fn advance(&self, delta_ms: f64) -> f64 {
        let mut state = self.inner.lock();
        state.position_ms += delta_ms;
        state.position_ms
    }

    pub fn position(&self) -> f64 {
        self.inner.lock().position_ms
    }

    pub fn play(&self) {
        self.inner.lock().playing = true;
    }

    pub fn pause(&self) {
        self.inner.lock().playing = false;
    }

    pub fn is_completed(&self) -> bool {
        self.inner.lock().completed
    }

    /// Ends the song and fires completion callbacks. Later calls do nothing.
    pub fn finish(&self) {
        let callbacks = {
            let mut state = self.inner.lock();
            if state.completed {
                return;
            }
            state.completed = true;
            state.playing = false;
            std::mem::take(&mut state.callbacks)
        };
        for callback in callbacks {
            callback();
        }
    }
}

impl AudioTransport for ManualTransport {
    fn position_ms(&mut self) -> f64 {
        self.inner.lock().position_ms
    }

    fn is_playing(&self) -> bool {
        self.inner.lock().playing
    }

    fn on_complete(&mut self, callback: CompletionCallback) {
        let mut state = self.inner.lock();
        if state.completed {
            drop(state);
            callback();
        } else {
            state.callbacks.push(callback);
        }
    }
}
