use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use atomic_float::AtomicF64;

use crate::audio::{AudioTransport, CompletionCallback};

/// Song position published by the audio thread, in ms.
pub type AudioPosition = Arc<AtomicF64>;

/// Smooths a coarse audio position.
///
/// The audio thread only advances its position once per output buffer; between
/// samples the clock extrapolates with wall time.
pub struct AudioClock {
    audio_time_source: AudioPosition,
    last_audio_time: f64,
    last_update_time: f64,
}

impl AudioClock {
    pub fn new(audio_time_source: AudioPosition) -> Self {
        Self {
            audio_time_source,
            last_audio_time: 0.0,
            last_update_time: 0.0,
        }
    }

    pub fn update(&mut self, current_system_time_ms: f64) {
        self.last_audio_time = self.audio_time_source.load(Ordering::Acquire);
        self.last_update_time = current_system_time_ms;
    }

    pub fn time_at(&self, current_system_time_ms: f64) -> f64 {
        let elapsed = current_system_time_ms - self.last_update_time;
        self.last_audio_time + elapsed
    }

    /// True when the audio thread published a position the clock hasn't seen.
    pub fn is_stale(&self) -> bool {
        self.audio_time_source.load(Ordering::Acquire) != self.last_audio_time
    }
}

/// [`AudioTransport`] over an [`AudioClock`] and the host's monotonic clock.
pub struct ClockTransport {
    clock: AudioClock,
    origin: Instant,
    duration_ms: Option<f64>,
    playing: bool,
    completed: bool,
    on_complete: Vec<CompletionCallback>,
}

impl ClockTransport {
    pub fn new(audio_time_source: AudioPosition, duration_ms: Option<f64>) -> Self {
        Self {
            clock: AudioClock::new(audio_time_source),
            origin: Instant::now(),
            duration_ms,
            playing: true,
            completed: false,
            on_complete: Vec::new(),
        }
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    fn complete(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        self.playing = false;
        for callback in self.on_complete.drain(..) {
            callback();
        }
    }
}

impl AudioTransport for ClockTransport {
    fn position_ms(&mut self) -> f64 {
        let now = self.now_ms();
        // A paused transport re-samples every call, so it never extrapolates.
        if self.clock.is_stale() || !self.playing {
            self.clock.update(now);
        }
        let position = self.clock.time_at(now);

        if let Some(duration) = self.duration_ms {
            if position >= duration {
                self.complete();
            }
        }
        position
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn on_complete(&mut self, callback: CompletionCallback) {
        if self.completed {
            callback();
        } else {
            self.on_complete.push(callback);
        }
    }
}
