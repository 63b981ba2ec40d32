pub mod audio;
pub mod config;
pub mod gameplay;
pub mod hooks;
pub mod input;
pub mod presentation;
pub mod time;

pub use config::{ConfigError, EngineConfig};
pub use gameplay::playback::{Phase, Playback, PlaybackEvent, SharedPlayback};
pub use strumline_chart as chart;
