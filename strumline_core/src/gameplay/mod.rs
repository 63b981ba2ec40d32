pub mod hit_window;
pub mod judge;
pub mod playback;
pub mod rating;
pub mod scheduler;
