pub mod clock;
pub mod conductor;
