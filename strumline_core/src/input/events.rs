use strumline_chart::Lane;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Left,
    Down,
    Up,
    Right,
    Pause,
    Reset,
    ToggleBot,
}

impl Button {
    pub fn lane(self) -> Option<Lane> {
        match self {
            Button::Left => Some(Lane::Left),
            Button::Down => Some(Lane::Down),
            Button::Up => Some(Lane::Up),
            Button::Right => Some(Lane::Right),
            _ => None,
        }
    }

    pub fn from_lane(lane: Lane) -> Self {
        match lane {
            Lane::Left => Button::Left,
            Lane::Down => Button::Down,
            Lane::Up => Button::Up,
            Lane::Right => Button::Right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputEvent {
    /// Song position (ms) when the event occurred
    pub timestamp: f64,
    pub button: Button,
    pub pressed: bool,
}

impl InputEvent {
    pub fn down(button: Button, timestamp: f64) -> Self {
        Self { timestamp, button, pressed: true }
    }

    pub fn up(button: Button, timestamp: f64) -> Self {
        Self { timestamp, button, pressed: false }
    }
}
