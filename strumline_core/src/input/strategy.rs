use serde::{Deserialize, Serialize};

/// Where player judgments come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputStrategy {
    /// Judge the events the host pushes.
    #[default]
    RealInput,
    /// Hit every player note on time; lane events from the host are ignored.
    BotInput,
}

impl InputStrategy {
    pub fn reads_lanes(self) -> bool {
        matches!(self, InputStrategy::RealInput)
    }

    pub fn is_bot(self) -> bool {
        matches!(self, InputStrategy::BotInput)
    }

    pub fn toggled(self) -> Self {
        match self {
            InputStrategy::RealInput => InputStrategy::BotInput,
            InputStrategy::BotInput => InputStrategy::RealInput,
        }
    }
}
