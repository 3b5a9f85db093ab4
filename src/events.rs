//! Events the host dispatches and the screens it gets back.

use serde::{Deserialize, Serialize};

use crate::drill::keypad::KeypadKey;
use crate::drill::runtime::{Judgement, SessionOutcome};
use crate::drill::types::OperandPair;

/// Inputs the host forwards to [`AppState::dispatch`](crate::state::AppState::dispatch).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DrillEvent {
    /// Play the current level.
    StartPractice,
    LevelSelected(String),
    AnswerSubmitted(String),
    Keypad(KeypadKey),
    CellTapped(u32),
    ContinueToNextLevel,
    ReturnHome,
    ProfileRenamed(String),
    AvatarShuffled,
}

/// What the host should be showing after an event or tick.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    Home,
    Question {
        level_id: String,
        pair: OperandPair,
        number: usize,
        total: usize,
    },
    Feedback {
        level_id: String,
        judgement: Judgement,
    },
    Grid {
        level_id: String,
        target: Option<u32>,
        found: usize,
        total: usize,
    },
    LevelComplete {
        outcome: SessionOutcome,
        next_level: Option<String>,
    },
}

impl Screen {
    pub fn is_home(&self) -> bool {
        matches!(self, Screen::Home)
    }

    pub fn level_id(&self) -> Option<&str> {
        match self {
            Screen::Home => None,
            Screen::Question { level_id, .. }
            | Screen::Feedback { level_id, .. }
            | Screen::Grid { level_id, .. } => Some(level_id),
            Screen::LevelComplete { outcome, .. } => Some(&outcome.level_id),
        }
    }
}
