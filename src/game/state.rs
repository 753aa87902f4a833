//! Game state types

use crate::system_prompt::WELCOME_MESSAGE;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Question budget of a game
pub const MAX_QUESTIONS: u32 = 20;

/// Lifecycle of a game. `Success` and `Failure` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GameStatus {
    #[default]
    InProgress,
    Success,
    Failure,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::InProgress => "InProgress",
            GameStatus::Success => "Success",
            GameStatus::Failure => "Failure",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable state of one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Always in `0..=MAX_QUESTIONS`; never decreases within a game
    pub questions_asked: u32,
    pub status: GameStatus,
    pub last_ai_message: String,
}

impl GameState {
    /// Fresh game: no questions asked, welcome message shown
    pub fn new() -> Self {
        Self {
            questions_asked: 0,
            status: GameStatus::InProgress,
            last_ai_message: WELCOME_MESSAGE.to_string(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn questions_remaining(&self) -> u32 {
        MAX_QUESTIONS.saturating_sub(self.questions_asked)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
