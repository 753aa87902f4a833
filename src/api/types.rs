//! API request and response types

use crate::game::{Answer, GameController, GameState, Outcome};
use crate::session::Turn;
use serde::{Deserialize, Serialize};

/// Request to start a game
#[derive(Debug, Default, Deserialize)]
pub struct CreateGameRequest {
    /// Optional hidden answer; lets the server recognise a correct guess
    #[serde(default)]
    pub concept: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

/// Request to restart a game
#[derive(Debug, Default, Deserialize)]
pub struct RestartRequest {
    #[serde(default)]
    pub concept: Option<String>,
}

/// The human's reply to the latest question
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub satisfied: bool,
    #[serde(default)]
    pub comment: Option<String>,
}

/// A game with its full transcript
#[derive(Debug, Serialize)]
pub struct GameResponse {
    pub id: String,
    pub state: GameState,
    pub questions_remaining: u32,
    pub transcript: Vec<Turn>,
}

impl GameResponse {
    pub fn new(id: impl Into<String>, game: &GameController) -> Self {
        Self {
            id: id.into(),
            state: game.state().clone(),
            questions_remaining: game.state().questions_remaining(),
            transcript: game.session().turns().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub reply: String,
    pub answer: Answer,
    pub outcome: Outcome,
    pub state: GameState,
    pub questions_remaining: u32,
    /// Set when the game just ended by running out of questions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub recorded: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
