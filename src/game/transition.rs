//! Pure state transition function

use super::{Effect, Event, GameState, GameStatus, Outcome, MAX_QUESTIONS};
use crate::system_prompt::WELCOME_MESSAGE;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: GameState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: GameState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Game is over ({0}), start a new game to keep playing")]
    InvalidState(GameStatus),
    #[error("Answer must not be empty")]
    EmptyAnswer,
}

/// Pure transition function: the same state and event always yield the same
/// result, and nothing here performs I/O.
pub fn transition(state: &GameState, event: Event) -> Result<TransitionResult, TransitionError> {
    match event {
        Event::Start => Ok(TransitionResult::new(GameState::new()).with_effect(
            Effect::ResetSession {
                welcome: WELCOME_MESSAGE.to_string(),
            },
        )),

        Event::UserAnswer { .. } | Event::OracleReply { .. } if state.is_terminal() => {
            Err(TransitionError::InvalidState(state.status))
        }

        Event::UserAnswer { text } => {
            let text = text.trim();
            if text.is_empty() {
                return Err(TransitionError::EmptyAnswer);
            }
            // Nothing changes until the oracle has answered
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::QueryOracle {
                user_text: text.to_string(),
            }))
        }

        Event::OracleReply {
            user_text,
            reply,
            outcome,
        } => {
            let questions_asked = if outcome.consumes_question() {
                (state.questions_asked + 1).min(MAX_QUESTIONS)
            } else {
                state.questions_asked
            };

            let status = if outcome.is_win() {
                GameStatus::Success
            } else if outcome == Outcome::Conceded || questions_asked >= MAX_QUESTIONS {
                GameStatus::Failure
            } else {
                GameStatus::InProgress
            };

            let new_state = GameState {
                questions_asked,
                status,
                last_ai_message: reply.clone(),
            };

            let mut result = TransitionResult::new(new_state)
                .with_effect(Effect::CommitExchange { user_text, reply });
            if status.is_terminal() {
                result = result.with_effect(Effect::GameOver {
                    status,
                    questions_asked,
                });
            }
            Ok(result)
        }
    }
}
