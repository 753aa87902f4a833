//! Game controller
//!
//! The rules live in the pure [`transition`] function. [`GameController`]
//! owns one game's session and state, feeds events through `transition` and
//! carries out the resulting effects (oracle calls, transcript commits).

mod answer;
mod classifier;
mod effect;
mod event;
mod state;
mod transition;

#[cfg(test)]
mod proptests;

pub use answer::Answer;
pub use classifier::{HeuristicClassifier, Outcome, OutcomeClassifier};
pub use effect::Effect;
pub use event::Event;
pub use state::{GameState, GameStatus, MAX_QUESTIONS};
pub use transition::{transition, TransitionError, TransitionResult};

use crate::llm::{LlmError, LlmService};
use crate::session::Session;
use crate::system_prompt::GUESSER_PROMPT;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default bound on a single oracle call
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Controller errors
#[derive(Debug, Error)]
pub enum GameError {
    /// The game is over, or the input was unusable; nothing was sent
    #[error(transparent)]
    InvalidState(#[from] TransitionError),
    /// The oracle call failed; state and transcript are unchanged
    #[error("Oracle error: {0}")]
    Oracle(#[from] LlmError),
}

/// One committed question/answer pair, numbered from 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub question_number: u32,
    pub user: String,
    pub ai: String,
}

/// What happened on a successful turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnResult {
    pub reply: String,
    pub answer: Answer,
    pub outcome: Outcome,
    pub state: GameState,
}

#[derive(Debug, Clone)]
pub struct GameOptions {
    pub temperature: Option<f32>,
    /// `None` waits for the oracle indefinitely
    pub oracle_timeout: Option<Duration>,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            temperature: None,
            oracle_timeout: Some(DEFAULT_ORACLE_TIMEOUT),
        }
    }
}

pub struct GameController {
    oracle: Arc<dyn LlmService>,
    classifier: Arc<dyn OutcomeClassifier>,
    options: GameOptions,
    session: Session,
    state: GameState,
    concept: Option<String>,
    exchanges: Vec<Exchange>,
}

impl GameController {
    /// Create a controller with a fresh game already started
    pub fn new(
        oracle: Arc<dyn LlmService>,
        classifier: Arc<dyn OutcomeClassifier>,
        options: GameOptions,
    ) -> Self {
        let session = Session::new(GUESSER_PROMPT).with_temperature(options.temperature);
        let mut controller = Self {
            oracle,
            classifier,
            options,
            session,
            state: GameState::new(),
            concept: None,
            exchanges: Vec::new(),
        };
        controller.start(None);
        controller
    }

    /// Discard the current game and begin a new one
    pub fn start(&mut self, concept_hint: Option<String>) -> &GameState {
        self.concept = concept_hint
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        // Start is accepted from every state
        if let Ok(result) = transition(&self.state, Event::Start) {
            self.state = result.new_state;
            for effect in result.effects {
                if let Effect::ResetSession { welcome } = effect {
                    self.reset_session(welcome);
                }
            }
        }

        tracing::debug!(concept = ?self.concept, "Game started");
        &self.state
    }

    /// Send the human's reply to the oracle and advance the game.
    ///
    /// Fails without calling the oracle when the game is over. If the oracle
    /// call fails nothing is changed, so the same turn can be retried.
    pub async fn submit_answer(&mut self, text: &str) -> Result<TurnResult, GameError> {
        let answer = Answer::parse(text);
        let mut pending = VecDeque::from([Event::UserAnswer {
            text: text.to_string(),
        }]);
        let mut turn = None;

        while let Some(event) = pending.pop_front() {
            let result = transition(&self.state, event)?;
            let new_state = result.new_state;

            // The oracle call is the only fallible effect and runs before any
            // mutation, so an error leaves the game as it was
            for effect in result.effects {
                match effect {
                    Effect::QueryOracle { user_text } => {
                        let reply = self.query_oracle(&user_text).await?;
                        let outcome = self.classify_outcome(&reply);
                        tracing::debug!(?outcome, reply = %reply, "Oracle replied");
                        turn = Some((reply.clone(), outcome));
                        pending.push_back(Event::OracleReply {
                            user_text,
                            reply,
                            outcome,
                        });
                    }
                    Effect::CommitExchange { user_text, reply } => {
                        self.commit_exchange(user_text, reply);
                    }
                    Effect::GameOver {
                        status,
                        questions_asked,
                    } => {
                        tracing::info!(
                            %status,
                            questions_asked,
                            concept = ?self.concept,
                            "Game over"
                        );
                    }
                    Effect::ResetSession { welcome } => self.reset_session(welcome),
                }
            }
            self.state = new_state;
        }

        let (reply, outcome) =
            turn.ok_or_else(|| LlmError::unknown("Turn finished without an oracle reply"))?;
        Ok(TurnResult {
            reply,
            answer,
            outcome,
            state: self.state.clone(),
        })
    }

    /// Label an oracle reply with the configured classifier
    pub fn classify_outcome(&self, oracle_text: &str) -> Outcome {
        self.classifier.classify(oracle_text, self.concept.as_deref())
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn concept(&self) -> Option<&str> {
        self.concept.as_deref()
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn temperature(&self) -> Option<f32> {
        self.options.temperature
    }

    pub fn model_id(&self) -> &str {
        self.oracle.model_id()
    }

    async fn query_oracle(&self, user_text: &str) -> Result<String, LlmError> {
        let call = self.session.query_oracle(self.oracle.as_ref(), user_text);
        match self.options.oracle_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| LlmError::timeout(limit))?,
            None => call.await,
        }
    }

    fn reset_session(&mut self, welcome: String) {
        let mut session = Session::new(GUESSER_PROMPT).with_temperature(self.options.temperature);
        session.append_ai_turn(welcome);
        self.session = session;
        self.exchanges.clear();
    }

    fn commit_exchange(&mut self, user_text: String, reply: String) {
        self.session.append_user_turn(user_text.clone());
        self.session.append_ai_turn(reply.clone());
        self.exchanges.push(Exchange {
            question_number: u32::try_from(self.exchanges.len() + 1).unwrap_or(u32::MAX),
            user: user_text,
            ai: reply,
        });
    }
}
