//! Effects produced by state transitions

use super::GameStatus;

/// Side effects for the controller to carry out after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Replace the transcript with a fresh one opening with `welcome`
    ResetSession { welcome: String },

    /// Ask the oracle to respond to the pending user text
    QueryOracle { user_text: String },

    /// Append the accepted user and AI turns to the transcript
    CommitExchange { user_text: String, reply: String },

    /// The game reached a terminal state
    GameOver {
        status: GameStatus,
        questions_asked: u32,
    },
}
