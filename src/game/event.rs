//! Events that drive a game

use super::Outcome;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Begin a new game, discarding any previous one
    Start,
    /// The human typed something
    UserAnswer { text: String },
    /// The oracle replied to `user_text`
    OracleReply {
        user_text: String,
        reply: String,
        outcome: Outcome,
    },
}
