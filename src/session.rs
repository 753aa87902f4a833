//! Conversation session
//!
//! Holds the append-only transcript of one game and renders it, together with
//! the fixed system prompt, into an oracle request.

use crate::llm::{LlmError, LlmMessage, LlmRequest, LlmService, SystemContent};
use serde::{Deserialize, Serialize};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Ai,
}

/// One utterance in the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

/// Transcript of a single game. Turns are only ever appended.
#[derive(Debug, Clone)]
pub struct Session {
    system_prompt: String,
    temperature: Option<f32>,
    turns: Vec<Turn>,
}

impl Session {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            temperature: None,
            turns: Vec::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn append_user_turn(&mut self, text: impl Into<String>) {
        self.turns.push(Turn {
            speaker: Speaker::User,
            text: text.into(),
        });
    }

    pub fn append_ai_turn(&mut self, text: impl Into<String>) {
        self.turns.push(Turn {
            speaker: Speaker::Ai,
            text: text.into(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Most recent AI utterance, i.e. the question currently awaiting an answer
    pub fn latest_ai_turn(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.speaker == Speaker::Ai)
            .map(|t| t.text.as_str())
    }

    /// System prompt followed by the transcript in order
    pub fn render_context(&self) -> LlmRequest {
        LlmRequest {
            system: vec![SystemContent::new(self.system_prompt.clone())],
            messages: self
                .turns
                .iter()
                .map(|turn| match turn.speaker {
                    Speaker::User => LlmMessage::user(turn.text.clone()),
                    Speaker::Ai => LlmMessage::assistant(turn.text.clone()),
                })
                .collect(),
            max_tokens: None,
            temperature: self.temperature,
        }
    }

    /// Ask the oracle to respond to `pending_user_text`.
    ///
    /// The pending turn is rendered after the transcript but not committed;
    /// the caller appends both turns once the exchange has been accepted, so a
    /// failed call leaves the transcript as it was.
    pub async fn query_oracle(
        &self,
        oracle: &dyn LlmService,
        pending_user_text: &str,
    ) -> Result<String, LlmError> {
        let mut request = self.render_context();
        request.messages.push(LlmMessage::user(pending_user_text));

        let response = oracle.complete(&request).await?;
        Ok(response.text.trim().to_string())
    }
}
