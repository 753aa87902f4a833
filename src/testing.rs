//! Mock implementations for testing
//!
//! These mocks let the controller, driver and API be exercised without a
//! real oracle.

use crate::bulk::HumanPlayer;
use crate::game::Answer;
use crate::game_log::{GameLog, GameLogError, GameLogRecord};
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

// ============================================================================
// Mock oracle
// ============================================================================

/// Oracle that returns queued responses in order
pub struct MockLlmService {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmService {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a plain text reply
    pub fn queue_text(&self, text: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(LlmResponse::text(text)));
    }

    /// Queue several replies at once
    pub fn queue_texts<I, S>(&self, texts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for text in texts {
            self.queue_text(text);
        }
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Scripted human
// ============================================================================

/// Simulated human that answers every question with a fixed answer,
/// except for questions mentioning one of the configured keywords.
pub struct ScriptedHuman {
    default: Answer,
    overrides: HashMap<String, Answer>,
    pub questions: Mutex<Vec<String>>,
}

impl ScriptedHuman {
    pub fn always(answer: Answer) -> Self {
        Self {
            default: answer,
            overrides: HashMap::new(),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn with_override(mut self, keyword: impl Into<String>, answer: Answer) -> Self {
        self.overrides.insert(keyword.into().to_lowercase(), answer);
        self
    }
}

#[async_trait]
impl HumanPlayer for ScriptedHuman {
    async fn answer(&self, _concept: &str, question: &str) -> Result<Answer, LlmError> {
        self.questions.lock().unwrap().push(question.to_string());
        let lowered = question.to_lowercase();
        Ok(self
            .overrides
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword.as_str()))
            .map_or_else(|| self.default.clone(), |(_, answer)| answer.clone()))
    }
}

// ============================================================================
// In-memory game log
// ============================================================================

#[derive(Default)]
pub struct MemoryGameLog {
    pub records: Mutex<Vec<GameLogRecord>>,
}

impl MemoryGameLog {
    pub fn records(&self) -> Vec<GameLogRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl GameLog for MemoryGameLog {
    async fn append(&self, record: &GameLogRecord) -> Result<(), GameLogError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
