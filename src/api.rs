//! HTTP API for the web game

mod assets;
mod games;
mod handlers;
mod types;

pub use games::GameManager;
pub use handlers::create_router;

use crate::game::{GameOptions, OutcomeClassifier};
use crate::game_log::GameLog;
use crate::llm::LlmService;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub games: Arc<GameManager>,
    pub log: Arc<dyn GameLog>,
    /// Provider label written to log records
    pub api_type: String,
}

impl AppState {
    pub fn new(
        oracle: Arc<dyn LlmService>,
        classifier: Arc<dyn OutcomeClassifier>,
        log: Arc<dyn GameLog>,
        defaults: GameOptions,
        api_type: impl Into<String>,
    ) -> Self {
        Self {
            games: Arc::new(GameManager::new(oracle, classifier, defaults)),
            log,
            api_type: api_type.into(),
        }
    }
}
