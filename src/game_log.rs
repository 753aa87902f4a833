//! Game log
//!
//! Finished games and player feedback are appended to a JSON-lines file, one
//! record per line, for later review of how the guesser performs.

use crate::game::{Exchange, GameController, GameStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum GameLogError {
    #[error("Failed to write game log: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize game log record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Player verdict on a finished game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub satisfied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Which model played the guesser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmDetails {
    pub api_type: String,
    pub model: String,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLogRecord {
    pub timestamp: DateTime<Utc>,
    pub game_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept: Option<String>,
    pub exchanges: Vec<Exchange>,
    pub status: GameStatus,
    pub questions_used: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    pub llm: LlmDetails,
}

impl GameLogRecord {
    /// Snapshot a game as it stands now
    pub fn from_game(game_id: impl Into<String>, game: &GameController, api_type: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            game_id: game_id.into(),
            concept: game.concept().map(str::to_string),
            exchanges: game.exchanges().to_vec(),
            status: game.state().status,
            questions_used: game.state().questions_asked,
            feedback: None,
            llm: LlmDetails {
                api_type: api_type.to_string(),
                model: game.model_id().to_string(),
                temperature: game.temperature(),
            },
        }
    }

    pub fn with_feedback(mut self, feedback: Feedback) -> Self {
        self.feedback = Some(feedback);
        self
    }
}

#[async_trait]
pub trait GameLog: Send + Sync {
    async fn append(&self, record: &GameLogRecord) -> Result<(), GameLogError>;
}

/// Appends records to a `.jsonl` file
pub struct JsonlGameLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlGameLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl GameLog for JsonlGameLog {
    async fn append(&self, record: &GameLogRecord) -> Result<(), GameLogError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        // One writer at a time so lines never interleave
        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!(game_id = %record.game_id, path = %self.path.display(), "Game logged");
        Ok(())
    }
}

/// Discards every record
#[derive(Debug, Default)]
pub struct NullGameLog;

#[async_trait]
impl GameLog for NullGameLog {
    async fn append(&self, _record: &GameLogRecord) -> Result<(), GameLogError> {
        Ok(())
    }
}
