//! In-memory registry of web games

use crate::game::{GameController, GameOptions, OutcomeClassifier};
use crate::llm::{clamp_temperature, LlmService};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

/// Games untouched for this long are dropped on the next `create`
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

/// A game shared between requests. The mutex keeps two requests from driving
/// the same game at once.
pub type GameHandle = Arc<Mutex<GameController>>;

struct Entry {
    handle: GameHandle,
    last_seen: Instant,
}

pub struct GameManager {
    oracle: Arc<dyn LlmService>,
    classifier: Arc<dyn OutcomeClassifier>,
    defaults: GameOptions,
    idle_ttl: Duration,
    games: RwLock<HashMap<String, Entry>>,
}

impl GameManager {
    pub fn new(
        oracle: Arc<dyn LlmService>,
        classifier: Arc<dyn OutcomeClassifier>,
        defaults: GameOptions,
    ) -> Self {
        Self {
            oracle,
            classifier,
            defaults,
            idle_ttl: DEFAULT_IDLE_TTL,
            games: RwLock::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    /// Start a game and register it under a fresh id. Idle games are evicted
    /// first.
    pub async fn create(
        &self,
        concept: Option<String>,
        temperature: Option<f32>,
    ) -> (String, GameHandle) {
        let options = GameOptions {
            temperature: temperature.map(clamp_temperature).or(self.defaults.temperature),
            ..self.defaults.clone()
        };
        let mut controller =
            GameController::new(self.oracle.clone(), self.classifier.clone(), options);
        controller.start(concept);

        let id = uuid::Uuid::new_v4().to_string();
        let handle = Arc::new(Mutex::new(controller));
        let mut games = self.games.write().await;

        let before = games.len();
        games.retain(|_, entry| entry.last_seen.elapsed() < self.idle_ttl);
        let evicted = before - games.len();

        games.insert(
            id.clone(),
            Entry {
                handle: handle.clone(),
                last_seen: Instant::now(),
            },
        );
        tracing::info!(game_id = %id, active_games = games.len(), evicted, "Game created");
        (id, handle)
    }

    /// Look up a game and mark it as recently used
    pub async fn get(&self, id: &str) -> Option<GameHandle> {
        let mut games = self.games.write().await;
        let entry = games.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(entry.handle.clone())
    }

    /// Forget a game. Requests already holding its handle finish normally.
    pub async fn remove(&self, id: &str) -> Option<GameHandle> {
        let removed = self.games.write().await.remove(id).map(|entry| entry.handle);
        if removed.is_some() {
            tracing::info!(game_id = %id, "Game removed");
        }
        removed
    }
}
