//! Bulk test driver
//!
//! Plays many games against the oracle with a second model standing in for
//! the human, and summarises how often and how quickly the guesser wins.

use crate::game::{
    Answer, GameController, GameError, GameOptions, GameStatus, OutcomeClassifier,
};
use crate::game_log::{GameLog, GameLogRecord};
use crate::llm::{LlmError, LlmRequest, LlmService};
use crate::system_prompt::answerer_prompt;
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Games played when no count is given
pub const DEFAULT_GAMES: usize = 10;

#[derive(Debug, Error)]
pub enum BulkTestError {
    #[error("Concept list is empty")]
    NoConcepts,
    #[error("Failed to read concepts from {}: {source}", path.display())]
    ConceptsFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("Simulated human failed: {0}")]
    Human(#[from] LlmError),
}

/// Something that knows the concept and answers the guesser's questions
#[async_trait]
pub trait HumanPlayer: Send + Sync {
    async fn answer(&self, concept: &str, question: &str) -> Result<Answer, LlmError>;
}

/// Human played by a model. Only an explicit yes counts as yes.
pub struct LlmHuman {
    llm: Arc<dyn LlmService>,
    temperature: Option<f32>,
}

impl LlmHuman {
    pub fn new(llm: Arc<dyn LlmService>, temperature: Option<f32>) -> Self {
        Self { llm, temperature }
    }
}

#[async_trait]
impl HumanPlayer for LlmHuman {
    async fn answer(&self, concept: &str, question: &str) -> Result<Answer, LlmError> {
        let request = LlmRequest::single_prompt(answerer_prompt(concept, question))
            .with_temperature(self.temperature);
        let response = self.llm.complete(&request).await?;
        Ok(Answer::strict(&response.text))
    }
}

/// Outcome of one simulated game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkTestResult {
    pub concept: String,
    pub status: GameStatus,
    pub questions_used: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkTestReport {
    pub detailed_results: Vec<BulkTestResult>,
    pub success_count: usize,
    pub average_questions: f64,
    /// Share of games won, in `[0, 1]`
    pub performance_score: f64,
}

impl BulkTestReport {
    /// Aggregate results; an empty run reports zeros
    #[allow(clippy::cast_precision_loss)]
    pub fn from_results(detailed_results: Vec<BulkTestResult>) -> Self {
        let total = detailed_results.len();
        let success_count = detailed_results
            .iter()
            .filter(|r| r.status == GameStatus::Success)
            .count();
        let questions: u64 = detailed_results
            .iter()
            .map(|r| u64::from(r.questions_used))
            .sum();

        let (average_questions, performance_score) = if total == 0 {
            (0.0, 0.0)
        } else {
            (
                questions as f64 / total as f64,
                success_count as f64 / total as f64,
            )
        };

        Self {
            detailed_results,
            success_count,
            average_questions,
            performance_score,
        }
    }

    pub fn total_games(&self) -> usize {
        self.detailed_results.len()
    }
}

/// How each game picks its concept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Sampling {
    /// Round-robin through the list
    #[default]
    Cycle,
    /// Uniform choice per game
    Random,
}

#[derive(Debug, Clone)]
pub struct BulkTestConfig {
    pub games: usize,
    pub sampling: Sampling,
    /// Games in flight at once; 1 plays them one after another
    pub concurrency: usize,
    pub game_options: GameOptions,
    /// Recorded in the game log alongside the model id
    pub api_type: String,
}

impl Default for BulkTestConfig {
    fn default() -> Self {
        Self {
            games: DEFAULT_GAMES,
            sampling: Sampling::Cycle,
            concurrency: 1,
            game_options: GameOptions::default(),
            api_type: "openai".to_string(),
        }
    }
}

pub struct BulkTestDriver {
    oracle: Arc<dyn LlmService>,
    human: Arc<dyn HumanPlayer>,
    classifier: Arc<dyn OutcomeClassifier>,
    log: Arc<dyn GameLog>,
    config: BulkTestConfig,
}

impl BulkTestDriver {
    pub fn new(
        oracle: Arc<dyn LlmService>,
        human: Arc<dyn HumanPlayer>,
        classifier: Arc<dyn OutcomeClassifier>,
        log: Arc<dyn GameLog>,
        config: BulkTestConfig,
    ) -> Self {
        Self {
            oracle,
            human,
            classifier,
            log,
            config,
        }
    }

    /// Play the configured number of games. The first oracle or human error
    /// aborts the run. Results come back in game order.
    pub async fn run(&self, concepts: &[String]) -> Result<BulkTestReport, BulkTestError> {
        if self.config.games == 0 {
            return Ok(BulkTestReport::from_results(Vec::new()));
        }
        if concepts.is_empty() {
            return Err(BulkTestError::NoConcepts);
        }

        let picks = self.pick_concepts(concepts);
        tracing::info!(
            games = picks.len(),
            concurrency = self.config.concurrency,
            sampling = ?self.config.sampling,
            "Bulk test started"
        );

        let results: Vec<BulkTestResult> = stream::iter(
            picks
                .into_iter()
                .enumerate()
                .map(|(index, concept)| self.simulate_game(index + 1, concept)),
        )
        .buffered(self.config.concurrency.max(1))
        .try_collect()
        .await?;

        let report = BulkTestReport::from_results(results);
        tracing::info!(
            success_count = report.success_count,
            average_questions = report.average_questions,
            performance_score = report.performance_score,
            "Bulk test finished"
        );
        Ok(report)
    }

    fn pick_concepts(&self, concepts: &[String]) -> Vec<String> {
        match self.config.sampling {
            Sampling::Cycle => concepts
                .iter()
                .cycle()
                .take(self.config.games)
                .cloned()
                .collect(),
            Sampling::Random => {
                let mut rng = rand::thread_rng();
                (0..self.config.games)
                    .filter_map(|_| concepts.choose(&mut rng).cloned())
                    .collect()
            }
        }
    }

    async fn simulate_game(
        &self,
        number: usize,
        concept: String,
    ) -> Result<BulkTestResult, BulkTestError> {
        let mut game = GameController::new(
            self.oracle.clone(),
            self.classifier.clone(),
            self.config.game_options.clone(),
        );
        game.start(Some(concept.clone()));
        tracing::info!(game = number, concept = %concept, "Simulated game started");

        // The human is always ready to start
        let mut input = Answer::Yes;
        while !game.state().is_terminal() {
            let turn = game.submit_answer(input.as_reply()).await?;
            if turn.state.is_terminal() {
                break;
            }
            let question = game.session().latest_ai_turn().unwrap_or_default();
            input = self.human.answer(&concept, question).await?;
            tracing::debug!(game = number, question, answer = input.as_reply(), "Human answered");
        }

        let record = GameLogRecord::from_game(
            uuid::Uuid::new_v4().to_string(),
            &game,
            &self.config.api_type,
        );
        if let Err(e) = self.log.append(&record).await {
            tracing::warn!(error = %e, "Failed to log simulated game");
        }

        let state = game.state();
        tracing::info!(
            game = number,
            concept = %concept,
            status = %state.status,
            questions_used = state.questions_asked,
            "Simulated game finished"
        );
        Ok(BulkTestResult {
            concept,
            status: state.status,
            questions_used: state.questions_asked,
        })
    }
}

/// Concepts from a file, one per line; blank lines are skipped
pub async fn read_concepts(path: &Path) -> Result<Vec<String>, BulkTestError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| BulkTestError::ConceptsFile {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
