//! Twenty Questions - an LLM plays the guesser
//!
//! The human thinks of an object and the model asks yes/no questions until it
//! names it or runs out of its twenty questions. Runs as a web app, as a
//! terminal game, or as a bulk test where a second model plays the human.

mod api;
mod bulk;
mod game;
mod game_log;
mod llm;
mod play;
mod session;
mod system_prompt;

#[cfg(test)]
mod testing;

use api::{create_router, AppState};
use bulk::{BulkTestConfig, BulkTestDriver, BulkTestReport, LlmHuman, Sampling};
use clap::{Parser, Subcommand};
use game::{GameController, GameOptions, HeuristicClassifier, OutcomeClassifier};
use game_log::{GameLog, JsonlGameLog, NullGameLog};
use llm::{clamp_temperature, create_service, LlmConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "twenty-questions")]
#[command(about = "Play 20 Questions against an LLM, or run a bulk test")]
#[command(version)]
struct Cli {
    /// Guesser sampling temperature in [0, 1]; overrides LLM_TEMPERATURE
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// Seconds to wait for each oracle reply
    #[arg(long, global = true, default_value_t = game::DEFAULT_ORACLE_TIMEOUT.as_secs())]
    oracle_timeout: u64,

    /// Where finished games and feedback are appended
    #[arg(
        long,
        global = true,
        env = "TWENTY_QUESTIONS_LOG",
        default_value = "logs/game_logs.jsonl"
    )]
    log_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web app
    Serve {
        #[arg(long, env = "TWENTY_QUESTIONS_PORT", default_value_t = 8000)]
        port: u16,
    },
    /// Play in the terminal
    Play,
    /// Simulate games with a second model playing the human
    #[command(name = "bulk_test")]
    BulkTest {
        /// Concept list, one per line
        #[arg(long, default_value = "data/bulk_test/objects.txt")]
        concepts: PathBuf,

        #[arg(long, default_value_t = bulk::DEFAULT_GAMES)]
        games: usize,

        #[arg(long, value_enum, default_value_t = Sampling::Cycle)]
        sampling: Sampling,

        /// Games played at once
        #[arg(long, default_value_t = 1)]
        concurrency: usize,

        /// Do not write simulated games to the game log
        #[arg(long)]
        no_log: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(matches!(cli.command, Commands::Serve { .. }));

    // Oracle
    let mut llm_config = LlmConfig::from_env()?;
    if let Some(temperature) = cli.temperature {
        llm_config.temperature = clamp_temperature(temperature);
    }
    let oracle = create_service(&llm_config)?;
    tracing::info!(
        api_type = %llm_config.api_type,
        model = %oracle.model_id(),
        temperature = llm_config.temperature,
        "Oracle configured"
    );

    let classifier: Arc<dyn OutcomeClassifier> = Arc::new(HeuristicClassifier::new());
    let options = GameOptions {
        temperature: Some(llm_config.temperature),
        oracle_timeout: Some(Duration::from_secs(cli.oracle_timeout)),
    };
    let api_type = llm_config.api_type.to_string();

    match cli.command {
        Commands::Serve { port } => {
            let log: Arc<dyn GameLog> = Arc::new(JsonlGameLog::new(&cli.log_file));
            let state = AppState::new(oracle, classifier, log, options, api_type);

            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);

            let compression = CompressionLayer::new()
                .gzip(true)
                .br(true)
                .deflate(true)
                .zstd(true);

            let app = create_router(state)
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(compression);

            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            tracing::info!(log_file = %cli.log_file.display(), "Twenty Questions listening on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }

        Commands::Play => {
            let log = JsonlGameLog::new(&cli.log_file);
            let mut game = GameController::new(oracle, classifier, options);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = tokio::io::stdout();
            play::play(&mut game, stdin, &mut stdout, &log, &api_type).await?;
        }

        Commands::BulkTest {
            concepts,
            games,
            sampling,
            concurrency,
            no_log,
        } => {
            let concepts = bulk::read_concepts(&concepts).await?;
            let log: Arc<dyn GameLog> = if no_log {
                Arc::new(NullGameLog)
            } else {
                Arc::new(JsonlGameLog::new(&cli.log_file))
            };
            // The simulated human should answer consistently
            let human = Arc::new(LlmHuman::new(oracle.clone(), Some(0.0)));
            let config = BulkTestConfig {
                games,
                sampling,
                concurrency,
                game_options: options,
                api_type,
            };

            let report = BulkTestDriver::new(oracle, human, classifier, log, config)
                .run(&concepts)
                .await?;
            print_report(&report)?;
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let registry = tracing_subscriber::registry();
    if json {
        registry
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "twenty_questions=info,tower_http=info".into()),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(false),
            )
            .init();
    } else {
        // Terminal modes keep stdout for the game itself
        registry
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "twenty_questions=warn".into()),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn print_report(report: &BulkTestReport) -> Result<(), serde_json::Error> {
    println!("\nResults ({} games):", report.total_games());
    println!("\ndetailed_results:");
    for result in &report.detailed_results {
        println!(
            "  ({}, {}, {})",
            result.concept, result.status, result.questions_used
        );
    }
    println!("\nsuccess_count: {}", report.success_count);
    println!("\naverage_questions: {}", report.average_questions);
    println!("\nperformance_score: {}", report.performance_score);
    println!("\n{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
