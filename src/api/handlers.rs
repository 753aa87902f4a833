//! HTTP request handlers

use super::assets::{get_index_html, serve_static};
use super::types::{
    AnswerRequest, AnswerResponse, CreateGameRequest, ErrorResponse, FeedbackRequest,
    FeedbackResponse, GameResponse, RestartRequest,
};
use super::AppState;
use crate::game::{GameController, GameError, GameStatus, TransitionError, MAX_QUESTIONS};
use crate::game_log::{Feedback, GameLogRecord};
use crate::system_prompt::OUT_OF_QUESTIONS_MESSAGE;
use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::time::Duration;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Chat page
        .route("/", get(serve_index))
        // Static assets (embedded or filesystem fallback)
        .route("/assets/*path", get(serve_static))
        // Games
        .route("/api/games", post(create_game))
        .route("/api/games/:id", get(get_game).delete(delete_game))
        .route("/api/games/:id/answer", post(submit_answer))
        .route("/api/games/:id/restart", post(restart_game))
        .route("/api/games/:id/feedback", post(submit_feedback))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Page
// ============================================================

async fn serve_index() -> impl IntoResponse {
    match get_index_html() {
        Some(content) => Html(content).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html("<h1>404 - chat page not found</h1>".to_string()),
        )
            .into_response(),
    }
}

// ============================================================
// Games
// ============================================================

async fn create_game(
    State(state): State<AppState>,
    body: Option<Json<CreateGameRequest>>,
) -> Json<GameResponse> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let (id, handle) = state.games.create(req.concept, req.temperature).await;
    let game = handle.lock().await;
    Json(GameResponse::new(id, &game))
}

async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GameResponse>, AppError> {
    let handle = find_game(&state, &id).await?;
    let game = handle.lock().await;
    Ok(Json(GameResponse::new(id, &game)))
}

async fn submit_answer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let handle = find_game(&state, &id).await?;
    let mut game = handle.lock().await;

    let turn = game.submit_answer(&req.text).await.map_err(|e| {
        tracing::warn!(game_id = %id, error = %e, "Answer rejected");
        AppError::from(e)
    })?;

    let closing_message = (turn.state.status == GameStatus::Failure
        && turn.state.questions_asked >= MAX_QUESTIONS)
        .then(|| OUT_OF_QUESTIONS_MESSAGE.to_string());

    if turn.state.is_terminal() {
        log_game(&state, &id, &game).await;
    }

    Ok(Json(AnswerResponse {
        questions_remaining: turn.state.questions_remaining(),
        reply: turn.reply,
        answer: turn.answer,
        outcome: turn.outcome,
        state: turn.state,
        closing_message,
    }))
}

async fn delete_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .games
        .remove(&id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| AppError::NotFound(format!("Game not found: {id}")))
}

async fn restart_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<RestartRequest>>,
) -> Result<Json<GameResponse>, AppError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let handle = find_game(&state, &id).await?;
    let mut game = handle.lock().await;
    game.start(req.concept);
    tracing::info!(game_id = %id, "Game restarted");
    Ok(Json(GameResponse::new(id, &game)))
}

async fn submit_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, AppError> {
    let handle = find_game(&state, &id).await?;
    let game = handle.lock().await;
    if !game.state().is_terminal() {
        return Err(AppError::Conflict(
            "Feedback can only be given once the game is over".to_string(),
        ));
    }

    let record = GameLogRecord::from_game(id.as_str(), &game, &state.api_type).with_feedback(
        Feedback {
            satisfied: req.satisfied,
            comment: req.comment.filter(|c| !c.trim().is_empty()),
        },
    );
    state
        .log
        .append(&record)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    drop(game);

    // Nothing more can happen to a game once its feedback is on record
    state.games.remove(&id).await;

    tracing::info!(game_id = %id, satisfied = req.satisfied, "Feedback recorded");
    Ok(Json(FeedbackResponse { recorded: true }))
}

async fn find_game(state: &AppState, id: &str) -> Result<super::games::GameHandle, AppError> {
    state
        .games
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Game not found: {id}")))
}

/// A failed log write never fails the turn
async fn log_game(state: &AppState, id: &str, game: &GameController) {
    let record = GameLogRecord::from_game(id, game, &state.api_type);
    if let Err(e) = state.log.append(&record).await {
        tracing::warn!(game_id = %id, error = %e, "Failed to log finished game");
    }
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("twenty-questions ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    /// Oracle failure, with the provider's `Retry-After` when it sent one
    BadGateway {
        message: String,
        retry_after: Option<Duration>,
    },
    Internal(String),
}

impl From<GameError> for AppError {
    fn from(e: GameError) -> Self {
        match e {
            GameError::InvalidState(TransitionError::EmptyAnswer) => {
                AppError::BadRequest(e.to_string())
            }
            GameError::InvalidState(TransitionError::InvalidState(_)) => {
                AppError::Conflict(e.to_string())
            }
            GameError::Oracle(ref err) => AppError::BadGateway {
                retry_after: err.retry_after,
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retry_after = match &self {
            AppError::BadGateway { retry_after, .. } => *retry_after,
            _ => None,
        };
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::BadGateway { message, .. } => (StatusCode::BAD_GATEWAY, message),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let mut response = (status, Json(ErrorResponse::new(message))).into_response();
        if let Some(delay) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(delay.as_secs()));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameOptions, HeuristicClassifier};
    use crate::llm::LlmError;
    use crate::testing::{MemoryGameLog, MockLlmService};
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct Harness {
        router: Router,
        oracle: Arc<MockLlmService>,
        log: Arc<MemoryGameLog>,
    }

    fn harness() -> Harness {
        let oracle = Arc::new(MockLlmService::new("mock"));
        let log = Arc::new(MemoryGameLog::default());
        let state = AppState::new(
            oracle.clone(),
            Arc::new(HeuristicClassifier::new()),
            log.clone(),
            GameOptions::default(),
            "openai",
        );
        Harness {
            router: create_router(state),
            oracle,
            log,
        }
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn new_game(h: &Harness, body: Option<Value>) -> String {
        let (status, value) = send(&h.router, Method::POST, "/api/games", body).await;
        assert_eq!(status, StatusCode::OK);
        value["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_game_starts_with_welcome() {
        let h = harness();
        let (status, value) = send(&h.router, Method::POST, "/api/games", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["state"]["questions_asked"], 0);
        assert_eq!(value["state"]["status"], "InProgress");
        assert_eq!(value["questions_remaining"], 20);
        assert_eq!(value["transcript"].as_array().unwrap().len(), 1);
        assert_eq!(value["transcript"][0]["speaker"], "ai");

        let id = value["id"].as_str().unwrap();
        let (status, fetched) = send(&h.router, Method::GET, &format!("/api/games/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["id"], id);
    }

    #[tokio::test]
    async fn test_answer_advances_game() {
        let h = harness();
        h.oracle.queue_text("Is it alive?");
        let id = new_game(&h, None).await;

        let (status, value) = send(
            &h.router,
            Method::POST,
            &format!("/api/games/{id}/answer"),
            Some(json!({"text": "Yes"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["reply"], "Is it alive?");
        assert_eq!(value["answer"], "yes");
        assert_eq!(value["outcome"]["kind"], "continue");
        assert_eq!(value["state"]["questions_asked"], 1);
        assert!(value.get("closing_message").is_none());
    }

    #[tokio::test]
    async fn test_unknown_game_is_404() {
        let h = harness();
        let (status, value) = send(
            &h.router,
            Method::POST,
            "/api/games/nope/answer",
            Some(json!({"text": "Yes"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(value["error"].as_str().unwrap().contains("nope"));
    }

    #[tokio::test]
    async fn test_empty_answer_is_400() {
        let h = harness();
        let id = new_game(&h, None).await;
        let (status, _) = send(
            &h.router,
            Method::POST,
            &format!("/api/games/{id}/answer"),
            Some(json!({"text": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oracle_failure_is_502_and_retryable() {
        let h = harness();
        h.oracle.queue_error(LlmError::server_error("upstream down"));
        h.oracle.queue_text("Is it alive?");
        let id = new_game(&h, None).await;
        let uri = format!("/api/games/{id}/answer");

        let (status, value) = send(&h.router, Method::POST, &uri, Some(json!({"text": "Yes"}))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(value["error"].as_str().unwrap().contains("upstream down"));

        let (status, value) = send(&h.router, Method::POST, &uri, Some(json!({"text": "Yes"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["state"]["questions_asked"], 1);
    }

    #[tokio::test]
    async fn test_rate_limited_oracle_passes_retry_after() {
        let h = harness();
        h.oracle
            .queue_error(LlmError::rate_limit("slow down").with_retry_after(Duration::from_secs(7)));
        let id = new_game(&h, None).await;

        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/games/{id}/answer"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"text": "Yes"}).to_string()))
            .unwrap();
        let response = h.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(response.headers()[header::RETRY_AFTER], "7");
    }

    #[tokio::test]
    async fn test_finished_game_conflicts_and_is_logged() {
        let h = harness();
        h.oracle.queue_text("Is it a car?");
        let id = new_game(&h, Some(json!({"concept": "car", "temperature": 0.7}))).await;
        let uri = format!("/api/games/{id}/answer");

        let (status, value) = send(&h.router, Method::POST, &uri, Some(json!({"text": "Yes"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["state"]["status"], "Success");

        let (status, _) = send(&h.router, Method::POST, &uri, Some(json!({"text": "Yes"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let records = h.log.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].game_id, id);
        assert_eq!(records[0].status, GameStatus::Success);
        assert_eq!(records[0].llm.temperature, Some(0.7));
        assert!(records[0].feedback.is_none());
    }

    #[tokio::test]
    async fn test_out_of_questions_adds_closing_message() {
        let h = harness();
        h.oracle
            .queue_texts((1..=20).map(|i| format!("Is it thing number {i}?")));
        let id = new_game(&h, None).await;
        let uri = format!("/api/games/{id}/answer");

        let mut last = Value::Null;
        for _ in 0..20 {
            let (status, value) = send(&h.router, Method::POST, &uri, Some(json!({"text": "No"}))).await;
            assert_eq!(status, StatusCode::OK);
            last = value;
        }
        assert_eq!(last["state"]["status"], "Failure");
        assert_eq!(last["questions_remaining"], 0);
        assert_eq!(last["closing_message"], OUT_OF_QUESTIONS_MESSAGE);
    }

    #[tokio::test]
    async fn test_feedback_requires_finished_game() {
        let h = harness();
        h.oracle.queue_text("Hooray! I got it!");
        let id = new_game(&h, None).await;
        let feedback_uri = format!("/api/games/{id}/feedback");

        let (status, _) = send(
            &h.router,
            Method::POST,
            &feedback_uri,
            Some(json!({"satisfied": true})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        send(
            &h.router,
            Method::POST,
            &format!("/api/games/{id}/answer"),
            Some(json!({"text": "Yes"})),
        )
        .await;

        let (status, value) = send(
            &h.router,
            Method::POST,
            &feedback_uri,
            Some(json!({"satisfied": false, "comment": "took a while"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["recorded"], true);

        let records = h.log.records();
        assert_eq!(records.len(), 2);
        let feedback = records[1].feedback.as_ref().unwrap();
        assert!(!feedback.satisfied);
        assert_eq!(feedback.comment.as_deref(), Some("took a while"));

        // The game is released once its feedback is logged
        let (status, _) = send(&h.router, Method::GET, &format!("/api/games/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_game() {
        let h = harness();
        let id = new_game(&h, None).await;
        let uri = format!("/api/games/{id}");

        let (status, _) = send(&h.router, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&h.router, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&h.router, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_restart_resets_game() {
        let h = harness();
        h.oracle.queue_text("Is it alive?");
        let id = new_game(&h, None).await;
        send(
            &h.router,
            Method::POST,
            &format!("/api/games/{id}/answer"),
            Some(json!({"text": "Yes"})),
        )
        .await;

        let (status, value) = send(&h.router, Method::POST, &format!("/api/games/{id}/restart"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["state"]["questions_asked"], 0);
        assert_eq!(value["transcript"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_version() {
        let h = harness();
        let response = h
            .router
            .clone()
            .oneshot(Request::builder().uri("/version").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).starts_with("twenty-questions "));
    }
}
