//! HTTP API server.
//!
//! Wires the database, providers, and config into an axum router. All shared
//! state is constructed once in [`setup_shared_state`] and passed into
//! handlers — no globals.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::ask::{self, AskError};
use crate::completion::{self, CompletionProvider};
use crate::config::MemoirConfig;
use crate::db;
use crate::embedding::{self, EmbeddingProvider};
use crate::journal::types::NewEntry;
use crate::journal::{normalize, scan, store};

#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    embedding: Arc<dyn EmbeddingProvider>,
    completion: Arc<dyn CompletionProvider>,
    config: Arc<MemoirConfig>,
}

/// Shared setup: open DB, create providers, check for a model change.
fn setup_shared_state(config: MemoirConfig) -> anyhow::Result<AppState> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path, config.openai.dimensions)?;
    tracing::info!(db = %db_path.display(), "database ready");

    // A changed embedding model makes stored vectors incomparable
    if let Ok(Some(stored_model)) = db::schema::get_embedding_model(&conn) {
        if stored_model != config.openai.embedding_model {
            tracing::warn!(
                stored = %stored_model,
                configured = %config.openai.embedding_model,
                "embedding model changed — run `memoir re-embed` to update all vectors"
            );
        }
    }

    let embedding: Arc<dyn EmbeddingProvider> =
        Arc::from(embedding::create_provider(&config.openai)?);
    let completion: Arc<dyn CompletionProvider> =
        Arc::from(completion::create_provider(&config.openai)?);
    tracing::info!("providers ready");

    Ok(AppState {
        db: Arc::new(Mutex::new(conn)),
        embedding,
        completion,
        config: Arc::new(config),
    })
}

/// Start the HTTP API server.
pub async fn serve(config: MemoirConfig) -> anyhow::Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    let state = setup_shared_state(config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "memoir API listening at http://{bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for ctrl-c");
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/ask", post(ask_handler))
        .route("/api/entries", post(add_entry_handler).get(list_entries_handler))
        .route("/api/entries/{id}", delete(delete_entry_handler))
        .route("/api/re-embed", post(re_embed_handler))
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Deserialize)]
struct AskRequest {
    question: String,
}

async fn ask_handler(
    State(state): State<AppState>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<ask::AskResponse>, ApiError> {
    let response = ask::ask(
        &state.db,
        &state.embedding,
        &state.completion,
        &state.config,
        &payload.question,
    )
    .await?;
    Ok(Json(response))
}

async fn add_entry_handler(
    State(state): State<AppState>,
    Json(payload): Json<NewEntry>,
) -> Result<Response, ApiError> {
    store::validate(&payload)
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, "invalid entry", Some(e)))?;

    let text = normalize::combined_text(
        &payload.mit,
        &payload.content,
        payload.prompt.as_deref(),
        &payload.gratitude,
    );
    let provider = Arc::clone(&state.embedding);
    let vector = tokio::task::spawn_blocking(move || provider.embed(&text))
        .await
        .map_err(ApiError::internal)?
        .map_err(|e| ApiError::new(StatusCode::BAD_GATEWAY, "embedding failed", Some(e)))?;

    let db = Arc::clone(&state.db);
    let stored = tokio::task::spawn_blocking(move || {
        let mut conn = db
            .lock()
            .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
        store::add_entry(&mut conn, &payload, &vector)
    })
    .await
    .map_err(ApiError::internal)?
    .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "store failed", Some(e)))?;

    Ok((StatusCode::CREATED, Json(stored)).into_response())
}

#[derive(Debug, Deserialize)]
struct ListParams {
    limit: Option<usize>,
}

async fn list_entries_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<crate::journal::types::JournalEntry>>, ApiError> {
    let limit = params.limit.unwrap_or(10);
    let db = Arc::clone(&state.db);
    let entries = tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
        scan::recent_entries(&conn, limit)
    })
    .await
    .map_err(ApiError::internal)?
    .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "store failed", Some(e)))?;

    Ok(Json(entries))
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    deleted: bool,
}

async fn delete_entry_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let db = Arc::clone(&state.db);
    let deleted = tokio::task::spawn_blocking(move || {
        let mut conn = db
            .lock()
            .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
        store::delete_entry(&mut conn, &id)
    })
    .await
    .map_err(ApiError::internal)?
    .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "store failed", Some(e)))?;

    if deleted {
        Ok(Json(DeleteResponse { deleted }))
    } else {
        Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "entry not found",
            None,
        ))
    }
}

async fn re_embed_handler(
    State(state): State<AppState>,
) -> Result<Json<store::ReembedReport>, ApiError> {
    let db = Arc::clone(&state.db);
    let provider = Arc::clone(&state.embedding);
    let model = state.config.openai.embedding_model.clone();

    let report = tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
        store::re_embed_all(&conn, provider.as_ref(), &model, |_| {})
    })
    .await
    .map_err(ApiError::internal)?
    .map_err(|e| ApiError::new(StatusCode::BAD_GATEWAY, "re-embed failed", Some(e)))?;

    Ok(Json(report))
}

// ── Error mapping ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    error: String,
    detail: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, error: &str, detail: Option<anyhow::Error>) -> Self {
        Self {
            status,
            error: error.to_string(),
            detail: detail.map(|e| format!("{e:#}")),
        }
    }

    fn internal(err: tokio::task::JoinError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "internal task failed".to_string(),
            detail: Some(err.to_string()),
        }
    }
}

impl From<AskError> for ApiError {
    fn from(err: AskError) -> Self {
        let (status, error, detail) = match err {
            AskError::EmptyQuestion => {
                (StatusCode::BAD_REQUEST, "question must not be empty", None)
            }
            AskError::Store(cause) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "journal store query failed",
                Some(format!("{cause:#}")),
            ),
            AskError::Completion(cause) => (
                StatusCode::BAD_GATEWAY,
                "answer generation failed",
                Some(format!("{cause:#}")),
            ),
            AskError::Task(cause) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal task failed",
                Some(cause.to_string()),
            ),
        };
        Self {
            status,
            error: error.to_string(),
            detail,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error,
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}
