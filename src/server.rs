//! HTTP interface for browsing records and generating surveys.
//!
//! Navigation state travels with each request (see [`NavigationState`]), so
//! the server itself holds only the read-only store and the survey settings.

use crate::error::{PapersError, Result};
use crate::navigation::{NavAction, NavigationState, Navigator, View};
use crate::render::{self, to_markdown, DisplayBlock};
use crate::store::{filter_by_years, CatalogEntry, RecordStore};
use crate::survey::{self, SurveyConfig, TokenUsage};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared server state
pub struct AppState {
    pub store: RecordStore,
    pub survey: SurveyConfig,
}

pub type SharedState = Arc<AppState>;

/// Build the application router
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/records", get(list_handler))
        .route("/api/records/{id}", get(record_handler))
        .route("/api/subjects", get(subjects_handler))
        .route("/api/subjects/{subject}/papers", get(papers_handler))
        .route("/api/catalog", get(catalog_handler))
        .route("/api/navigate", post(navigate_handler))
        .route("/api/survey", post(survey_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the server until it is stopped
pub async fn serve(state: SharedState, host: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| PapersError::Config(format!("Invalid host:port {}:{}: {}", host, port, e)))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Listening");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

impl IntoResponse for PapersError {
    fn into_response(self) -> Response {
        let status = match &self {
            PapersError::NotFound(_) => StatusCode::NOT_FOUND,
            PapersError::Parse { .. } | PapersError::Validation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PapersError::Config(_) => StatusCode::BAD_REQUEST,
            e if e.is_service_error() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Serialize)]
struct ListResponse {
    count: usize,
    records: Vec<String>,
}

async fn list_handler(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>> {
    let records = Navigator::new(&state.store).search(&params.q)?;
    Ok(Json(ListResponse {
        count: records.len(),
        records,
    }))
}

#[derive(Debug, Deserialize)]
struct RecordParams {
    #[serde(default)]
    format: Option<String>,
}

#[derive(Debug, Serialize)]
struct RecordResponse {
    id: String,
    blocks: Vec<DisplayBlock>,
}

async fn record_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(params): Query<RecordParams>,
) -> Result<Response> {
    let record = state.store.load(&id)?;
    let blocks = render::render_with_id(&record, &id);

    match params.format.as_deref() {
        Some("markdown") | Some("md") => Ok((
            [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
            to_markdown(&blocks),
        )
            .into_response()),
        None | Some("json") => Ok(Json(RecordResponse { id, blocks }).into_response()),
        Some(other) => Err(PapersError::Validation(format!(
            "Unknown format '{}', expected json or markdown",
            other
        ))),
    }
}

async fn subjects_handler(State(state): State<SharedState>) -> Result<Json<Vec<String>>> {
    Ok(Json(Navigator::new(&state.store).get_subjects()?))
}

async fn papers_handler(
    State(state): State<SharedState>,
    Path(subject): Path<String>,
) -> Result<Json<Vec<String>>> {
    Ok(Json(Navigator::new(&state.store).get_papers(&subject)?))
}

#[derive(Debug, Deserialize)]
struct CatalogParams {
    /// Comma-separated years; absent means every record
    #[serde(default)]
    years: Option<String>,
}

#[derive(Debug, Serialize)]
struct CatalogResponse {
    years: Vec<i32>,
    entries: Vec<CatalogEntry>,
}

async fn catalog_handler(
    State(state): State<SharedState>,
    Query(params): Query<CatalogParams>,
) -> Result<Json<CatalogResponse>> {
    let entries = state.store.catalog()?;
    let years = state.store.years()?;
    let entries = match params.years.as_deref() {
        Some(raw) => filter_by_years(&entries, &parse_years(raw)?),
        None => entries,
    };
    Ok(Json(CatalogResponse { years, entries }))
}

/// `"2023, 2024"` -> `[2023, 2024]`
pub fn parse_years(raw: &str) -> Result<Vec<i32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i32>()
                .map_err(|_| PapersError::Validation(format!("Invalid year '{}'", s)))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct NavigateRequest {
    #[serde(default)]
    state: NavigationState,
    #[serde(default)]
    action: Option<NavAction>,
}

#[derive(Debug, Serialize)]
struct NavigateResponse {
    state: NavigationState,
    view: View,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Apply an action to the client's state and return the new view.
///
/// A failed action keeps the previous state and reports the error inline.
async fn navigate_handler(
    State(state): State<SharedState>,
    Json(req): Json<NavigateRequest>,
) -> Json<NavigateResponse> {
    let nav = Navigator::new(&state.store);
    let (next, error) = match req.action.as_ref() {
        Some(action) => match nav.apply(&req.state, action) {
            Ok(next) => (next, None),
            Err(e) => {
                warn!(error = %e, "Navigation action failed");
                (req.state.clone(), Some(e.to_string()))
            }
        },
        None => (req.state.clone(), None),
    };
    let view = nav.current_view(&next);
    Json(NavigateResponse {
        state: next,
        view,
        error,
    })
}

#[derive(Debug, Deserialize)]
struct SurveyRequest {
    ids: Vec<String>,
    #[serde(default)]
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct SurveyResponse {
    text: String,
    usage: TokenUsage,
}

async fn survey_handler(
    State(state): State<SharedState>,
    Json(req): Json<SurveyRequest>,
) -> Result<Json<SurveyResponse>> {
    let records = req
        .ids
        .iter()
        .map(|id| state.store.load(id))
        .collect::<Result<Vec<_>>>()?;

    let mut config = state.survey.clone();
    if let Some(key) = req.api_key.filter(|k| !k.trim().is_empty()) {
        config.api_key = key;
    }

    let generated = survey::generate_survey(&config, &records).await?;
    Ok(Json(SurveyResponse {
        text: generated.text,
        usage: generated.usage,
    }))
}
