// HTTP API over the draft session.
//
// Every handler locks the session for its whole duration, so at most one
// mutation is in flight at a time. Request bodies are parsed by hand so a
// bad body gets the same `{ success, message }` envelope as every other
// error.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use fantasta_core::opponents::{opponent_summaries, OpponentSummary};
use fantasta_core::search::{search_players, SearchHit, SearchQuery};
use fantasta_core::valuation::balance::{balance_score, BalanceRating};
use fantasta_core::valuation::budget::{budget_breakdown, RoleBudget, SpendStatus};
use fantasta_core::valuation::suggest::{suggestions, top_by_role, RoleSuggestions};
use fantasta_core::{DraftError, MarkOutcome, PerRole, PickOutcome, Player, Role};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::DraftSettings;
use crate::roster::{read_listing_bytes, RosterError};
use crate::session::{Session, SessionError};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct ApiState {
    pub session: Arc<Mutex<Session>>,
    /// Listing CSV served by `/api/sample-csv`.
    pub listing_path: PathBuf,
}

impl ApiState {
    pub fn new(session: Session, listing_path: impl Into<PathBuf>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            listing_path: listing_path.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Session(e) => match e {
                SessionError::NotInitialized => StatusCode::CONFLICT,
                SessionError::NoSnapshot => StatusCode::NOT_FOUND,
                SessionError::Config(_) => StatusCode::BAD_REQUEST,
                SessionError::Draft(d) => match d {
                    DraftError::NotFound { .. } => StatusCode::NOT_FOUND,
                    DraftError::AlreadyTaken { .. } => StatusCode::CONFLICT,
                    DraftError::InvalidConfiguration { .. }
                    | DraftError::MalformedSnapshot(_) => StatusCode::BAD_REQUEST,
                },
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        }
        let body = Envelope {
            success: false,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}

fn parse_role(s: &str) -> Result<Role, ApiError> {
    Role::from_code(s).ok_or_else(|| ApiError::BadRequest(format!("unknown role '{s}'")))
}

// ---------------------------------------------------------------------------
// Request and response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PickRequest {
    pub name: String,
    pub price: u32,
}

#[derive(Debug, Deserialize)]
pub struct UnavailableRequest {
    pub name: String,
    pub price: u32,
    #[serde(default)]
    pub owner: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Ack<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T> Ack<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Ack {
            success: true,
            data,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoadResponse {
    pub success: bool,
    pub data: serde_json::Value,
    /// When the returned snapshot was written, if known.
    pub saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct RoleBudgetView {
    #[serde(flatten)]
    pub budget: RoleBudget,
    pub status: SpendStatus,
}

#[derive(Debug, Serialize)]
pub struct BudgetResponse {
    pub total_budget: u32,
    pub budget_remaining: u32,
    pub total_spent: u32,
    pub total_excess: f64,
    pub remaining_needed: PerRole<u32>,
    pub roles: PerRole<RoleBudgetView>,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub score: u8,
    pub rating: BalanceRating,
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub k: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub name: Option<String>,
    pub team: Option<String>,
    pub role: Option<String>,
    #[serde(default)]
    pub available_only: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Start a new draft. An empty body uses the configured settings.
pub async fn init(State(api): State<ApiState>, body: Bytes) -> ApiResult<Envelope> {
    let config = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        let settings: DraftSettings = parse_body(&body)?;
        Some(settings.into_draft_config().map_err(SessionError::from)?)
    };
    let mut session = api.session.lock().await;
    let state = session.initialize(config)?;
    info!("Draft initialized over HTTP ({} players)", state.roster.len());
    Ok(Json(Envelope {
        success: true,
        message: format!("Draft initialized with {} players", state.roster.len()),
    }))
}

pub async fn get_state(State(api): State<ApiState>) -> ApiResult<serde_json::Value> {
    let session = api.session.lock().await;
    let value = session
        .state()?
        .to_snapshot_value()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(value))
}

/// Import a snapshot and persist it. A malformed body leaves the current
/// state in place.
pub async fn save(State(api): State<ApiState>, body: Bytes) -> ApiResult<Envelope> {
    let value: serde_json::Value = parse_body(&body)?;
    let mut session = api.session.lock().await;
    session.import_snapshot(value)?;
    Ok(Json(Envelope {
        success: true,
        message: "State saved".into(),
    }))
}

pub async fn load(State(api): State<ApiState>) -> ApiResult<LoadResponse> {
    let session = api.session.lock().await;
    let stored = session.stored_snapshot()?;
    Ok(Json(LoadResponse {
        success: true,
        data: stored.value,
        saved_at: stored.saved_at,
    }))
}

pub async fn sample_csv(State(api): State<ApiState>) -> Result<Response, ApiError> {
    let bytes = read_listing_bytes(&api.listing_path).map_err(|e| match e {
        RosterError::Io { ref source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
            ApiError::NotFound("sample CSV not found".into())
        }
        other => ApiError::Internal(other.to_string()),
    })?;
    let file_name = api
        .listing_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("players.csv");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={file_name}"),
            ),
        ],
        bytes,
    )
        .into_response())
}

pub async fn get_suggestions(
    State(api): State<ApiState>,
) -> ApiResult<PerRole<RoleSuggestions>> {
    let session = api.session.lock().await;
    Ok(Json(suggestions(session.state()?)))
}

pub async fn get_budget(State(api): State<ApiState>) -> ApiResult<BudgetResponse> {
    let session = api.session.lock().await;
    let state = session.state()?;
    let breakdown = budget_breakdown(state);
    Ok(Json(BudgetResponse {
        total_budget: state.config.total_budget,
        budget_remaining: state.budget_remaining,
        total_spent: state.total_spent(),
        total_excess: breakdown.total_excess,
        remaining_needed: state.remaining_needed(),
        roles: breakdown.roles.map(|_, rb| RoleBudgetView {
            budget: *rb,
            status: rb.status(),
        }),
    }))
}

pub async fn get_balance(State(api): State<ApiState>) -> ApiResult<BalanceResponse> {
    let session = api.session.lock().await;
    let score = balance_score(session.state()?);
    Ok(Json(BalanceResponse {
        score,
        rating: BalanceRating::from_score(score),
    }))
}

/// Top players of a role by score, ignoring availability. `k` defaults to
/// the configured list length.
pub async fn get_top_players(
    State(api): State<ApiState>,
    Path(role): Path<String>,
    Query(query): Query<TopQuery>,
) -> ApiResult<Vec<Player>> {
    let role = parse_role(&role)?;
    let session = api.session.lock().await;
    let state = session.state()?;
    let k = query.k.unwrap_or(state.config.top_k);
    Ok(Json(top_by_role(state, role, k)))
}

pub async fn search(
    State(api): State<ApiState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<SearchHit>> {
    let role = match params.role.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(r) => Some(parse_role(r)?),
    };
    let query = SearchQuery {
        name: params.name,
        team: params.team,
        role,
        available_only: params.available_only,
    };
    let session = api.session.lock().await;
    Ok(Json(search_players(session.state()?, &query)))
}

pub async fn get_opponents(State(api): State<ApiState>) -> ApiResult<Vec<OpponentSummary>> {
    let session = api.session.lock().await;
    Ok(Json(opponent_summaries(session.state()?)))
}

pub async fn pick(State(api): State<ApiState>, body: Bytes) -> ApiResult<Ack<PickOutcome>> {
    let req: PickRequest = parse_body(&body)?;
    let mut session = api.session.lock().await;
    let outcome = session.pick(&req.name, req.price)?;
    Ok(Ack::ok(outcome))
}

pub async fn mark_unavailable(
    State(api): State<ApiState>,
    body: Bytes,
) -> ApiResult<Ack<MarkOutcome>> {
    let req: UnavailableRequest = parse_body(&body)?;
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".into()));
    }
    let mut session = api.session.lock().await;
    let outcome = session.mark_unavailable(req.name.trim(), req.price, req.owner.as_deref())?;
    Ok(Ack::ok(outcome))
}

// ---------------------------------------------------------------------------
// Router and server
// ---------------------------------------------------------------------------

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/init", post(init))
        .route("/api/state", get(get_state))
        .route("/api/save", post(save))
        .route("/api/load", get(load))
        .route("/api/sample-csv", get(sample_csv))
        .route("/api/suggestions", get(get_suggestions))
        .route("/api/budget", get(get_budget))
        .route("/api/balance", get(get_balance))
        .route("/api/players/:role", get(get_top_players))
        .route("/api/search", get(search))
        .route("/api/opponents", get(get_opponents))
        .route("/api/pick", post(pick))
        .route("/api/unavailable", post(mark_unavailable))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on `127.0.0.1:{port}` until `shutdown` resolves.
pub async fn serve(
    state: ApiState,
    port: u16,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    use anyhow::Context;

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind HTTP server on port {port}"))?;
    let addr = listener.local_addr()?;
    info!("HTTP API listening on http://{addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")?;
    Ok(())
}
