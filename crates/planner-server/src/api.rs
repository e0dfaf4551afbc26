use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use planner_shared::conflicts::{self, OverlapInfo, Suggestion};
use planner_shared::export;
use planner_shared::{
    Activity, ActivityId, OwnerId, Profile, ProfileUpdate, ScheduleDocument, ScheduleStore,
    WeekMap, Weekday,
};
use planner_store::{Account, Database, SavedSchedule, StoreError};

use crate::config::ServerConfig;
use crate::error::ServerError;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route("/schedules", get(list_schedules).post(create_schedule))
        .route(
            "/schedules/{id}",
            get(get_schedule).put(update_schedule).delete(delete_schedule),
        )
        .route("/schedules/{id}/calendar.ics", get(export_schedule))
        .route("/analyze", post(analyze))
        .route("/account", get(get_account).put(update_account))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ServerInfoResponse {
    name: String,
    version: &'static str,
    identity_header: String,
}

/// Body of `POST /schedules` and `PUT /schedules/{id}`.
#[derive(Deserialize)]
struct SaveScheduleRequest {
    name: String,
    #[serde(default)]
    activities: Vec<Activity>,
    #[serde(default)]
    schedule: WeekMap<Vec<Activity>>,
}

impl SaveScheduleRequest {
    fn into_parts(self) -> (String, ScheduleDocument) {
        (
            self.name,
            ScheduleDocument {
                activities: self.activities,
                schedule: self.schedule,
            },
        )
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest {
    #[serde(default)]
    activities: Vec<Activity>,
    #[serde(default)]
    schedule: WeekMap<Vec<Activity>>,
    /// Overrides the account's `suggestionsEnabled` preference.
    #[serde(default)]
    suggestions: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OverlapEntry {
    day: Weekday,
    activity_id: ActivityId,
    #[serde(flatten)]
    info: OverlapInfo,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponse {
    conflicts: WeekMap<BTreeSet<ActivityId>>,
    overlaps: Vec<OverlapEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestions: Option<Vec<Suggestion>>,
}

fn request_owner(headers: &HeaderMap, config: &ServerConfig) -> Result<OwnerId, ServerError> {
    headers
        .get(&config.identity_header)
        .and_then(|v| v.to_str().ok())
        .and_then(OwnerId::parse)
        .ok_or_else(|| ServerError::Unauthorized(config.identity_header.to_string()))
}

/// Ids that don't parse can't name a stored schedule.
fn parse_schedule_id(raw: &str) -> Result<Uuid, ServerError> {
    Uuid::parse_str(raw).map_err(|_| ServerError::NotFound)
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ServerError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ServerError::BadRequest(e.body_text()))
}

// ---------------------------------------------------------------------------
// Instance
// ---------------------------------------------------------------------------

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        identity_header: state.config.identity_header.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Saved schedules
// ---------------------------------------------------------------------------

async fn list_schedules(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<SavedSchedule>>, ServerError> {
    let owner = request_owner(&headers, &state.config)?;
    let schedules = state.db.lock().await.list_schedules(&owner)?;
    Ok(Json(schedules))
}

async fn create_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SaveScheduleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SavedSchedule>), ServerError> {
    let owner = request_owner(&headers, &state.config)?;
    let (name, document) = json_body(payload)?.into_parts();

    let saved = state
        .db
        .lock()
        .await
        .create_schedule(&owner, &name, &document)?;

    info!(id = %saved.id, owner = %owner, "schedule saved");
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn get_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<SavedSchedule>, ServerError> {
    let owner = request_owner(&headers, &state.config)?;
    let id = parse_schedule_id(&id)?;
    let saved = state.db.lock().await.get_schedule(id, &owner)?;
    Ok(Json(saved))
}

async fn update_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<SaveScheduleRequest>, JsonRejection>,
) -> Result<Json<SavedSchedule>, ServerError> {
    let owner = request_owner(&headers, &state.config)?;
    let id = parse_schedule_id(&id)?;
    let (name, document) = json_body(payload)?.into_parts();

    let saved = state
        .db
        .lock()
        .await
        .update_schedule(id, &owner, &name, &document)?;
    Ok(Json(saved))
}

async fn delete_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let owner = request_owner(&headers, &state.config)?;
    let id = parse_schedule_id(&id)?;

    if !state.db.lock().await.delete_schedule(id, &owner)? {
        return Err(ServerError::NotFound);
    }

    info!(%id, owner = %owner, "schedule deleted");
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn export_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let owner = request_owner(&headers, &state.config)?;
    let id = parse_schedule_id(&id)?;
    let saved = state.db.lock().await.get_schedule(id, &owner)?;

    let events = export::calendar_events(&saved.schedule, Local::now().naive_local());
    let body = export::to_ics(&events, Utc::now());

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"schedule.ics\"",
            ),
        ],
        body,
    ))
}

// ---------------------------------------------------------------------------
// Conflict analysis
// ---------------------------------------------------------------------------

async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ServerError> {
    let owner = request_owner(&headers, &state.config)?;
    let request = json_body(payload)?;

    let store = ScheduleStore::from_document(ScheduleDocument {
        activities: request.activities,
        schedule: request.schedule,
    })?;

    let want_suggestions = match request.suggestions {
        Some(explicit) => explicit,
        None => match state.db.lock().await.get_account(&owner) {
            Ok(account) => account.profile.suggestions_enabled,
            Err(StoreError::NotFound) => false,
            Err(e) => return Err(e.into()),
        },
    };

    let conflicts = store.conflicts();
    let overlaps = conflicts
        .iter()
        .flat_map(|(day, ids)| {
            let instances = store.day(day);
            ids.iter().filter_map(move |id| {
                conflicts::overlap_info(instances, id).map(|info| OverlapEntry {
                    day,
                    activity_id: id.clone(),
                    info,
                })
            })
        })
        .collect();

    Ok(Json(AnalyzeResponse {
        overlaps,
        suggestions: want_suggestions.then(|| store.suggestions()),
        conflicts,
    }))
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

async fn get_account(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Account>, ServerError> {
    let owner = request_owner(&headers, &state.config)?;
    let account = state.db.lock().await.get_account(&owner)?;
    Ok(Json(account))
}

/// Partial profile update; the first update creates the account.
async fn update_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<Account>, ServerError> {
    let owner = request_owner(&headers, &state.config)?;
    let update = json_body(payload)?;

    let db = state.db.lock().await;
    let account = match db.update_account(&owner, &update) {
        Err(StoreError::NotFound) => {
            let mut profile = Profile::new(owner.as_str(), "");
            profile.apply(&update);
            db.upsert_account(&owner, &profile)?
        }
        other => other?,
    };
    Ok(Json(account))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
