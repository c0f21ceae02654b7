// Route handlers: load from the store, hand off to the engine, return JSON.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use scorebook_core::{
    batting_log, compute_summary, personal_window, player_name_for, record_event, BattingEvent,
    ClassificationPolicy, EventDraft, EventId, PersonalWindow, Player, PlayerStatLine,
    PolicyVersion, Registration,
};

use super::error::ApiError;
use super::AppState;
use crate::legacy::export_summary_csv;

type ApiResult<T> = Result<T, ApiError>;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct NewPlayer {
    pub number: String,
    pub name: String,
}

/// Everything the batting form needs: roster, the log newest first, and
/// today's date as the default game date.
#[derive(Debug, Serialize)]
pub struct BattingPage {
    pub today: NaiveDate,
    pub players: Vec<Player>,
    pub records: Vec<BattingEvent>,
}

#[derive(Debug, Serialize)]
pub struct SummaryPage {
    pub team: String,
    pub policy: PolicyVersion,
    pub stats: Vec<PlayerStatLine>,
}

#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /players
pub async fn list_players(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Player>>> {
    Ok(Json(state.db.list_players()?))
}

/// POST /players
pub async fn add_player(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewPlayer>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Player>)> {
    let Json(new) = payload.map_err(|e| ApiError::InvalidInput(e.body_text()))?;
    let number = new.number.trim();
    if number.is_empty() {
        return Err(ApiError::InvalidInput("player number must not be empty".into()));
    }

    let player = Player::new(number, new.name.trim());
    match state.db.add_player(&player)? {
        Registration::Added => {
            info!("Registered player {} ({})", player.number, player.name);
            Ok((StatusCode::CREATED, Json(player)))
        }
        Registration::AlreadyExists => Err(ApiError::AlreadyExists(player.number)),
    }
}

/// GET /batting
pub async fn batting_page(State(state): State<Arc<AppState>>) -> ApiResult<Json<BattingPage>> {
    let players = state.db.list_players()?;
    let events = state.db.list_events()?;
    Ok(Json(BattingPage {
        today: chrono::Local::now().date_naive(),
        players,
        records: batting_log(&events).into_iter().cloned().collect(),
    }))
}

/// POST /batting
pub async fn record_batting(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EventDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BattingEvent>)> {
    let Json(mut draft) = payload.map_err(|e| ApiError::InvalidInput(e.body_text()))?;
    draft.player_number = draft.player_number.trim().to_string();
    if draft.player_number.is_empty() {
        return Err(ApiError::InvalidInput("player number must not be empty".into()));
    }

    let _guard = state.record_lock.lock().await;
    let players = state.db.list_players()?;
    let prior = state.db.list_events()?;
    let pending = record_event(&state.policy, &players, &prior, draft);
    let stored = state.db.append_event(pending)?;

    debug!(
        id = %stored.id,
        player = %stored.player_number,
        average = %stored.running_average,
        "stored batting record"
    );
    Ok((StatusCode::CREATED, Json(stored)))
}

/// POST /delete_record/:id
pub async fn delete_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let id = EventId(id);
    if state.db.delete_event(id)? {
        info!("Deleted batting record {id}");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(id))
    }
}

/// GET /summary
pub async fn summary(State(state): State<Arc<AppState>>) -> ApiResult<Json<SummaryPage>> {
    let stats = load_summary(&state)?;
    Ok(Json(SummaryPage {
        team: state.team_name.clone(),
        policy: state.policy.version(),
        stats,
    }))
}

/// GET /summary.csv
pub async fn summary_csv(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let stats = load_summary(&state)?;
    let mut buf = Vec::new();
    export_summary_csv(&stats, &mut buf).map_err(anyhow::Error::from)?;
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], buf))
}

/// GET /players/:number/records?start=YYYY-MM-DD&end=YYYY-MM-DD
pub async fn personal_records(
    State(state): State<Arc<AppState>>,
    Path(number): Path<String>,
    params: Result<Query<RangeParams>, QueryRejection>,
) -> ApiResult<Json<PersonalWindow>> {
    let Query(range) = params.map_err(|e| ApiError::InvalidInput(e.body_text()))?;
    let players = state.db.list_players()?;
    let events = state.db.list_events()?;

    let player = Player::new(number.as_str(), player_name_for(&players, &number));

    Ok(Json(personal_window(
        &state.policy,
        &player,
        range.start,
        range.end,
        &events,
    )))
}

/// GET /policy
pub async fn active_policy(State(state): State<Arc<AppState>>) -> Json<ClassificationPolicy> {
    Json(state.policy.clone())
}

fn load_summary(state: &AppState) -> ApiResult<Vec<PlayerStatLine>> {
    let players = state.db.list_players()?;
    let events = state.db.list_events()?;
    Ok(compute_summary(&state.policy, &players, &events))
}
