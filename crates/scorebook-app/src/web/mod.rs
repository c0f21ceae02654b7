// HTTP surface: axum router over the store and the statistics engine.
//
// Endpoints:
// - `GET  /health`
// - `GET  /players`, `POST /players`
// - `GET  /batting`, `POST /batting`
// - `POST /delete_record/:id`
// - `GET  /summary`, `GET /summary.csv`
// - `GET  /players/:number/records?start=&end=`
// - `GET  /policy`

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::Mutex;

use scorebook_core::ClassificationPolicy;

use crate::db::Database;

/// Shared state handed to every handler.
pub struct AppState {
    pub db: Database,
    pub policy: ClassificationPolicy,
    pub team_name: String,
    /// Held across read-compute-append so that two submissions cannot both
    /// compute a running average from the same prior log.
    pub record_lock: Mutex<()>,
}

impl AppState {
    pub fn new(db: Database, policy: ClassificationPolicy, team_name: impl Into<String>) -> Self {
        Self {
            db,
            policy,
            team_name: team_name.into(),
            record_lock: Mutex::new(()),
        }
    }
}

/// Create the router with all endpoints.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/players", get(handlers::list_players).post(handlers::add_player))
        .route(
            "/players/:number/records",
            get(handlers::personal_records),
        )
        .route(
            "/batting",
            get(handlers::batting_page).post(handlers::record_batting),
        )
        .route("/delete_record/:id", post(handlers::delete_record))
        .route("/summary", get(handlers::summary))
        .route("/summary.csv", get(handlers::summary_csv))
        .route("/policy", get(handlers::active_policy))
        .with_state(state)
}
