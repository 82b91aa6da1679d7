use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::instrument;

use crate::{external::Country, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/meta/countries", get(countries))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "app": "LabelLens backend" }))
}

/// Always 200; an unreachable directory yields `[]`.
#[instrument(skip(state))]
async fn countries(State(state): State<AppState>) -> Json<Vec<Country>> {
    Json(state.countries.list().await)
}
