use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use tracing::{instrument, warn};

use super::{
    dto::{ProductDetail, ProductSummary, SearchParams},
    services::{product_detail, search_limit, search_products, BARCODE_FORMAT_MESSAGE},
};
use crate::{errors::AppError, state::AppState};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products/search", get(search))
        .route("/products/:barcode", get(get_product))
}

#[instrument(skip(state, params))]
pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<ProductSummary>>, AppError> {
    let Query(params) = params.map_err(|e| {
        warn!(error = %e, "malformed search query string");
        AppError::invalid_input("Invalid query string")
    })?;
    let query = params.q.unwrap_or_default();
    let limit = search_limit(params.limit.as_deref());
    search_products(&state, &query, limit).await.map(Json)
}

#[instrument(skip(state, barcode))]
pub async fn get_product(
    State(state): State<AppState>,
    barcode: Result<Path<String>, PathRejection>,
) -> Result<Json<ProductDetail>, AppError> {
    // Non-UTF-8 path segments never reach the barcode check.
    let Path(barcode) = barcode.map_err(|e| {
        warn!(error = %e, "malformed barcode path");
        AppError::invalid_input(BARCODE_FORMAT_MESSAGE)
    })?;
    product_detail(&state, &barcode).await.map(Json)
}
