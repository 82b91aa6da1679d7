use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, instrument, warn};

use super::{
    dto::{ProductDetail, ProductSummary},
    flags::{eco_impact_label, DerivedFlags},
};
use crate::{errors::AppError, external::BestEffort, state::AppState};

pub const DEFAULT_SEARCH_LIMIT: u32 = 10;
pub const MAX_SEARCH_LIMIT: u32 = 50;
pub const MAX_QUERY_LEN: usize = 200;
pub const BARCODE_FORMAT_MESSAGE: &str = "Barcode must be 1 to 32 digits.";

pub(crate) fn is_valid_barcode(barcode: &str) -> bool {
    lazy_static! {
        static ref BARCODE_RE: Regex = Regex::new(r"^[0-9]{1,32}$").unwrap();
    }
    BARCODE_RE.is_match(barcode)
}

/// Missing, non-numeric and zero limits fall back to the default; the rest
/// are capped.
pub fn search_limit(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .min(MAX_SEARCH_LIMIT)
}

/// Free-text product search. The query is validated before any upstream call.
#[instrument(skip(st))]
pub async fn search_products(
    st: &AppState,
    query: &str,
    limit: u32,
) -> Result<Vec<ProductSummary>, AppError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::invalid_input("Query parameter 'q' is required."));
    }
    if query.chars().count() > MAX_QUERY_LEN {
        return Err(AppError::invalid_input(format!(
            "Query parameter 'q' must be at most {MAX_QUERY_LEN} characters."
        )));
    }

    let products = st
        .products
        .search_by_text(query, limit.clamp(1, MAX_SEARCH_LIMIT))
        .await?;
    Ok(products.into_iter().map(ProductSummary::from).collect())
}

/// Product record with nutrient detail (when available) and derived flags.
#[instrument(skip(st))]
pub async fn product_detail(st: &AppState, barcode: &str) -> Result<ProductDetail, AppError> {
    if !is_valid_barcode(barcode) {
        return Err(AppError::invalid_input(BARCODE_FORMAT_MESSAGE));
    }

    let product = st
        .products
        .get_by_barcode(barcode)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found in Open Food Facts."))?;

    let usda_detail = match st.nutrients.get_by_name(&product.name).await {
        BestEffort::Found(detail) => Some(detail),
        BestEffort::Absent => {
            debug!(name = %product.name, "no nutrient detail");
            None
        }
        BestEffort::Failed(reason) => {
            warn!(name = %product.name, %reason, "USDA lookup failed");
            None
        }
    };

    let flags = DerivedFlags::compute(&product, &st.config.flags);

    Ok(ProductDetail {
        eco_score_label: eco_impact_label(product.eco_score),
        barcode: product.barcode,
        name: product.name,
        brand: product.brand,
        nutri_score: product.nutri_score,
        eco_score: product.eco_score,
        image_url: product.image_url,
        ingredients_text: product.ingredients_text,
        allergens: product.allergens,
        off_nutriments: product.nutriments,
        usda_detail,
        flags,
    })
}
