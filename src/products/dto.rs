use serde::{Deserialize, Serialize};

use super::flags::DerivedFlags;
use crate::external::{Grade, NormalizedProduct, NutrientDetail, Nutriments};

/// Query string of `GET /products/search`. `limit` stays a string so a
/// malformed value falls back to the default instead of rejecting the request.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<String>,
}

/// Search result row: display fields plus the two nutriments used for sorting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub barcode: String,
    pub name: String,
    pub brand: String,
    pub nutri_score: Option<Grade>,
    pub eco_score: Option<Grade>,
    pub image_url: Option<String>,
    pub sugars_100g: Option<f64>,
    pub salt_100g: Option<f64>,
}

impl From<NormalizedProduct> for ProductSummary {
    fn from(p: NormalizedProduct) -> Self {
        Self {
            sugars_100g: p.nutriments.sugars_100g,
            salt_100g: p.nutriments.salt_100g,
            barcode: p.barcode,
            name: p.name,
            brand: p.brand,
            nutri_score: p.nutri_score,
            eco_score: p.eco_score,
            image_url: p.image_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    pub barcode: String,
    pub name: String,
    pub brand: String,
    pub nutri_score: Option<Grade>,
    pub eco_score: Option<Grade>,
    pub eco_score_label: Option<&'static str>,
    pub image_url: Option<String>,
    pub ingredients_text: String,
    pub allergens: Vec<String>,
    pub off_nutriments: Nutriments,
    pub usda_detail: Option<NutrientDetail>,
    pub flags: DerivedFlags,
}
