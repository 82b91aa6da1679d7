//! Open Food Facts client.
//!
//! Upstream payloads are loosely typed: the same field can be missing, null,
//! an empty string, a number where a string is expected, or spelled several
//! ways. They are deserialized into [`RawProduct`], whose fields stay as
//! `serde_json::Value`, and [`normalize`] maps that into a [`NormalizedProduct`]
//! with every fallback spelled out below.

use std::collections::BTreeSet;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::{cache::TtlCache, config::UpstreamConfig, errors::AppError};

const UPSTREAM: &str = "Open Food Facts";

pub const UNKNOWN_PRODUCT: &str = "Unknown product";
pub const UNKNOWN_BRAND: &str = "Unknown brand";

/// Fields requested from the product endpoints.
const FIELDS: &[&str] = &[
    "code",
    "product_name",
    "generic_name",
    "brands",
    "nutriscore_grade",
    "ecoscore_grade",
    "image_front_small_url",
    "image_url",
    "nutriments",
    "ingredients_text",
    "allergens_hierarchy",
    "ingredients_analysis_tags",
];

// Upstream key spellings, first present wins.
const NAME_KEYS: &[&str] = &["product_name", "generic_name"];
const IMAGE_KEYS: &[&str] = &["image_front_small_url", "image_url"];
const ENERGY_KCAL_KEYS: &[&str] = &["energy-kcal_100g", "energy-kcal"];
const FAT_KEYS: &[&str] = &["fat_100g"];
const SATURATED_FAT_KEYS: &[&str] = &["saturated-fat_100g"];
const CARBS_KEYS: &[&str] = &["carbohydrates_100g"];
const SUGARS_KEYS: &[&str] = &["sugars_100g"];
const FIBER_KEYS: &[&str] = &["fiber_100g"];
const PROTEIN_KEYS: &[&str] = &["proteins_100g"];
const SALT_KEYS: &[&str] = &["salt_100g"];

/// Nutri-Score / Eco-Score letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
}

impl Grade {
    /// Parses a single grade letter. Upstream placeholders such as
    /// `"unknown"` or `"not-applicable"` are not grades.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "a" => Some(Grade::A),
            "b" => Some(Grade::B),
            "c" => Some(Grade::C),
            "d" => Some(Grade::D),
            "e" => Some(Grade::E),
            _ => None,
        }
    }
}

/// Per-100 g nutrient values. `None` means "not reported", never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutriments {
    pub energy_kcal_100g: Option<f64>,
    pub fat_100g: Option<f64>,
    pub saturated_fat_100g: Option<f64>,
    pub carbs_100g: Option<f64>,
    pub sugars_100g: Option<f64>,
    pub fiber_100g: Option<f64>,
    pub protein_100g: Option<f64>,
    pub salt_100g: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedProduct {
    pub barcode: String,
    pub name: String,
    pub brand: String,
    pub nutri_score: Option<Grade>,
    pub eco_score: Option<Grade>,
    pub image_url: Option<String>,
    pub ingredients_text: String,
    pub allergens: Vec<String>,
    pub ingredients_analysis_tags: BTreeSet<String>,
    pub nutriments: Nutriments,
}

/// A product as it arrives from Open Food Facts, before any defaults apply.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawProduct {
    pub code: Option<Value>,
    pub product_name: Option<Value>,
    pub generic_name: Option<Value>,
    pub brands: Option<Value>,
    pub nutriscore_grade: Option<Value>,
    pub ecoscore_grade: Option<Value>,
    pub image_front_small_url: Option<Value>,
    pub image_url: Option<Value>,
    pub ingredients_text: Option<Value>,
    pub allergens_hierarchy: Option<Value>,
    pub ingredients_analysis_tags: Option<Value>,
    pub nutriments: Option<Value>,
}

impl RawProduct {
    fn field(&self, key: &str) -> Option<&Value> {
        let v = match key {
            "product_name" => &self.product_name,
            "generic_name" => &self.generic_name,
            "image_front_small_url" => &self.image_front_small_url,
            "image_url" => &self.image_url,
            _ => &None,
        };
        v.as_ref()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    products: Vec<RawProduct>,
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    product: Option<RawProduct>,
}

impl ProductResponse {
    fn is_found(&self) -> bool {
        match &self.status {
            Some(Value::Number(n)) => n.as_i64() == Some(1),
            Some(Value::String(s)) => s == "1" || s == "success",
            _ => false,
        }
    }
}

/// Maps a raw upstream product into the canonical record.
///
/// | field | source | fallback |
/// |---|---|---|
/// | barcode | `code` | `fallback_barcode`, else the product is dropped |
/// | name | `product_name`, `generic_name` | `"Unknown product"` |
/// | brand | `brands` | `"Unknown brand"` |
/// | nutri/eco score | `nutriscore_grade` / `ecoscore_grade` | `None` |
/// | image | `image_front_small_url`, `image_url` | `None` |
/// | ingredients | `ingredients_text` | `""` |
/// | allergens / tags | `allergens_hierarchy` / `ingredients_analysis_tags` | empty |
/// | nutriments | see the `*_KEYS` tables | `None` |
pub fn normalize(raw: &RawProduct, fallback_barcode: Option<&str>) -> Option<NormalizedProduct> {
    let barcode = raw
        .code
        .as_ref()
        .and_then(identifier)
        .or_else(|| fallback_barcode.map(str::to_string))
        .filter(|b| !b.is_empty())?;

    let empty = Map::new();
    let nutr = raw
        .nutriments
        .as_ref()
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    Some(NormalizedProduct {
        barcode,
        name: NAME_KEYS
            .iter()
            .find_map(|k| raw.field(k).and_then(text))
            .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
        brand: raw
            .brands
            .as_ref()
            .and_then(text)
            .unwrap_or_else(|| UNKNOWN_BRAND.to_string()),
        nutri_score: raw
            .nutriscore_grade
            .as_ref()
            .and_then(Value::as_str)
            .and_then(Grade::parse),
        eco_score: raw
            .ecoscore_grade
            .as_ref()
            .and_then(Value::as_str)
            .and_then(Grade::parse),
        image_url: IMAGE_KEYS.iter().find_map(|k| raw.field(k).and_then(text)),
        ingredients_text: raw
            .ingredients_text
            .as_ref()
            .and_then(text)
            .unwrap_or_default(),
        allergens: string_list(raw.allergens_hierarchy.as_ref()),
        ingredients_analysis_tags: string_list(raw.ingredients_analysis_tags.as_ref())
            .into_iter()
            .collect(),
        nutriments: Nutriments {
            energy_kcal_100g: amount(nutr, ENERGY_KCAL_KEYS),
            fat_100g: amount(nutr, FAT_KEYS),
            saturated_fat_100g: amount(nutr, SATURATED_FAT_KEYS),
            carbs_100g: amount(nutr, CARBS_KEYS),
            sugars_100g: amount(nutr, SUGARS_KEYS),
            fiber_100g: amount(nutr, FIBER_KEYS),
            protein_100g: amount(nutr, PROTEIN_KEYS),
            salt_100g: amount(nutr, SALT_KEYS),
        },
    })
}

/// Non-empty string after trimming.
fn text(v: &Value) -> Option<String> {
    v.as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Barcodes come back as strings, and occasionally as bare numbers.
fn identifier(v: &Value) -> Option<String> {
    match v {
        Value::Number(n) => n.as_u64().map(|n| n.to_string()),
        other => text(other),
    }
}

fn string_list(v: Option<&Value>) -> Vec<String> {
    v.and_then(Value::as_array)
        .map(|items| items.iter().filter_map(text).collect())
        .unwrap_or_default()
}

/// First key that is present and non-null decides; an unusable value there
/// (negative, non-finite, not numeric) yields `None` rather than a later key.
fn amount(nutr: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    let value = keys
        .iter()
        .filter_map(|k| nutr.get(*k))
        .find(|v| !v.is_null())?;
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (n.is_finite() && n >= 0.0).then_some(n)
}

#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Free-text search. Products without a barcode are left out.
    async fn search_by_text(&self, query: &str, limit: u32) -> Result<Vec<NormalizedProduct>, AppError>;

    /// `Ok(None)` when the database says the product does not exist.
    async fn get_by_barcode(&self, barcode: &str) -> Result<Option<NormalizedProduct>, AppError>;
}

#[derive(Clone)]
pub struct OpenFoodFactsClient {
    http: reqwest::Client,
    base_url: String,
    user_agent: String,
    cache: TtlCache,
}

impl OpenFoodFactsClient {
    pub fn new(http: reqwest::Client, cfg: &UpstreamConfig, cache: TtlCache) -> Self {
        Self {
            http,
            base_url: cfg.off_base_url.trim_end_matches('/').to_string(),
            user_agent: cfg.off_user_agent.clone(),
            cache,
        }
    }

    async fn fetch(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response, AppError> {
        self.http
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::lookup(UPSTREAM, e))
    }
}

#[async_trait]
impl ProductSource for OpenFoodFactsClient {
    #[instrument(skip(self))]
    async fn search_by_text(&self, query: &str, limit: u32) -> Result<Vec<NormalizedProduct>, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::invalid_input("Search query cannot be empty"));
        }

        let cache_key = format!("search:{query}:{limit}");
        if let Some(hit) = self.cache.get::<Vec<NormalizedProduct>>(&cache_key) {
            return Ok(hit);
        }

        let url = format!("{}/cgi/search.pl", self.base_url);
        let response = self
            .fetch(
                &url,
                &[
                    ("search_terms", query.to_string()),
                    ("search_simple", "1".into()),
                    ("action", "process".into()),
                    ("json", "1".into()),
                    ("page_size", limit.to_string()),
                    ("fields", FIELDS.join(",")),
                ],
            )
            .await?;

        if !response.status().is_success() {
            return Err(AppError::lookup(UPSTREAM, format!("HTTP {}", response.status())));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::lookup(UPSTREAM, format!("JSON parse error: {e}")))?;

        let upstream_count = body.products.len();
        let products: Vec<NormalizedProduct> = body
            .products
            .iter()
            .filter_map(|p| normalize(p, None))
            .collect();
        debug!(upstream_count, kept = products.len(), "search normalized");

        self.cache.set(cache_key, &products);
        Ok(products)
    }

    #[instrument(skip(self))]
    async fn get_by_barcode(&self, barcode: &str) -> Result<Option<NormalizedProduct>, AppError> {
        let cache_key = format!("product:{barcode}");
        if let Some(hit) = self.cache.get::<NormalizedProduct>(&cache_key) {
            return Ok(Some(hit));
        }

        let url = format!("{}/api/v2/product/{barcode}", self.base_url);
        let response = self.fetch(&url, &[("fields", FIELDS.join(","))]).await?;

        // v2 answers unknown barcodes with a 404 and `status: 0`.
        if response.status() == StatusCode::NOT_FOUND {
            debug!("product unknown upstream");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AppError::lookup(UPSTREAM, format!("HTTP {}", response.status())));
        }

        let body: ProductResponse = response
            .json()
            .await
            .map_err(|e| AppError::lookup(UPSTREAM, format!("JSON parse error: {e}")))?;

        if !body.is_found() {
            debug!("product unknown upstream");
            return Ok(None);
        }

        let Some(product) = body.product.as_ref().and_then(|p| normalize(p, Some(barcode))) else {
            return Ok(None);
        };

        self.cache.set(cache_key, &product);
        Ok(Some(product))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: Value) -> RawProduct {
        serde_json::from_value(v).expect("raw product")
    }

    #[test]
    fn empty_product_gets_every_default() {
        let p = normalize(&RawProduct::default(), Some("123")).expect("has barcode");
        assert_eq!(p.barcode, "123");
        assert_eq!(p.name, UNKNOWN_PRODUCT);
        assert_eq!(p.brand, UNKNOWN_BRAND);
        assert_eq!(p.nutri_score, None);
        assert_eq!(p.eco_score, None);
        assert_eq!(p.image_url, None);
        assert_eq!(p.ingredients_text, "");
        assert!(p.allergens.is_empty());
        assert!(p.ingredients_analysis_tags.is_empty());
        assert_eq!(p.nutriments, Nutriments::default());
    }

    #[test]
    fn product_without_any_barcode_is_dropped() {
        let p = raw(json!({ "product_name": "Mystery" }));
        assert!(normalize(&p, None).is_none());
        let p = raw(json!({ "code": "", "product_name": "Mystery" }));
        assert!(normalize(&p, None).is_none());
    }

    #[test]
    fn numeric_code_is_accepted() {
        let p = raw(json!({ "code": 3017620422003_u64 }));
        assert_eq!(normalize(&p, None).unwrap().barcode, "3017620422003");
    }

    #[test]
    fn name_and_image_fall_back_in_order() {
        let p = raw(json!({
            "code": "1",
            "product_name": "",
            "generic_name": "Hazelnut spread",
            "image_url": "https://img/large.jpg"
        }));
        let p = normalize(&p, None).unwrap();
        assert_eq!(p.name, "Hazelnut spread");
        assert_eq!(p.image_url.as_deref(), Some("https://img/large.jpg"));

        let p = raw(json!({
            "code": "1",
            "image_front_small_url": "https://img/small.jpg",
            "image_url": "https://img/large.jpg"
        }));
        assert_eq!(
            normalize(&p, None).unwrap().image_url.as_deref(),
            Some("https://img/small.jpg")
        );
    }

    #[test]
    fn grades_outside_a_to_e_are_unknown() {
        let p = raw(json!({
            "code": "1",
            "nutriscore_grade": "E",
            "ecoscore_grade": "not-applicable"
        }));
        let p = normalize(&p, None).unwrap();
        assert_eq!(p.nutri_score, Some(Grade::E));
        assert_eq!(p.eco_score, None);
    }

    #[test]
    fn energy_prefers_per_100g_spelling() {
        let p = raw(json!({
            "code": "1",
            "nutriments": { "energy-kcal": 100, "energy-kcal_100g": 539 }
        }));
        assert_eq!(normalize(&p, None).unwrap().nutriments.energy_kcal_100g, Some(539.0));

        let p = raw(json!({
            "code": "1",
            "nutriments": { "energy-kcal_100g": null, "energy-kcal": 100 }
        }));
        assert_eq!(normalize(&p, None).unwrap().nutriments.energy_kcal_100g, Some(100.0));
    }

    #[test]
    fn nutriment_values_are_validated_not_zeroed() {
        let p = raw(json!({
            "code": "1",
            "nutriments": {
                "sugars_100g": "57.5",
                "salt_100g": -1,
                "fat_100g": "n/a",
                "proteins_100g": 0
            }
        }));
        let n = normalize(&p, None).unwrap().nutriments;
        assert_eq!(n.sugars_100g, Some(57.5));
        assert_eq!(n.salt_100g, None);
        assert_eq!(n.fat_100g, None);
        assert_eq!(n.protein_100g, Some(0.0));
        assert_eq!(n.fiber_100g, None);
    }

    #[test]
    fn tag_lists_skip_non_strings() {
        let p = raw(json!({
            "code": "1",
            "allergens_hierarchy": ["en:milk", 7, "en:nuts"],
            "ingredients_analysis_tags": ["en:vegan", "en:vegan", "en:palm-oil-free"]
        }));
        let p = normalize(&p, None).unwrap();
        assert_eq!(p.allergens, vec!["en:milk", "en:nuts"]);
        assert_eq!(p.ingredients_analysis_tags.len(), 2);
        assert!(p.ingredients_analysis_tags.contains("en:vegan"));
    }

    #[test]
    fn serialized_field_names_match_the_api() {
        let p = normalize(&RawProduct::default(), Some("1")).unwrap();
        let v = serde_json::to_value(&p).unwrap();
        for key in ["barcode", "nutriScore", "ecoScore", "imageUrl", "ingredientsText", "allergens"] {
            assert!(v.get(key).is_some(), "missing {key}");
        }
        let n = &v["nutriments"];
        for key in [
            "energyKcal100g",
            "fat100g",
            "saturatedFat100g",
            "carbs100g",
            "sugars100g",
            "fiber100g",
            "protein100g",
            "salt100g",
        ] {
            assert!(n.get(key).is_some_and(Value::is_null), "{key} should be null");
        }
    }

    #[test]
    fn product_status_accepts_numeric_and_textual_success() {
        let found: ProductResponse = serde_json::from_value(json!({ "status": 1 })).unwrap();
        assert!(found.is_found());
        let found: ProductResponse = serde_json::from_value(json!({ "status": "success" })).unwrap();
        assert!(found.is_found());
        let missing: ProductResponse =
            serde_json::from_value(json!({ "status": 0, "status_verbose": "product not found" }))
                .unwrap();
        assert!(!missing.is_found());
    }
}
