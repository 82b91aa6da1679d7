//! USDA FoodData Central client.
//!
//! Only the first search hit for a product name is used. This upstream is
//! optional: no API key means no call, and every failure is reported as
//! [`BestEffort::Failed`] instead of an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::BestEffort;
use crate::{cache::TtlCache, config::UpstreamConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nutrient {
    pub name: String,
    pub unit: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientDetail {
    /// FoodData Central id.
    #[serde(rename = "fdcId")]
    pub source_id: u64,
    pub description: String,
    pub data_type: String,
    pub nutrients: Vec<Nutrient>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<FoodResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FoodResponse {
    fdc_id: u64,
    #[serde(default)]
    description: String,
    #[serde(default)]
    data_type: String,
    #[serde(default)]
    food_nutrients: Vec<FoodNutrientResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FoodNutrientResponse {
    nutrient_name: Option<String>,
    unit_name: Option<String>,
    value: Option<f64>,
}

impl From<FoodResponse> for NutrientDetail {
    fn from(food: FoodResponse) -> Self {
        let nutrients = food
            .food_nutrients
            .into_iter()
            .filter_map(|n| {
                Some(Nutrient {
                    name: n.nutrient_name?,
                    unit: n.unit_name.unwrap_or_default(),
                    amount: n.value?,
                })
            })
            .collect();

        Self {
            source_id: food.fdc_id,
            description: food.description,
            data_type: food.data_type,
            nutrients,
        }
    }
}

#[async_trait]
pub trait NutrientSource: Send + Sync {
    async fn get_by_name(&self, name: &str) -> BestEffort<NutrientDetail>;
}

#[derive(Clone)]
pub struct UsdaClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    cache: TtlCache,
}

impl UsdaClient {
    pub fn new(http: reqwest::Client, cfg: &UpstreamConfig, cache: TtlCache) -> Self {
        Self {
            http,
            base_url: cfg.usda_base_url.trim_end_matches('/').to_string(),
            api_key: cfg.usda_api_key.clone(),
            cache,
        }
    }

    async fn search_first(&self, api_key: &str, name: &str) -> anyhow::Result<Option<NutrientDetail>> {
        let url = format!("{}/foods/search", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("api_key", api_key), ("query", name), ("pageSize", "1")])
            .send()
            .await?
            .error_for_status()?;

        let body: SearchResponse = response.json().await?;
        Ok(body.foods.into_iter().next().map(NutrientDetail::from))
    }
}

#[async_trait]
impl NutrientSource for UsdaClient {
    #[instrument(skip(self))]
    async fn get_by_name(&self, name: &str) -> BestEffort<NutrientDetail> {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("USDA_API_KEY not set, skipping nutrient lookup");
            return BestEffort::Absent;
        };

        let cache_key = format!("nutrient:{name}");
        if let Some(hit) = self.cache.get::<NutrientDetail>(&cache_key) {
            return BestEffort::Found(hit);
        }

        match self.search_first(api_key, name).await {
            Ok(Some(detail)) => {
                self.cache.set(cache_key, &detail);
                BestEffort::Found(detail)
            }
            Ok(None) => BestEffort::Absent,
            Err(e) => BestEffort::Failed(format!("{e:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nutrient_rows_without_name_or_value_are_skipped() {
        let food: FoodResponse = serde_json::from_value(json!({
            "fdcId": 2041155,
            "description": "NUTELLA",
            "dataType": "Branded",
            "foodNutrients": [
                { "nutrientName": "Protein", "unitName": "G", "value": 5.41 },
                { "nutrientName": "Sugars, total", "unitName": "G" },
                { "unitName": "KCAL", "value": 541.0 },
                { "nutrientName": "Sodium, Na", "value": 41.0 }
            ]
        }))
        .unwrap();

        let detail = NutrientDetail::from(food);
        assert_eq!(detail.source_id, 2041155);
        assert_eq!(detail.nutrients.len(), 2);
        assert_eq!(detail.nutrients[0].name, "Protein");
        assert_eq!(detail.nutrients[1].unit, "");
    }

    #[test]
    fn detail_serializes_with_fdc_id() {
        let detail = NutrientDetail {
            source_id: 1,
            description: "Apple".into(),
            data_type: "Foundation".into(),
            nutrients: vec![],
        };
        let v = serde_json::to_value(&detail).unwrap();
        assert_eq!(v["fdcId"], 1);
        assert_eq!(v["dataType"], "Foundation");
    }

    #[tokio::test]
    async fn missing_api_key_skips_the_call() {
        let cfg = crate::config::AppConfig::for_tests("http://127.0.0.1:9");
        let client = UsdaClient::new(
            reqwest::Client::new(),
            &cfg.upstream,
            TtlCache::new(cfg.cache_ttl()),
        );
        assert_eq!(client.get_by_name("Nutella").await, BestEffort::Absent);
    }
}
