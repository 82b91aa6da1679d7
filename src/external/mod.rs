//! Clients for the third-party services the backend reads from.

use std::time::Duration;

use anyhow::Context;

use crate::config::UpstreamConfig;

pub mod countries;
pub mod open_food_facts;
pub mod usda;

pub use countries::{Country, CountryDirectory, RestCountriesClient};
pub use open_food_facts::{Grade, NormalizedProduct, Nutriments, OpenFoodFactsClient, ProductSource};
pub use usda::{Nutrient, NutrientDetail, NutrientSource, UsdaClient};

/// Outcome of a lookup against an optional upstream.
///
/// `Failed` carries the reason for logging only; callers are expected to
/// collapse it to "absent" rather than propagate it.
#[derive(Debug, Clone, PartialEq)]
pub enum BestEffort<T> {
    Found(T),
    Absent,
    Failed(String),
}

impl<T> BestEffort<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            BestEffort::Found(v) => Some(v),
            BestEffort::Absent | BestEffort::Failed(_) => None,
        }
    }
}

/// Shared HTTP client: one connection pool, one per-call timeout, no retries.
pub fn http_client(cfg: &UpstreamConfig) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .build()
        .context("build http client")
}
