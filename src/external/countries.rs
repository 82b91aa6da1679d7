use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::cache::TtlCache;

const CACHE_KEY: &str = "countries";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub code: String,
    pub name: String,
    pub region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCountry {
    cca2: Option<String>,
    name: Option<RawName>,
    region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawName {
    common: Option<String>,
}

/// Drops entries without a code or common name and sorts by name.
fn to_countries(raw: Vec<RawCountry>) -> Vec<Country> {
    let mut countries: Vec<Country> = raw
        .into_iter()
        .filter_map(|c| {
            let code = c.cca2.filter(|s| !s.is_empty())?;
            let name = c.name.and_then(|n| n.common).filter(|s| !s.is_empty())?;
            Some(Country {
                code,
                name,
                region: c.region.filter(|s| !s.is_empty()),
            })
        })
        .collect();
    countries.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
    countries
}

#[async_trait]
pub trait CountryDirectory: Send + Sync {
    /// Never fails; an unreachable directory yields an empty list.
    async fn list(&self) -> Vec<Country>;
}

#[derive(Clone)]
pub struct RestCountriesClient {
    http: reqwest::Client,
    url: String,
    cache: TtlCache,
    ttl: Duration,
}

impl RestCountriesClient {
    pub fn new(http: reqwest::Client, url: impl Into<String>, cache: TtlCache, ttl: Duration) -> Self {
        Self {
            http,
            url: url.into(),
            cache,
            ttl,
        }
    }

    async fn fetch(&self) -> anyhow::Result<Vec<Country>> {
        let raw: Vec<RawCountry> = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(to_countries(raw))
    }
}

#[async_trait]
impl CountryDirectory for RestCountriesClient {
    #[instrument(skip(self))]
    async fn list(&self) -> Vec<Country> {
        if let Some(hit) = self.cache.get::<Vec<Country>>(CACHE_KEY) {
            return hit;
        }

        match self.fetch().await {
            Ok(countries) => {
                self.cache.set_with_ttl(CACHE_KEY, &countries, self.ttl);
                countries
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "country directory unavailable");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn incomplete_entries_are_dropped_and_rest_sorted() {
        let raw: Vec<RawCountry> = serde_json::from_value(json!([
            { "cca2": "RW", "name": { "common": "Rwanda" }, "region": "Africa" },
            { "cca2": "", "name": { "common": "Nowhere" } },
            { "cca2": "XX" },
            { "cca2": "at", "name": { "common": "austria" }, "region": "" },
            { "cca2": "BE", "name": { "common": "Belgium" }, "region": "Europe" }
        ]))
        .unwrap();

        let countries = to_countries(raw);
        let names: Vec<&str> = countries.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["austria", "Belgium", "Rwanda"]);
        assert_eq!(countries[0].region, None);
        assert_eq!(countries[2].region.as_deref(), Some("Africa"));
    }
}
