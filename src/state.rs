use std::sync::Arc;

use crate::auth::UserStore;
use crate::cache::TtlCache;
use crate::config::AppConfig;
use crate::external::{
    http_client, CountryDirectory, NutrientSource, OpenFoodFactsClient, ProductSource,
    RestCountriesClient, UsdaClient,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub products: Arc<dyn ProductSource>,
    pub nutrients: Arc<dyn NutrientSource>,
    pub countries: Arc<dyn CountryDirectory>,
    pub users: Arc<UserStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        Self::from_config(config)
    }

    /// Wires the real upstream clients around one shared cache.
    pub fn from_config(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let http = http_client(&config.upstream)?;
        let cache = TtlCache::new(config.cache_ttl());

        let products = Arc::new(OpenFoodFactsClient::new(
            http.clone(),
            &config.upstream,
            cache.clone(),
        )) as Arc<dyn ProductSource>;
        let nutrients = Arc::new(UsdaClient::new(
            http.clone(),
            &config.upstream,
            cache.clone(),
        )) as Arc<dyn NutrientSource>;
        let countries = Arc::new(RestCountriesClient::new(
            http,
            config.upstream.countries_url.clone(),
            cache,
            config.countries_ttl(),
        )) as Arc<dyn CountryDirectory>;

        let users = Arc::new(UserStore::with_demo_user(&config.demo_user)?);
        if config.upstream.usda_api_key.is_none() {
            tracing::warn!("USDA_API_KEY not set; nutrient detail will be omitted");
        }

        Ok(Self::from_parts(config, products, nutrients, countries, users))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        products: Arc<dyn ProductSource>,
        nutrients: Arc<dyn NutrientSource>,
        countries: Arc<dyn CountryDirectory>,
        users: Arc<UserStore>,
    ) -> Self {
        Self {
            config,
            products,
            nutrients,
            countries,
            users,
        }
    }
}
