use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    pub off_base_url: String,
    pub off_user_agent: String,
    pub usda_base_url: String,
    /// Without a key the nutrient lookup is skipped entirely.
    pub usda_api_key: Option<String>,
    pub countries_url: String,
    pub timeout_secs: u64,
}

/// Thresholds for the derived health flags, in grams per 100 g of product.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FlagThresholds {
    pub high_sugar: f64,
    pub high_salt: f64,
}

impl Default for FlagThresholds {
    fn default() -> Self {
        Self {
            high_sugar: 22.5,
            high_salt: 1.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemoUser {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub upstream: UpstreamConfig,
    pub cache_ttl_secs: u64,
    pub countries_ttl_secs: u64,
    pub flags: FlagThresholds,
    pub demo_user: DemoUser,
    pub frontend_dir: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "labellens".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "labellens-users".into()),
            ttl_minutes: parsed("JWT_TTL_MINUTES", 60),
        };
        let upstream = UpstreamConfig {
            off_base_url: std::env::var("OFF_BASE_URL")
                .unwrap_or_else(|_| "https://world.openfoodfacts.net".into()),
            off_user_agent: std::env::var("OFF_USER_AGENT")
                .unwrap_or_else(|_| "LabelLens/1.0 (nutrition label lookup)".into()),
            usda_base_url: std::env::var("USDA_BASE_URL")
                .unwrap_or_else(|_| "https://api.nal.usda.gov/fdc/v1".into()),
            usda_api_key: std::env::var("USDA_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            countries_url: std::env::var("COUNTRIES_URL").unwrap_or_else(|_| {
                "https://restcountries.com/v3.1/all?fields=cca2,name,region".into()
            }),
            timeout_secs: parsed("UPSTREAM_TIMEOUT_SECS", 10),
        };
        let defaults = FlagThresholds::default();
        let flags = FlagThresholds {
            high_sugar: parsed("HIGH_SUGAR_G_PER_100G", defaults.high_sugar),
            high_salt: parsed("HIGH_SALT_G_PER_100G", defaults.high_salt),
        };
        let demo_user = DemoUser {
            username: std::env::var("DEMO_USERNAME").unwrap_or_else(|_| "demo".into()),
            password: std::env::var("DEMO_PASSWORD").unwrap_or_else(|_| "Password123!".into()),
        };

        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parsed("APP_PORT", 8080),
            jwt,
            upstream,
            cache_ttl_secs: parsed("CACHE_TTL_SECONDS", 300),
            countries_ttl_secs: parsed("COUNTRIES_TTL_SECONDS", 60 * 60 * 24),
            flags,
            demo_user,
            frontend_dir: std::env::var("FRONTEND_DIR").ok(),
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid APP_HOST/APP_PORT: {}:{}", self.host, self.port))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn countries_ttl(&self) -> Duration {
        Duration::from_secs(self.countries_ttl_secs)
    }

    /// Configuration used by tests: every upstream points at `base_url`.
    pub fn for_tests(base_url: &str) -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
            upstream: UpstreamConfig {
                off_base_url: base_url.into(),
                off_user_agent: "LabelLens-test/1.0".into(),
                usda_base_url: base_url.into(),
                usda_api_key: None,
                countries_url: format!("{base_url}/v3.1/all"),
                timeout_secs: 2,
            },
            cache_ttl_secs: 300,
            countries_ttl_secs: 300,
            flags: FlagThresholds::default(),
            demo_user: DemoUser {
                username: "demo".into(),
                password: "Password123!".into(),
            },
            frontend_dir: None,
        }
    }
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_combines_host_and_port() {
        let mut cfg = AppConfig::for_tests("http://127.0.0.1:9");
        cfg.port = 8080;
        assert_eq!(cfg.bind_addr().unwrap(), "127.0.0.1:8080".parse::<SocketAddr>().unwrap());

        cfg.host = "not a host".into();
        assert!(cfg.bind_addr().is_err());
    }

    #[test]
    fn test_config_points_every_upstream_at_one_server() {
        let cfg = AppConfig::for_tests("http://mock");
        assert_eq!(cfg.upstream.off_base_url, "http://mock");
        assert_eq!(cfg.upstream.usda_base_url, "http://mock");
        assert_eq!(cfg.upstream.countries_url, "http://mock/v3.1/all");
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(300));
    }
}
