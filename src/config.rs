//! Configuration loader: defaults, then `.env`, then process environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CACHE_PATH, DEFAULT_CITIES, DEFAULT_HOST, DEFAULT_MAX_CACHE_SECONDS, DEFAULT_PORT,
    DEFAULT_UPSTREAM_TIMEOUT_SECS, UV_API_BASE, WEATHER_API_BASE,
};
use crate::error::{Result, WeatherError};

#[derive(Debug, Clone)]
pub struct Config {
    pub weather_token: Option<String>,
    pub uv_token: Option<String>,
    pub cache_path: PathBuf,
    pub max_cache_seconds: i64,
    pub allowed_cities: Vec<String>,
    pub weather_api_base: String,
    pub uv_api_base: String,
    pub upstream_timeout: Duration,
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weather_token: None,
            uv_token: None,
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            max_cache_seconds: DEFAULT_MAX_CACHE_SECONDS,
            allowed_cities: DEFAULT_CITIES.iter().map(|c| c.to_string()).collect(),
            weather_api_base: WEATHER_API_BASE.to_string(),
            uv_api_base: UV_API_BASE.to_string(),
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Loads `.env` if present and reads the process environment
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        config.weather_token = var("WEATHER_API_TOKEN");
        config.uv_token = var("UV_TOKEN");
        if let Some(path) = var("WEATHER_CACHE_PATH") {
            config.cache_path = PathBuf::from(path);
        }
        if let Some(raw) = var("WEATHER_CACHE_SECONDS") {
            config.max_cache_seconds = parse_positive(&raw, "WEATHER_CACHE_SECONDS")?;
        }
        if let Some(raw) = var("WEATHER_ALLOWED_CITIES") {
            config.allowed_cities = parse_city_list(&raw);
        }
        if let Some(base) = var("WEATHER_API_BASE") {
            config.weather_api_base = base;
        }
        if let Some(base) = var("UV_API_BASE") {
            config.uv_api_base = base;
        }
        if let Some(raw) = var("UPSTREAM_TIMEOUT_SECS") {
            let secs = parse_positive(&raw, "UPSTREAM_TIMEOUT_SECS")?;
            config.upstream_timeout = Duration::from_secs(secs as u64);
        }
        if let Some(host) = var("HOST") {
            config.host = host;
        }
        if let Some(raw) = var("PORT") {
            config.port = raw
                .parse::<u16>()
                .map_err(|_| WeatherError::Config("PORT must be a valid port number".into()))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut issues: Vec<String> = Vec::new();

        if self.allowed_cities.is_empty() {
            issues.push("allowed cities must contain at least one city".into());
        }
        if self.max_cache_seconds <= 0 {
            issues.push("cache lifetime must be > 0 seconds".into());
        }
        if self.upstream_timeout.is_zero() {
            issues.push("upstream timeout must be > 0".into());
        }
        if self.weather_api_base.is_empty() || self.uv_api_base.is_empty() {
            issues.push("upstream base URLs must not be empty".into());
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(WeatherError::Config(format!(
                "Invalid config:\n - {}",
                issues.join("\n - ")
            )))
        }
    }

    pub fn is_allowed(&self, city: &str) -> bool {
        self.allowed_cities.iter().any(|c| c == city)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_positive(raw: &str, env_name: &str) -> Result<i64> {
    let parsed = raw
        .parse::<i64>()
        .map_err(|_| WeatherError::Config(format!("{env_name} must be an integer > 0")))?;
    if parsed <= 0 {
        return Err(WeatherError::Config(format!(
            "{env_name} must be an integer > 0"
        )));
    }
    Ok(parsed)
}

fn parse_city_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}
