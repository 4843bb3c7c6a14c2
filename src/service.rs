use chrono::{Local, NaiveDateTime, Timelike};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::constants::{USER_AGENT, UV_TOKEN_HEADER};
use crate::error::{Result, WeatherError};
use crate::formatters::format_output;
use crate::models::{CacheRecord, Coord, CurrentWeatherResponse, NormalizedOutput, UvResponse};
use crate::store::CacheStore;

/// Weather + UV aggregator backed by a cache store
#[derive(Clone)]
pub struct WeatherAggregator {
    client: Arc<Client>,
    config: Arc<Config>,
    store: Arc<dyn CacheStore>,
}

impl WeatherAggregator {
    /// Creates a new aggregator with its own HTTP client
    pub fn new(config: Config, store: Arc<dyn CacheStore>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| WeatherError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            config: Arc::new(config),
            store,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the cached output for `city`, refreshing it from upstream when stale
    pub async fn get(&self, city: &str) -> Result<NormalizedOutput> {
        let cached = self.store.get(city).await?;
        let now = Local::now().naive_local();

        match cached {
            Some(record) if !is_stale(Some(&record), now, self.config.max_cache_seconds) => {
                tracing::info!(
                    "Serving cached weather for {} (age {}s)",
                    city,
                    cache_age(&record, now)
                );
                return Ok(record.output);
            }
            Some(record) => tracing::info!(
                "Cache stale for {} (age {}s), fetching upstream",
                city,
                cache_age(&record, now)
            ),
            None => tracing::info!("No cached weather for {}, fetching upstream", city),
        }

        let record = self.fetch_record(city).await?;
        self.store.put(city, record.clone()).await?;
        Ok(record.output)
    }

    async fn fetch_record(&self, city: &str) -> Result<CacheRecord> {
        let (weather_raw, weather) = self.fetch_weather(city).await?;
        let (uv_raw, uv) = self.fetch_uv(weather.coord).await?;
        let fetched_at = fetch_timestamp();

        let output = format_output(weather, uv, fetched_at)?;

        Ok(CacheRecord {
            last_fetch_time: fetched_at,
            weather_raw,
            uv_raw,
            output,
        })
    }

    async fn fetch_weather(&self, city: &str) -> Result<(Value, CurrentWeatherResponse)> {
        tracing::debug!("Fetching current weather for {}", city);

        let url = format!("{}/weather", self.config.weather_api_base);
        let mut query = vec![("q", city.to_string()), ("units", "metric".to_string())];
        if let Some(token) = &self.config.weather_token {
            query.push(("appid", token.clone()));
        }

        self.make_request(self.client.get(&url).query(&query), "weather")
            .await
    }

    async fn fetch_uv(&self, coord: Coord) -> Result<(Value, UvResponse)> {
        tracing::debug!("Fetching UV index for {}, {}", coord.lat, coord.lon);

        let url = format!("{}/uv", self.config.uv_api_base);
        let mut request = self
            .client
            .get(&url)
            .query(&[("lat", coord.lat), ("lng", coord.lon)]);
        if let Some(token) = &self.config.uv_token {
            request = request.header(UV_TOKEN_HEADER, token);
        }

        self.make_request(request, "UV").await
    }

    /// Sends the request and returns the raw JSON body alongside its typed view
    async fn make_request<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        provider: &str,
    ) -> Result<(Value, T)> {
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(WeatherError::UpstreamUnavailable(format!(
                "{} provider returned status {}",
                provider,
                response.status()
            )));
        }

        let raw = response.json::<Value>().await?;
        let typed = serde_json::from_value(raw.clone()).map_err(|e| {
            WeatherError::MalformedUpstreamResponse(format!("{} provider: {}", provider, e))
        })?;
        Ok((raw, typed))
    }
}

/// Whether a cached record must be refetched.
///
/// Age is the true elapsed time, so entries from a previous day are always
/// stale. A fetch time in the future is treated as stale too.
pub fn is_stale(record: Option<&CacheRecord>, now: NaiveDateTime, max_age_secs: i64) -> bool {
    let Some(record) = record else {
        return true;
    };
    let age = cache_age(record, now);
    age < 0 || age > max_age_secs
}

/// Whole seconds elapsed since the record was fetched; negative if fetched "in the future"
pub fn cache_age(record: &CacheRecord, now: NaiveDateTime) -> i64 {
    (now - record.last_fetch_time).num_seconds()
}

/// Local wall-clock time at microsecond precision
fn fetch_timestamp() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(now.nanosecond() / 1_000 * 1_000).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MainReadings;
    use chrono::Duration;
    use serde_json::{json, Map, Number};

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn record_at(fetched: NaiveDateTime) -> CacheRecord {
        CacheRecord {
            last_fetch_time: fetched,
            weather_raw: json!({}),
            uv_raw: json!({}),
            output: NormalizedOutput {
                weather: Map::new(),
                main: MainReadings {
                    readings: Map::new(),
                    date_time: fetched,
                    uv_index: Number::from(0),
                    uv_index_max: Number::from(0),
                },
                wind: Map::new(),
            },
        }
    }

    #[test]
    fn test_missing_record_is_stale() {
        assert!(is_stale(None, at("2024-06-01 12:00:00"), 600));
    }

    #[test]
    fn test_recent_record_is_fresh() {
        let record = record_at(at("2024-06-01 12:00:00"));
        assert!(!is_stale(Some(&record), at("2024-06-01 12:09:59"), 600));
        assert!(!is_stale(Some(&record), at("2024-06-01 12:10:00"), 600));
    }

    #[test]
    fn test_old_record_is_stale() {
        let record = record_at(at("2024-06-01 12:00:00"));
        assert!(is_stale(Some(&record), at("2024-06-01 12:10:01"), 600));
    }

    #[test]
    fn test_record_from_previous_day_is_stale() {
        // Same time of day, one day later: wrapped seconds-of-day arithmetic would call this fresh
        let record = record_at(at("2024-06-01 12:00:00"));
        let now = record.last_fetch_time + Duration::days(1) + Duration::seconds(30);
        assert!(is_stale(Some(&record), now, 600));
    }

    #[test]
    fn test_future_record_is_stale() {
        let record = record_at(at("2024-06-01 12:05:00"));
        assert!(is_stale(Some(&record), at("2024-06-01 12:00:00"), 600));
    }

    #[test]
    fn test_cache_age_spans_days() {
        let record = record_at(at("2024-06-01 23:59:00"));
        assert_eq!(cache_age(&record, at("2024-06-02 00:01:00")), 120);
        assert_eq!(cache_age(&record, at("2024-06-02 23:59:30")), 86_430);
        assert_eq!(cache_age(&record, at("2024-06-01 23:58:00")), -60);
    }

    #[test]
    fn test_fetch_timestamp_has_microsecond_precision() {
        assert_eq!(fetch_timestamp().nanosecond() % 1_000, 0);
    }
}
