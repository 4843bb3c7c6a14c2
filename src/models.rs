use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

// ============================================================================
// OpenWeatherMap API Models
// ============================================================================

/// The parts of `/weather` the aggregator relies on. Everything else in the
/// payload is kept only in the raw document stored alongside the output.
#[derive(Debug, Deserialize)]
pub struct CurrentWeatherResponse {
    pub coord: Coord,
    pub weather: Vec<Map<String, Value>>,
    pub main: Map<String, Value>,
    pub wind: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

// ============================================================================
// OpenUV API Models
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UvResponse {
    pub result: UvResult,
}

#[derive(Debug, Deserialize)]
pub struct UvResult {
    pub uv: Number,
    pub uv_max: Number,
}

// ============================================================================
// Client-facing Models
// ============================================================================

/// Merged weather + UV view returned to clients and cached verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedOutput {
    pub weather: Map<String, Value>,
    pub main: MainReadings,
    pub wind: Map<String, Value>,
}

/// Upstream `main` block plus the fetch time and UV readings.
///
/// UV readings keep the provider's number form, so `0` stays `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    #[serde(flatten)]
    pub readings: Map<String, Value>,
    pub date_time: NaiveDateTime,
    pub uv_index: Number,
    pub uv_index_max: Number,
}

/// One entry of the cache document. Field names on disk match the layout
/// older deployments already wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    #[serde(rename = "last_get")]
    pub last_fetch_time: NaiveDateTime,
    #[serde(rename = "weather_data")]
    pub weather_raw: Value,
    #[serde(rename = "uv_data")]
    pub uv_raw: Value,
    pub output: NormalizedOutput,
}

// ============================================================================
// HTTP Request Models
// ============================================================================

#[derive(Debug, Default, PartialEq)]
pub struct GetWeatherQuery {
    pub city: Option<String>,
}

impl GetWeatherQuery {
    /// Reads the raw query string; repeated `city` keys resolve to the first one
    pub fn from_raw(raw: Option<&str>) -> Self {
        let city = raw.and_then(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .find(|(key, _)| key == "city")
                .map(|(_, value)| value.into_owned())
        });
        Self { city }
    }
}
