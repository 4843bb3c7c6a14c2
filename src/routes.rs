use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Result, WeatherError};
use crate::models::{GetWeatherQuery, NormalizedOutput};
use crate::service::WeatherAggregator;

pub struct AppState {
    pub aggregator: WeatherAggregator,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/get_weather", get(get_weather))
        .with_state(state)
}

pub async fn health_check() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") })),
    )
}

// GET /api/get_weather?city=<name>
pub async fn get_weather(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
) -> Result<Json<NormalizedOutput>> {
    let query = GetWeatherQuery::from_raw(raw.as_deref());
    let city = validate_city(query.city.as_deref(), state.aggregator.config())?;
    tracing::info!("Getting weather for city: {}", city);

    let output = state.aggregator.get(city).await?;
    Ok(Json(output))
}

/// Rejects missing cities and cities outside the allow-list before any I/O
pub fn validate_city<'a>(city: Option<&'a str>, config: &Config) -> Result<&'a str> {
    let city = city.filter(|c| !c.is_empty()).ok_or(WeatherError::MissingCity)?;
    if !config.is_allowed(city) {
        return Err(WeatherError::city_not_allowed(city, &config.allowed_cities));
    }
    Ok(city)
}
