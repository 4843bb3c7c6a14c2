use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

pub type Result<T> = std::result::Result<T, WeatherError>;

/// Errors surfaced by the aggregator and the HTTP layer
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Have not city in request")]
    MissingCity,
    #[error("City {city} not allowed. Possible variants: {variants}")]
    CityNotAllowed { city: String, variants: String },
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("Malformed upstream response: {0}")]
    MalformedUpstreamResponse(String),
    #[error("Cache error: {0}")]
    CacheIo(String),
    #[error("Config error: {0}")]
    Config(String),
}

impl WeatherError {
    pub fn city_not_allowed(city: &str, allowed: &[String]) -> Self {
        Self::CityNotAllowed {
            city: city.to_string(),
            variants: allowed.join(", "),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCity | Self::CityNotAllowed { .. } => StatusCode::BAD_REQUEST,
            Self::UpstreamUnavailable(_) | Self::MalformedUpstreamResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::CacheIo(_) | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(e: reqwest::Error) -> Self {
        // Body decoding failures mean the provider answered with something we can't read
        if e.is_decode() {
            Self::MalformedUpstreamResponse(e.to_string())
        } else {
            Self::UpstreamUnavailable(e.to_string())
        }
    }
}

impl From<std::io::Error> for WeatherError {
    fn from(e: std::io::Error) -> Self {
        Self::CacheIo(e.to_string())
    }
}

impl IntoResponse for WeatherError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::info!("Rejected request: {}", self);
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_city_message() {
        assert_eq!(
            WeatherError::MissingCity.to_string(),
            "Have not city in request"
        );
    }

    #[test]
    fn test_city_not_allowed_lists_variants() {
        let allowed = vec!["Baku".to_string(), "Antalya".to_string()];
        let err = WeatherError::city_not_allowed("Madrid", &allowed);
        assert_eq!(
            err.to_string(),
            "City Madrid not allowed. Possible variants: Baku, Antalya"
        );
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_status_codes_by_kind() {
        assert_eq!(
            WeatherError::UpstreamUnavailable("timeout".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            WeatherError::MalformedUpstreamResponse("no coord".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            WeatherError::CacheIo("disk full".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_io_error_maps_to_cache_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(WeatherError::from(io), WeatherError::CacheIo(_)));
    }
}
