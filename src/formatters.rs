use chrono::NaiveDateTime;

use crate::error::{Result, WeatherError};
use crate::models::{CurrentWeatherResponse, MainReadings, NormalizedOutput, UvResponse};

/// Merges a weather and a UV response into the client-facing shape
pub fn format_output(
    weather: CurrentWeatherResponse,
    uv: UvResponse,
    fetched_at: NaiveDateTime,
) -> Result<NormalizedOutput> {
    let condition = weather.weather.into_iter().next().ok_or_else(|| {
        WeatherError::MalformedUpstreamResponse("weather condition list is empty".to_string())
    })?;

    Ok(NormalizedOutput {
        weather: condition,
        main: MainReadings {
            readings: weather.main,
            date_time: fetched_at,
            uv_index: uv.result.uv,
            uv_index_max: uv.result.uv_max,
        },
        wind: weather.wind,
    })
}
