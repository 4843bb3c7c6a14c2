/// User agent string for HTTP requests
pub const USER_AGENT: &str = "weather-uv-server/0.1.0";

/// OpenWeatherMap API base URL
pub const WEATHER_API_BASE: &str = "https://api.openweathermap.org/data/2.5";

/// OpenUV API base URL
pub const UV_API_BASE: &str = "https://api.openuv.io/api/v1";

/// Header carrying the UV provider token
pub const UV_TOKEN_HEADER: &str = "x-access-token";

/// Cities served when no allow-list is configured
pub const DEFAULT_CITIES: &[&str] = &["Baku", "Antalya"];

/// Cache document written next to the working directory
pub const DEFAULT_CACHE_PATH: &str = "data.data";

pub const DEFAULT_MAX_CACHE_SECONDS: i64 = 10 * 60;

pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
