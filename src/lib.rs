//! HTTP service returning current weather plus UV index for a fixed set of
//! cities, cached in a local JSON document for a short window.

pub mod config;
pub mod constants;
pub mod error;
pub mod formatters;
pub mod models;
pub mod routes;
pub mod service;
pub mod store;

pub use config::Config;
pub use error::WeatherError;
pub use routes::{router, AppState};
pub use service::WeatherAggregator;
pub use store::{CacheStore, FileCacheStore, MemoryCacheStore};
