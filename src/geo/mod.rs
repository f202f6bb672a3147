//! Geocoding proxy with an in-memory response cache

pub mod cache;
pub mod proxy;

pub use cache::{CacheStats, GeoCache};
pub use proxy::{GeoProxy, UpstreamResponse};
