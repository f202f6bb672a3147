/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

// Geocoding defaults
pub const DEFAULT_GEO_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_GEO_REVERSE_URL: &str = "https://nominatim.openstreetmap.org/reverse";
// Nominatim's usage policy wants a real contact here in production
pub const DEFAULT_GEO_USER_AGENT: &str = "Cacao-App/1.0 (+https://example.com; contact@example.com)";
pub const DEFAULT_GEO_ACCEPT_LANGUAGE: &str = "fr";
pub const DEFAULT_GEO_RESULT_LIMIT: u32 = 6;
pub const DEFAULT_GEO_TIMEOUT_SECS: u64 = 6;
pub const DEFAULT_GEO_CACHE_TTL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_GEO_SWEEP_EVERY: u64 = 50;

// Object storage defaults
pub const DEFAULT_STORAGE_BUCKET: &str = "photos";
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 20;

// Photo pipeline defaults
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024; // 10MB
pub const DEFAULT_MAX_IMAGE_WIDTH: u32 = 1200;
pub const DEFAULT_JPEG_QUALITY: u8 = 80;
