//! Core of the cacao tasting catalogue: a cached geocoding proxy and the
//! photo ingest pipeline, plus the thin axum layer that serves them.

pub mod config;
pub mod errors;
pub mod geo;
pub mod photos;
pub mod utils;
pub mod web;
