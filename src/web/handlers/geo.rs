//! Geocoding endpoints: thin wrappers that build the upstream URL and pass
//! the upstream status and body straight through.

use axum::{
    extract::{Query, State},
    http::{HeaderName, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::warn;

use crate::web::{
    AppState,
    responses::{bad_request, handle_error, ok},
};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const MIN_QUERY_CHARS: usize = 2;
const MAX_COORDINATE_LEN: usize = 20;

static X_CACHE: HeaderName = HeaderName::from_static("x-cache");

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReverseParams {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

/// `GET /api/geo/search?q=Paris`
pub async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let query = params.q.as_deref().unwrap_or_default().trim();
    if query.chars().count() < MIN_QUERY_CHARS {
        return (
            StatusCode::OK,
            [(CONTENT_TYPE, JSON_CONTENT_TYPE)],
            Bytes::from_static(b"[]"),
        )
            .into_response();
    }

    let upstream_url = state.geo.search_url(query);
    forward(&state, &upstream_url).await
}

/// `GET /api/geo/reverse?lat=48.85&lon=2.35`
pub async fn reverse(
    State(state): State<AppState>,
    Query(params): Query<ReverseParams>,
) -> Response {
    let lat = params.lat.as_deref().unwrap_or_default().trim();
    let lon = params.lon.as_deref().unwrap_or_default().trim();
    if lat.is_empty() || lon.is_empty() {
        return bad_request("lat and lon are required").into_response();
    }
    if lat.len() > MAX_COORDINATE_LEN || lon.len() > MAX_COORDINATE_LEN {
        return bad_request("invalid lat/lon").into_response();
    }

    let upstream_url = state.geo.reverse_url(lat, lon);
    forward(&state, &upstream_url).await
}

/// `GET /api/geo/cache/stats`
pub async fn cache_stats(State(state): State<AppState>) -> Response {
    ok(state.geo.cache().stats().await).into_response()
}

async fn forward(state: &AppState, upstream_url: &str) -> Response {
    let cancel = state.shutdown.child_token();
    match state.geo.proxy(upstream_url, &cancel).await {
        Ok(upstream) => {
            let cache_state = if upstream.cached { "HIT" } else { "MISS" };
            (
                upstream.status,
                [
                    (CONTENT_TYPE, JSON_CONTENT_TYPE),
                    (X_CACHE.clone(), cache_state),
                ],
                upstream.body,
            )
                .into_response()
        }
        Err(e) => {
            warn!("Geocoding proxy failed for {}: {}", upstream_url, e);
            handle_error(e).into_response()
        }
    }
}
