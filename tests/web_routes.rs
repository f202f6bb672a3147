mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use cacao::{
    config::{GeocodingConfig, PhotoConfig, StorageConfig},
    geo::{GeoCache, GeoProxy},
    photos::PhotoPipeline,
    web::{AppState, WebServer},
};
use common::{FakeUpstream, Reply, test_image, unreachable_base_url};
use image::ImageFormat;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

const LYON: &str = r#"[{"display_name":"Lyon, France","lat":"45.76","lon":"4.83"}]"#;

fn router(geo_base: &str, storage: StorageConfig, photos: PhotoConfig) -> Router {
    let geocoding = GeocodingConfig {
        search_url: format!("{geo_base}/search"),
        reverse_url: format!("{geo_base}/reverse"),
        ..GeocodingConfig::default()
    };
    let cache = Arc::new(GeoCache::with_system_clock(geocoding.sweep_every));
    let state = AppState {
        geo: Arc::new(GeoProxy::new(&geocoding, cache).unwrap()),
        photos: Arc::new(PhotoPipeline::with_system_clock(photos, &storage).unwrap()),
        shutdown: CancellationToken::new(),
    };
    WebServer::create_router(state)
}

fn geo_router(geo_base: &str) -> Router {
    router(geo_base, StorageConfig::default(), PhotoConfig::default())
}

async fn get(app: &Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = geo_router(&unreachable_base_url().await);
    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["photo_uploads"], false);
}

#[tokio::test]
async fn test_short_query_answers_empty_list_locally() {
    let upstream = FakeUpstream::new(Reply::ok(LYON));
    let app = geo_router(&upstream.spawn_geocoder().await);

    for uri in ["/api/geo/search?q=a", "/api/geo/search?q=%20b%20", "/api/geo/search"] {
        let response = get(&app, uri).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }
    assert_eq!(upstream.hits(), 0);
}

#[tokio::test]
async fn test_search_passthrough_then_cache_hit() {
    let upstream = FakeUpstream::new(Reply::ok(LYON));
    let app = geo_router(&upstream.spawn_geocoder().await);

    let first = get(&app, "/api/geo/search?q=Lyon").await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()["x-cache"], "MISS");
    assert_eq!(
        first.headers()["content-type"],
        "application/json; charset=utf-8"
    );
    let body = to_bytes(first.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], LYON.as_bytes());

    let second = get(&app, "/api/geo/search?q=Lyon").await;
    assert_eq!(second.headers()["x-cache"], "HIT");
    assert_eq!(upstream.hits(), 1);

    let query = upstream.last().unwrap().query.unwrap();
    assert!(query.contains("q=Lyon"));
    assert!(query.contains("format=json"));
    assert!(query.contains("limit=6"));

    let stats = body_json(get(&app, "/api/geo/cache/stats").await).await;
    assert_eq!(stats["success"], true);
    assert_eq!(stats["data"]["entries"], 1);
    assert_eq!(stats["data"]["hits"], 1);
    assert_eq!(stats["data"]["misses"], 1);
}

#[tokio::test]
async fn test_reverse_requires_coordinates() {
    let upstream = FakeUpstream::new(Reply::ok("{}"));
    let app = geo_router(&upstream.spawn_geocoder().await);

    let missing = get(&app, "/api/geo/reverse?lat=48.85").await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(missing).await["error"], "lat and lon are required");

    let too_long = get(&app, "/api/geo/reverse?lat=48.851234567890123456789&lon=2.35").await;
    assert_eq!(too_long.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(too_long).await["error"], "invalid lat/lon");

    assert_eq!(upstream.hits(), 0);
}

#[tokio::test]
async fn test_reverse_upstream_error_status_is_passed_through() {
    let upstream = FakeUpstream::new(Reply::status(
        StatusCode::SERVICE_UNAVAILABLE,
        r#"{"error":"overloaded"}"#,
    ));
    let app = geo_router(&upstream.spawn_geocoder().await);

    let response = get(&app, "/api/geo/reverse?lat=48.85&lon=2.35").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()["x-cache"], "MISS");
    assert_eq!(body_json(response).await["error"], "overloaded");
}

#[tokio::test]
async fn test_unreachable_geocoder_is_bad_gateway() {
    let app = geo_router(&unreachable_base_url().await);

    let response = get(&app, "/api/geo/search?q=Paris").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "geocoding service unavailable");
}

#[tokio::test]
async fn test_photo_upload_returns_public_url() {
    let storage = FakeUpstream::new(Reply::ok("{}"));
    let storage_base = storage.spawn_storage().await;
    let app = router(
        &unreachable_base_url().await,
        StorageConfig {
            url: Some(storage_base.clone()),
            service_key: Some("key".to_string()),
            ..StorageConfig::default()
        },
        PhotoConfig::default(),
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/photos/owner-42")
                .header("content-type", "image/png")
                .body(Body::from(test_image(300, 200, ImageFormat::Png)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let url = json["data"]["url"].as_str().unwrap();
    assert!(url.starts_with(&format!(
        "{storage_base}/storage/v1/object/public/photos/tasting-owner-42-"
    )));
    assert!(url.ends_with(".jpg"));
    assert_eq!(storage.hits(), 1);
}

#[tokio::test]
async fn test_photo_upload_without_storage_is_unavailable() {
    let app = geo_router(&unreachable_base_url().await);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/photos/owner-42")
                .body(Body::from(test_image(10, 10, ImageFormat::Png)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_oversize_photo_is_rejected() {
    let storage = FakeUpstream::new(Reply::ok("{}"));
    let storage_base = storage.spawn_storage().await;
    let app = router(
        &unreachable_base_url().await,
        StorageConfig {
            url: Some(storage_base),
            service_key: Some("key".to_string()),
            ..StorageConfig::default()
        },
        PhotoConfig {
            max_upload_bytes: 1024,
            ..PhotoConfig::default()
        },
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/photos/owner-42")
                .body(Body::from(vec![0u8; 4096]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(storage.hits(), 0);
}

#[tokio::test]
async fn test_invalid_owner_id_is_bad_request() {
    let storage = FakeUpstream::new(Reply::ok("{}"));
    let storage_base = storage.spawn_storage().await;
    let app = router(
        &unreachable_base_url().await,
        StorageConfig {
            url: Some(storage_base),
            service_key: Some("key".to_string()),
            ..StorageConfig::default()
        },
        PhotoConfig::default(),
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/photos/owner.42")
                .body(Body::from(test_image(10, 10, ImageFormat::Png)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(storage.hits(), 0);
}
