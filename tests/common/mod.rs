#![allow(dead_code)]

use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, HeaderName, StatusCode, header::CONTENT_TYPE},
    response::IntoResponse,
    routing::{get, post},
};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Serve `app` on an ephemeral local port and return its base URL
pub async fn spawn_upstream(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Base URL of a port nothing listens on
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// What a fake upstream should answer
#[derive(Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: &'static str,
    pub delay: Duration,
}

impl Reply {
    pub fn ok(body: &'static str) -> Self {
        Self {
            status: StatusCode::OK,
            body,
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: StatusCode, body: &'static str) -> Self {
        Self {
            status,
            body,
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Request observed by a fake upstream
#[derive(Debug, Clone)]
pub struct Seen {
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone)]
pub struct FakeUpstream {
    reply: Reply,
    hits: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl FakeUpstream {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            hits: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last(&self) -> Option<Seen> {
        self.seen.lock().unwrap().last().cloned()
    }

    /// Nominatim lookalike: `GET /search` and `GET /reverse`
    pub async fn spawn_geocoder(&self) -> String {
        let app = Router::new()
            .route("/search", get(answer))
            .route("/reverse", get(answer))
            .with_state(self.clone());
        spawn_upstream(app).await
    }

    /// Storage lookalike: `POST /storage/v1/object/{bucket}/{name}`
    pub async fn spawn_storage(&self) -> String {
        let app = Router::new()
            .route("/storage/v1/object/{bucket}/{name}", post(store_object))
            .with_state(self.clone());
        spawn_upstream(app).await
    }

    async fn record(&self, seen: Seen) -> (StatusCode, [(HeaderName, &'static str); 1], &'static str) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(seen);
        if !self.reply.delay.is_zero() {
            tokio::time::sleep(self.reply.delay).await;
        }
        (
            self.reply.status,
            [(CONTENT_TYPE, "application/json")],
            self.reply.body,
        )
    }
}

async fn answer(
    State(upstream): State<FakeUpstream>,
    uri: axum::http::Uri,
    headers: HeaderMap,
) -> impl IntoResponse {
    upstream
        .record(Seen {
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            headers,
            body: Bytes::new(),
        })
        .await
}

async fn store_object(
    State(upstream): State<FakeUpstream>,
    Path((bucket, name)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    upstream
        .record(Seen {
            path: format!("/storage/v1/object/{bucket}/{name}"),
            query: None,
            headers,
            body,
        })
        .await
}

/// Synthetic gradient image encoded as `format`
pub fn test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut cursor, format)
        .expect("Failed to encode test image");
    cursor.into_inner()
}
