use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::web::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "photo_uploads": state.photos.is_upload_configured(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
