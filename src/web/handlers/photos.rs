use axum::{
    extract::{Path, State},
    http::{HeaderMap, header::CONTENT_LENGTH},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Serialize;
use tracing::warn;

use crate::web::{
    AppState,
    responses::{handle_error, ok},
};

#[derive(Debug, Serialize)]
pub struct UploadedPhoto {
    pub url: String,
}

/// `POST /api/photos/{owner_id}` with the raw image as the body.
///
/// Failure is reported but never fatal for the owner record: callers keep
/// the tasting and simply have no photo.
pub async fn upload_photo(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let declared_size = headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    let cancel = state.shutdown.child_token();
    match state
        .photos
        .ingest(body, declared_size, &owner_id, &cancel)
        .await
    {
        Ok(url) => ok(UploadedPhoto { url }).into_response(),
        Err(e) => {
            warn!("Photo upload for {} failed, continuing without photo: {}", owner_id, e);
            handle_error(e).into_response()
        }
    }
}
