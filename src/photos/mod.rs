//! Photo ingest pipeline
//!
//! Turns an uploaded image into a width-bounded JPEG, pushes it to object
//! storage and returns the public URL. The pipeline keeps no state between
//! calls and writes nothing locally; a failure leaves nothing behind, so
//! callers can carry on without a photo.

pub mod processing;
pub mod storage;

use bytes::Bytes;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{PhotoConfig, StorageConfig};
use crate::errors::{AppError, AppResult};
use crate::utils::{Clock, SystemClock};

pub use processing::{NormalizedImage, normalize, target_dimensions};
pub use storage::StorageClient;

const MAX_OWNER_ID_LEN: usize = 128;

pub struct PhotoPipeline {
    settings: PhotoConfig,
    /// Upload client, or the name of the setting that is missing
    storage: Result<StorageClient, String>,
    clock: Arc<dyn Clock>,
}

impl PhotoPipeline {
    pub fn new(
        settings: PhotoConfig,
        storage: &StorageConfig,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        let storage = match StorageClient::from_config(storage) {
            Ok(client) => Ok(client),
            Err(AppError::ConfigMissing { key }) => {
                warn!("Photo uploads disabled until {} is configured", key);
                Err(key)
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            settings,
            storage,
            clock,
        })
    }

    pub fn with_system_clock(settings: PhotoConfig, storage: &StorageConfig) -> AppResult<Self> {
        Self::new(settings, storage, Arc::new(SystemClock))
    }

    pub fn settings(&self) -> &PhotoConfig {
        &self.settings
    }

    pub fn is_upload_configured(&self) -> bool {
        self.storage.is_ok()
    }

    /// Object name for an owner at the current second, always `.jpg`
    pub fn object_name(&self, owner_id: &str) -> String {
        format!("tasting-{}-{}.jpg", owner_id, self.clock.now().timestamp())
    }

    /// Normalize `data` and publish it for `owner_id`, returning the public URL.
    ///
    /// `declared_size` is what the client announced (e.g. Content-Length);
    /// the larger of it and the actual length is checked against the bound
    /// before any decoding.
    pub async fn ingest(
        &self,
        data: Bytes,
        declared_size: Option<u64>,
        owner_id: &str,
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        let storage = self
            .storage
            .as_ref()
            .map_err(|key| AppError::config_missing(key.clone()))?;

        validate_owner_id(owner_id)?;

        let size = declared_size.unwrap_or(0).max(data.len() as u64);
        if size > self.settings.max_upload_bytes {
            return Err(AppError::payload_too_large(
                size,
                self.settings.max_upload_bytes,
            ));
        }

        let max_width = self.settings.max_width;
        let quality = self.settings.jpeg_quality;
        let work = tokio::task::spawn_blocking(move || normalize(&data, max_width, quality));

        let normalized = tokio::select! {
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            joined = work => joined??,
        };

        let object_name = self.object_name(owner_id);
        info!(
            "Normalized {:?} photo for {}: {}x{} ({} bytes, resized={})",
            normalized.source_format,
            owner_id,
            normalized.width,
            normalized.height,
            normalized.bytes.len(),
            normalized.resized
        );

        storage
            .upload_jpeg(&object_name, normalized.bytes, cancel)
            .await?;

        Ok(storage.public_url(&object_name))
    }
}

/// Owner ids end up in object names; keep them to a safe alphabet
fn validate_owner_id(owner_id: &str) -> AppResult<()> {
    if owner_id.is_empty() || owner_id.len() > MAX_OWNER_ID_LEN {
        return Err(AppError::validation(format!(
            "Owner id must be 1 to {MAX_OWNER_ID_LEN} characters"
        )));
    }
    if !owner_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::validation(format!(
            "Owner id contains unsupported characters: {owner_id}"
        )));
    }
    Ok(())
}
