//! Upload client for the remote object storage (Supabase storage REST API)

use reqwest::{
    Client,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::StorageConfig;
use crate::errors::{AppError, AppResult};

const SERVICE: &str = "storage";

/// Authenticated writer for one storage bucket
#[derive(Clone)]
pub struct StorageClient {
    client: Client,
    base_url: String,
    credential: String,
    bucket: String,
}

impl std::fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageClient")
            .field("base_url", &self.base_url)
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

impl StorageClient {
    /// Build from configuration, failing with `ConfigMissing` when the base
    /// URL or the service credential is absent.
    pub fn from_config(config: &StorageConfig) -> AppResult<Self> {
        let base_url = config
            .base_url()
            .ok_or_else(|| AppError::config_missing("storage.url"))?;
        let credential = config
            .credential()
            .ok_or_else(|| AppError::config_missing("storage.service_key"))?;

        let client = Client::builder()
            .timeout(config.upload_timeout())
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build storage client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            credential: credential.to_string(),
            bucket: config.bucket.clone(),
        })
    }

    /// Authenticated write endpoint for `object_name`
    pub fn object_url(&self, object_name: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, object_name
        )
    }

    /// Publicly readable URL for `object_name`
    pub fn public_url(&self, object_name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, object_name
        )
    }

    /// Upload a JPEG, overwriting any object of the same name.
    pub async fn upload_jpeg(
        &self,
        object_name: &str,
        body: Vec<u8>,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        let size = body.len();
        let request = self
            .client
            .post(self.object_url(object_name))
            .header(AUTHORIZATION, format!("Bearer {}", self.credential))
            .header("apikey", &self.credential)
            .header(CONTENT_TYPE, "image/jpeg")
            .header("x-upsert", "true")
            .body(body);

        let upload = async {
            let response = request
                .send()
                .await
                .map_err(|e| AppError::from_transport(SERVICE, e))?;
            let status = response.status();
            if status.is_success() {
                return Ok(());
            }
            let body = response.text().await.unwrap_or_default();
            Err(AppError::upstream_rejected(SERVICE, status.as_u16(), body))
        };

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Upload of {} cancelled", object_name);
                Err(AppError::Cancelled)
            }
            result = upload => {
                result?;
                info!("Uploaded {} ({} bytes) to bucket {}", object_name, size, self.bucket);
                Ok(())
            }
        }
    }
}
