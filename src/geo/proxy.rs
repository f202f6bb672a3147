//! Cached proxy in front of the Nominatim geocoding API

use bytes::Bytes;
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, ACCEPT_LANGUAGE, HeaderValue, USER_AGENT},
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use super::cache::GeoCache;
use crate::config::GeocodingConfig;
use crate::errors::{AppError, AppResult};

const SERVICE: &str = "geocoding";

/// Upstream answer as handed back to callers
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
    /// Served from the cache without touching the network
    pub cached: bool,
}

/// Geocoding proxy: cache lookup first, single upstream GET on miss
pub struct GeoProxy {
    client: Client,
    cache: Arc<GeoCache>,
    user_agent: HeaderValue,
    accept_language: HeaderValue,
    search_url: Url,
    reverse_url: Url,
    email: Option<String>,
    result_limit: u32,
    cache_ttl: Duration,
}

impl GeoProxy {
    pub fn new(config: &GeocodingConfig, cache: Arc<GeoCache>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build geocoding client: {e}")))?;

        let user_agent = HeaderValue::from_str(config.effective_user_agent())
            .map_err(|e| AppError::configuration(format!("Invalid geocoding user agent: {e}")))?;
        let accept_language = HeaderValue::from_str(config.accept_language.trim())
            .map_err(|e| AppError::configuration(format!("Invalid accept language: {e}")))?;

        let search_url = Url::parse(&config.search_url)
            .map_err(|e| AppError::configuration(format!("Invalid geocoding search url: {e}")))?;
        let reverse_url = Url::parse(&config.reverse_url)
            .map_err(|e| AppError::configuration(format!("Invalid geocoding reverse url: {e}")))?;

        Ok(Self {
            client,
            cache,
            user_agent,
            accept_language,
            search_url,
            reverse_url,
            email: config.contact_email().map(str::to_string),
            result_limit: config.result_limit,
            cache_ttl: config.cache_ttl(),
        })
    }

    pub fn cache(&self) -> &Arc<GeoCache> {
        &self.cache
    }

    /// Upstream URL for a free-text place search
    pub fn search_url(&self, query: &str) -> String {
        let mut url = self.search_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("format", "json")
                .append_pair("q", query)
                .append_pair("limit", &self.result_limit.to_string())
                .append_pair("addressdetails", "1")
                .append_pair("accept-language", self.language());
            if let Some(email) = &self.email {
                pairs.append_pair("email", email);
            }
        }
        url.into()
    }

    /// Upstream URL for reverse geocoding a coordinate pair
    pub fn reverse_url(&self, lat: &str, lon: &str) -> String {
        let mut url = self.reverse_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("format", "json")
                .append_pair("lat", lat)
                .append_pair("lon", lon)
                .append_pair("addressdetails", "1")
                .append_pair("accept-language", self.language());
            if let Some(email) = &self.email {
                pairs.append_pair("email", email);
            }
        }
        url.into()
    }

    fn language(&self) -> &str {
        self.accept_language.to_str().unwrap_or("fr")
    }

    /// Serve `upstream_url` from the cache or fetch it.
    ///
    /// Any upstream status is returned as-is together with its body; only a
    /// 200 with a non-empty body is cached. Failures to reach the upstream are
    /// errors, never retried here.
    pub async fn proxy(
        &self,
        upstream_url: &str,
        cancel: &CancellationToken,
    ) -> AppResult<UpstreamResponse> {
        if let Some(body) = self.cache.lookup(upstream_url).await {
            return Ok(UpstreamResponse {
                status: StatusCode::OK,
                body,
                cached: true,
            });
        }

        let url = Url::parse(upstream_url)
            .map_err(|e| AppError::invalid_request(format!("Invalid geocoding url: {e}")))?;

        let request = self
            .client
            .get(url)
            .header(USER_AGENT, self.user_agent.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(ACCEPT_LANGUAGE, self.accept_language.clone());

        let fetch = async {
            let response = request
                .send()
                .await
                .map_err(|e| AppError::from_transport(SERVICE, e))?;
            let status = response.status();
            let body = response
                .bytes()
                .await
                .map_err(|e| AppError::from_transport(SERVICE, e))?;
            Ok::<_, AppError>((status, body))
        };

        let (status, body) = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Geocoding request cancelled: {}", upstream_url);
                return Err(AppError::Cancelled);
            }
            result = fetch => result.inspect_err(|e| warn!("Geocoding request failed: {}", e))?,
        };

        if status == StatusCode::OK && !body.is_empty() {
            self.cache
                .store(upstream_url, body.clone(), self.cache_ttl)
                .await;
        } else {
            debug!(
                "Not caching geocoding response: status={}, bytes={}",
                status,
                body.len()
            );
        }

        Ok(UpstreamResponse {
            status,
            body,
            cached: false,
        })
    }
}
