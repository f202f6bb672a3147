//! Error type definitions for the cacao service

use thiserror::Error;

/// Top-level application error type
///
/// Every outbound call (geocoding lookup, storage upload) and every step of
/// the photo pipeline reports failures through this enum so callers can tell
/// a remote refusal apart from an unreachable remote, a timeout, or their own
/// cancellation.
#[derive(Error, Debug)]
pub enum AppError {
    /// Input larger than the configured bound
    #[error("Payload too large: {size} bytes (max: {max_size})")]
    PayloadTooLarge { size: u64, max_size: u64 },

    /// Image bytes could not be decoded
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Normalized image could not be encoded
    #[error("Encode error: {message}")]
    Encode { message: String },

    /// Transport-level failure talking to a remote service
    #[error("Upstream unavailable: {service} - {message}")]
    UpstreamUnavailable { service: String, message: String },

    /// Remote service answered with a non-success status
    #[error("Upstream rejected: {service} - HTTP {status}: {body}")]
    UpstreamRejected {
        service: String,
        status: u16,
        body: String,
    },

    /// Remote service did not answer in time
    #[error("Upstream timeout: {service}")]
    Timeout { service: String },

    /// A required credential or endpoint is absent
    #[error("Missing configuration: {key}")]
    ConfigMissing { key: String },

    /// The caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// Caller input failed validation
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The outbound request could not be built
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Configuration present but unusable
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Convenience methods for creating common error types
impl AppError {
    pub fn payload_too_large(size: u64, max_size: u64) -> Self {
        Self::PayloadTooLarge { size, max_size }
    }

    pub fn decode<S: Into<String>>(message: S) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn encode<S: Into<String>>(message: S) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    pub fn upstream_unavailable<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::UpstreamUnavailable {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn upstream_rejected<S: Into<String>, B: Into<String>>(
        service: S,
        status: u16,
        body: B,
    ) -> Self {
        Self::UpstreamRejected {
            service: service.into(),
            status,
            body: body.into(),
        }
    }

    pub fn timeout<S: Into<String>>(service: S) -> Self {
        Self::Timeout {
            service: service.into(),
        }
    }

    pub fn config_missing<S: Into<String>>(key: S) -> Self {
        Self::ConfigMissing { key: key.into() }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Classify a reqwest failure for the named remote service.
    ///
    /// Timeouts get their own kind; request-building failures are the
    /// caller's fault; everything else is the remote being unreachable.
    pub fn from_transport<S: Into<String>>(service: S, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(service)
        } else if error.is_builder() {
            Self::invalid_request(error.to_string())
        } else {
            Self::upstream_unavailable(service, error.to_string())
        }
    }

    /// Whether the error came from talking to a remote service
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable { .. } | Self::UpstreamRejected { .. } | Self::Timeout { .. }
        )
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::internal(format!("Background task failed: {error}"))
    }
}
