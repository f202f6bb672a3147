//! Centralized error handling for the cacao service
//!
//! Both the geocoding proxy and the photo pipeline return [`AppError`] to
//! their direct caller. Nothing here retries or terminates the process; the
//! web layer decides how each kind is surfaced (see
//! [`crate::web::responses::handle_error`]).
//!
//! # Usage
//!
//! ```rust
//! use cacao::errors::{AppError, AppResult};
//!
//! fn check_owner(owner_id: &str) -> AppResult<()> {
//!     if owner_id.is_empty() {
//!         return Err(AppError::validation("owner id is empty"));
//!     }
//!     Ok(())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;
