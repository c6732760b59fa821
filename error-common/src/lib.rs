//! Common error handling utilities for the job board backend
//!
//! Every failure that crosses the authentication core ends up as one
//! [`ErrorKind`]. The kind decides the HTTP status and the stable machine
//! code; the human message is chosen by the producer and never carries
//! internal details.
//!
//! # Example
//!
//! ```rust
//! use error_common::{ErrorBody, ErrorKind};
//!
//! let body = ErrorBody::new(ErrorKind::Unauthorized, "Refresh token missing.")
//!     .with_request_id("5f0c8e9a");
//!
//! assert_eq!(body.error.code, "UNAUTHORIZED");
//! assert_eq!(ErrorKind::Unauthorized.status_code(), 401);
//! ```

pub mod codes;
pub mod context;
pub mod types;

pub use context::*;
pub use types::*;
