//! Collaborator services
//!
//! The engine owns no state. Cart state lives in the cart store, product data
//! in the catalog, variant assignment in the experiment system. Each seam is a
//! trait with an in-memory adapter (tests, dry runs) and, where the engine
//! talks to a network service, a `reqwest` adapter.

pub mod cart_store;
pub mod catalog;
pub mod experiment;
pub mod http_cart;
pub mod memory_cart;

pub use cart_store::CartStore;
pub use catalog::{Catalog, HttpCatalog, MemoryCatalog};
pub use experiment::{ExperimentAssignment, StaticAssignment};
pub use http_cart::HttpCartStore;
pub use memory_cart::MemoryCartStore;

use reqwest::StatusCode;
use shared::error::{AppError, ErrorCode};
use std::time::Duration;

/// Build a `reqwest` client with a request timeout
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))
}

/// Map a transport failure onto the unified error codes
pub(crate) fn transport_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::with_message(ErrorCode::TimeoutError, err.to_string())
    } else if err.is_decode() {
        AppError::invalid_format(err.to_string())
    } else {
        AppError::network(err.to_string())
    }
}

/// Map a non-success status onto the unified error codes
pub(crate) fn status_error(status: StatusCode, body: String) -> AppError {
    let code = match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ErrorCode::InvalidRequest,
        StatusCode::NOT_FOUND => ErrorCode::NotFound,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ErrorCode::TimeoutError,
        s if s == StatusCode::TOO_MANY_REQUESTS || s.is_server_error() => ErrorCode::NetworkError,
        _ => ErrorCode::InternalError,
    };
    let message = if body.trim().is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("HTTP {}: {}", status, body.trim())
    };
    AppError::with_message(code, message).with_detail("status", status.as_u16())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = status_error(StatusCode::SERVICE_UNAVAILABLE, String::new());
        assert_eq!(err.code, ErrorCode::NetworkError);
        assert!(err.is_retryable());
        assert_eq!(err.message, "HTTP 503 Service Unavailable");

        let err = status_error(StatusCode::UNPROCESSABLE_ENTITY, "bad line".into());
        assert_eq!(err.code, ErrorCode::InvalidRequest);
        assert!(!err.is_retryable());
        assert!(err.message.ends_with("bad line"));

        assert_eq!(
            status_error(StatusCode::TOO_MANY_REQUESTS, String::new()).code,
            ErrorCode::NetworkError
        );
        assert_eq!(
            status_error(StatusCode::FORBIDDEN, String::new()).code,
            ErrorCode::InternalError
        );
    }
}
