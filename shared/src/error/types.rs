//! Error types

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// This is the error type returned by every collaborator seam (cart store,
/// catalog), providing:
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details for debugging
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (field-level errors, context, etc.)
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Category of this error's code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from(self.code)
    }

    /// Whether retrying the failed call may succeed
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    /// Create a cart not found error
    pub fn cart_not_found(cart_id: impl Into<String>) -> Self {
        let id = cart_id.into();
        Self::with_message(ErrorCode::CartNotFound, format!("Cart {} not found", id))
            .with_detail("cart_id", id)
    }

    /// Create a cart mutation error
    pub fn cart_mutation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::CartMutationFailed, msg)
    }

    /// Create a catalog unavailable error
    pub fn catalog_unavailable(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::CatalogUnavailable, msg)
    }

    /// Create a catalog timeout error
    pub fn catalog_timeout(handle: impl Into<String>) -> Self {
        let h = handle.into();
        Self::with_message(
            ErrorCode::CatalogTimeout,
            format!("Catalog lookup for {} timed out", h),
        )
        .with_detail("handle", h)
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::NetworkError, msg)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ConfigError, msg)
    }

    /// Create an invalid format error
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidFormat, msg)
    }
}

impl From<ErrorCode> for AppError {
    fn from(code: ErrorCode) -> Self {
        Self::new(code)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_format(err.to_string())
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_message() {
        let err = AppError::new(ErrorCode::CartNotFound);
        assert_eq!(err.message, "Cart not found");
        assert_eq!(err.category(), ErrorCategory::Cart);
        assert!(err.details.is_none());
    }

    #[test]
    fn test_with_detail() {
        let err = AppError::cart_not_found("gid://cart/1");
        assert_eq!(err.code, ErrorCode::CartNotFound);
        let details = err.details.unwrap();
        assert_eq!(details.get("cart_id"), Some(&Value::from("gid://cart/1")));
    }

    #[test]
    fn test_catalog_timeout_is_retryable() {
        let err = AppError::catalog_timeout("sunnies");
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "Catalog lookup for sunnies timed out");
    }
}
