//! # Error Types
//!
//! The domain error taxonomy and the structured response envelope.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  DomainError (this module)  ← business-rule failures, typed            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (gstbill-db)       ← wraps sqlx failures, carries             │
//! │       │                       DomainError transparently                 │
//! │       ▼                                                                 │
//! │  ApiResponse (this module)  ← `{ok, data}` / `{ok, errorKind,          │
//! │                               message}`, the only shapes a caller      │
//! │                               ever sees; nothing is thrown raw         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. `thiserror` derives, never manual `Display` impls
//! 2. Errors carry context (product name, available stock, both category
//!    names) so user-facing messages can name the offending entity
//! 3. Every variant maps to exactly one machine-readable [`ErrorKind`]

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Domain Error
// =============================================================================

/// Business-rule and validation failures.
///
/// Detected before any mutation wherever possible; the billing engine
/// additionally rolls back its transaction when one of these (or a storage
/// failure) occurs mid-flight.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed or missing request fields.
    #[error("{message}")]
    InvalidInput { message: String },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The entity exists but its active flag is off.
    #[error("{entity} \"{name}\" is not available")]
    Unavailable { entity: String, name: String },

    /// Requested quantity exceeds available stock.
    ///
    /// Always names the specific product or variant, never just "cart
    /// invalid".
    #[error("Insufficient stock for \"{name}\": available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Cart category-mixing rejected. Carries both category names so the
    /// caller can show what clashed with what.
    #[error(
        "Cannot mix categories: cart contains items from \"{in_cart}\", \
         attempted to add from \"{attempted}\". Clear the cart first."
    )]
    CategoryConflict { in_cart: String, attempted: String },

    /// Duplicate unique key, or a state toggle that is already in the
    /// target state.
    #[error("{message}")]
    Conflict { message: String },

    /// Lock contention or a stuck transaction; safe to retry.
    #[error("Operation timed out: {message}")]
    Timeout { message: String },

    /// Unexpected failure.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        DomainError::InvalidInput { message: message.into() }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DomainError::NotFound { entity: entity.into(), id: id.into() }
    }

    pub fn unavailable(entity: impl Into<String>, name: impl Into<String>) -> Self {
        DomainError::Unavailable { entity: entity.into(), name: name.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        DomainError::Conflict { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        DomainError::Internal { message: message.into() }
    }

    /// The machine-readable kind for the response envelope.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::InvalidInput { .. } => ErrorKind::InvalidInput,
            DomainError::NotFound { .. } => ErrorKind::NotFound,
            DomainError::Unavailable { .. } => ErrorKind::Unavailable,
            DomainError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            DomainError::CategoryConflict { .. } => ErrorKind::CategoryConflict,
            DomainError::Conflict { .. } => ErrorKind::Conflict,
            DomainError::Timeout { .. } => ErrorKind::Timeout,
            DomainError::Internal { .. } => ErrorKind::Internal,
        }
    }
}

// =============================================================================
// Error Kind
// =============================================================================

/// Machine-readable failure category, serialized into every error
/// envelope alongside the human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Unavailable,
    InsufficientStock,
    CategoryConflict,
    Conflict,
    Timeout,
    Internal,
}

// =============================================================================
// Response Envelope
// =============================================================================

/// The structured result every exposed operation resolves to.
///
/// Success: `{"ok": true, "data": ...}`.
/// Failure: `{"ok": false, "errorKind": "...", "message": "...",
/// "details": ...}`; callers never see an unstructured error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl<T> ApiResponse<T> {
    /// Wraps a successful payload.
    pub fn ok(data: T) -> Self {
        ApiResponse {
            ok: true,
            data: Some(data),
            error_kind: None,
            message: None,
            details: None,
        }
    }

    /// Wraps a domain failure.
    pub fn err(error: &DomainError) -> Self {
        let details = match error {
            DomainError::CategoryConflict { in_cart, attempted } => Some(serde_json::json!({
                "currentCategory": in_cart,
                "attemptedCategory": attempted,
            })),
            DomainError::InsufficientStock { name, available, requested } => {
                Some(serde_json::json!({
                    "name": name,
                    "available": available,
                    "requested": requested,
                }))
            }
            _ => None,
        };

        ApiResponse {
            ok: false,
            data: None,
            error_kind: Some(error.kind()),
            message: Some(error.to_string()),
            details,
        }
    }

    /// Wraps a failure from an already-classified kind (used by layers
    /// that wrap storage errors).
    pub fn err_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        ApiResponse {
            ok: false,
            data: None,
            error_kind: Some(kind),
            message: Some(message.into()),
            details: None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_names_the_product() {
        let err = DomainError::InsufficientStock {
            name: "Blue Pen".to_string(),
            available: 3,
            requested: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("Blue Pen"));
        assert!(msg.contains("available 3"));
        assert!(msg.contains("requested 5"));
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
    }

    #[test]
    fn test_category_conflict_names_both_categories() {
        let err = DomainError::CategoryConflict {
            in_cart: "Stationery".to_string(),
            attempted: "Hardware".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Stationery"));
        assert!(msg.contains("Hardware"));
    }

    #[test]
    fn test_envelope_ok_shape() {
        let resp = ApiResponse::ok(42);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["data"], 42);
        assert!(json.get("errorKind").is_none());
    }

    #[test]
    fn test_envelope_err_shape() {
        let err = DomainError::not_found("Product", "p-1");
        let resp = ApiResponse::<()>::err(&err);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["errorKind"], "notFound");
        assert_eq!(json["message"], "Product not found: p-1");
    }

    #[test]
    fn test_envelope_carries_conflict_details() {
        let err = DomainError::CategoryConflict {
            in_cart: "A".to_string(),
            attempted: "B".to_string(),
        };
        let resp = ApiResponse::<()>::err(&err);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["details"]["currentCategory"], "A");
        assert_eq!(json["details"]["attemptedCategory"], "B");
    }
}
