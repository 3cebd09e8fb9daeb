//! Typed error handling for the binset service
//!
//! Every failure a request can hit is a variant of [`ApiError`]. Each one
//! renders as a JSON body with a human-readable `detail` field, which is the
//! only contract clients rely on.
//!
//! # Error Categories
//!
//! - Admission failures raised by the write rules ([`ApiError::Duplicate`],
//!   [`ApiError::SizeUnavailable`], [`ApiError::PropertyUnavailable`],
//!   [`ApiError::NotYours`])
//! - [`ValidationError`]: malformed or missing request fields
//! - [`StorageError`]: record store and catalog failures
//! - Request routing failures ([`ApiError::NotFound`],
//!   [`ApiError::MethodNotAllowed`], [`ApiError::InvalidPage`],
//!   [`ApiError::NotAuthenticated`])
//!
//! # Example
//!
//! ```rust,ignore
//! match controller.create(&caller, payload).await {
//!     Ok(row) => println!("created {}", row.id),
//!     Err(ApiError::Duplicate) => println!("name already used"),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// The main error type for the binset service
#[derive(Debug)]
pub enum ApiError {
    /// A live binset with the same (openid, bin_name) already exists
    Duplicate,

    /// No live bin size catalog entry for this owner
    SizeUnavailable,

    /// No live bin property catalog entry for this owner or the system owner
    PropertyUnavailable,

    /// The target row belongs to another owner
    NotYours {
        /// Verb used in the message ("update", "partial_update", "delete")
        action: &'static str,
    },

    /// Request body or query parameters failed validation
    Validation(ValidationError),

    /// The resource does not support this HTTP method
    MethodNotAllowed { method: String },

    /// The row does not exist or is not visible to the caller
    NotFound,

    /// The requested page is outside the result set
    InvalidPage,

    /// The caller has no identity and the action needs one
    NotAuthenticated,

    /// Storage backend errors
    Storage(StorageError),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Duplicate => write!(f, "Data exists"),
            ApiError::SizeUnavailable => {
                write!(f, "Bin size does not exists or it has been changed")
            }
            ApiError::PropertyUnavailable => {
                write!(f, "Bin property does not exists or it has been changed")
            }
            ApiError::NotYours { action } => {
                write!(f, "Cannot {} data which not yours", action)
            }
            ApiError::Validation(e) => write!(f, "{}", e),
            ApiError::MethodNotAllowed { method } => {
                write!(f, "Method \"{}\" not allowed.", method)
            }
            ApiError::NotFound => write!(f, "Not found."),
            ApiError::InvalidPage => write!(f, "Invalid page."),
            ApiError::NotAuthenticated => {
                write!(f, "Authentication credentials were not provided.")
            }
            ApiError::Storage(e) => write!(f, "{}", e),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Validation(e) => Some(e),
            ApiError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub detail: String,

    /// Field-level messages for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Duplicate
            | ApiError::SizeUnavailable
            | ApiError::PropertyUnavailable
            | ApiError::NotYours { .. }
            | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::NotFound | ApiError::InvalidPage => StatusCode::NOT_FOUND,
            ApiError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        let fields = match self {
            ApiError::Validation(ValidationError::FieldErrors(errors)) => Some(errors.clone()),
            _ => None,
        };

        ErrorResponse {
            detail: self.to_string(),
            fields,
        }
    }

    pub fn method_not_allowed(method: impl Into<String>) -> Self {
        ApiError::MethodNotAllowed {
            method: method.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Field name -> messages, ordered by field name
    FieldErrors(BTreeMap<String, Vec<String>>),

    /// Request body is not valid JSON for the expected shape
    InvalidJson { message: String },
}

impl ValidationError {
    /// Build a single-field error
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.into(), vec![message.into()]);
        ValidationError::FieldErrors(errors)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::FieldErrors(errors) => {
                let msgs: Vec<String> = errors
                    .iter()
                    .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
                    .collect();
                write!(f, "Validation errors: {}", msgs.join(", "))
            }
            ValidationError::InvalidJson { message } => {
                write!(f, "Invalid JSON: {}", message)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| match &e.message {
                        Some(message) => message.to_string(),
                        None => e.code.to_string(),
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        ValidationError::FieldErrors(fields)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.into())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Validation(ValidationError::InvalidJson {
            message: err.to_string(),
        })
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors raised by record stores and catalog lookups
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Query execution error
    #[error("{backend} query error: {message}")]
    QueryError { backend: String, message: String },

    /// A row that must exist was not found during a write
    #[error("{table} row {id} disappeared during write")]
    MissingRow { table: &'static str, id: i64 },

    /// Lock poisoned by a panicking writer
    #[error("Failed to acquire {0} lock")]
    Poisoned(&'static str),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Storage(err)
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::QueryError {
            backend: "postgres".to_string(),
            message: err.to_string(),
        }
    }
}
