//! Core module containing fundamental traits and types for the service

pub mod auth;
pub mod entity;
pub mod error;
pub mod field;
pub mod query;

pub use auth::{AuthContext, AuthProvider, Caller, NoAuthProvider, StaticTokenAuthProvider};
pub use entity::Record;
pub use error::{ApiError, StorageError, ValidationError};
pub use field::{FieldKind, FieldValue, Filterable};
pub use query::{ListQuery, Page};
