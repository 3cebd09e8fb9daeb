//! # binset
//!
//! An owner-scoped resource controller for warehouse bin sets: named
//! combinations of a bin size and a bin property, each belonging to one
//! account.
//!
//! ## Features
//!
//! - **Owner Scoping**: every read and write is limited to the caller's rows
//! - **Soft Delete**: deleted rows keep their data and disappear from views
//! - **Catalog Checks**: writes must reference live bin size / bin property
//!   entries
//! - **Filtering, Ordering, Pagination**: configurable via YAML
//! - **Streaming CSV Export**: Chinese or English headers, rows encoded lazily
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use binset::prelude::*;
//!
//! let catalog = InMemoryCatalog::new();
//! catalog.add_bin_size("owner-a", "S1")?;
//! catalog.add_bin_property(SYSTEM_OWNER, "Normal")?;
//!
//! ServerBuilder::new()
//!     .with_auth_provider(StaticTokenAuthProvider::default().with_token("t-1", "owner-a"))
//!     .with_binset_store(InMemoryBinsetStore::new())
//!     .with_catalog(catalog)
//!     .serve("127.0.0.1:8008")
//!     .await?;
//! ```

pub mod binset;
pub mod catalog;
pub mod config;
pub mod core;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        ApiError, AuthContext, AuthProvider, Caller, ListQuery, NoAuthProvider, Page, Record,
        StaticTokenAuthProvider, StorageError, ValidationError,
    };

    // === Binset ===
    pub use crate::binset::{
        Action, Binset, BinsetController, BinsetDescriptor, BinsetDraft, BinsetStore, Locale,
        Payload, Shape,
    };

    // === Catalog ===
    pub use crate::catalog::{BinProperty, BinSize, CatalogLookup, SYSTEM_OWNER};

    // === Storage ===
    #[cfg(feature = "in-memory")]
    pub use crate::storage::{InMemoryBinsetStore, InMemoryCatalog};
    #[cfg(feature = "postgres")]
    pub use crate::storage::{PostgresBinsetStore, PostgresCatalog};

    // === Config ===
    pub use crate::config::{ListConfig, ServerConfig};

    // === Server ===
    pub use crate::server::{EntityDescriptor, EntityRegistry, ServerBuilder};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
}
