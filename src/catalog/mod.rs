//! Bin size and bin property catalogs
//!
//! Binsets reference catalog entries by value rather than by foreign key, so
//! the reference is re-checked against the live catalog on every write.

use crate::core::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Owner of the shared default catalog entries
pub const SYSTEM_OWNER: &str = "init_data";

/// Bin size catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct BinSize {
    pub id: i64,
    pub openid: String,
    pub bin_size: String,
    pub is_delete: bool,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl BinSize {
    pub fn new(openid: impl Into<String>, bin_size: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            openid: openid.into(),
            bin_size: bin_size.into(),
            is_delete: false,
            create_time: now,
            update_time: now,
        }
    }
}

/// Bin property catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct BinProperty {
    pub id: i64,
    pub openid: String,
    pub bin_property: String,
    pub is_delete: bool,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl BinProperty {
    pub fn new(openid: impl Into<String>, bin_property: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            openid: openid.into(),
            bin_property: bin_property.into(),
            is_delete: false,
            create_time: now,
            update_time: now,
        }
    }
}

crate::core::entity::impl_record!(BinSize, "binsize");
crate::core::entity::impl_record!(BinProperty, "binproperty");

/// Existence checks against the live catalogs
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Whether `openid` owns a live bin size entry named `bin_size`
    async fn bin_size_exists(&self, openid: &str, bin_size: &str) -> Result<bool, StorageError>;

    /// Whether any of `owners` has a live bin property entry named `bin_property`
    async fn bin_property_exists(
        &self,
        owners: &[&str],
        bin_property: &str,
    ) -> Result<bool, StorageError>;
}
