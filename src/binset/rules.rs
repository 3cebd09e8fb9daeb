//! Write admission rules
//!
//! Checks run in a fixed order and stop at the first failure:
//! duplicate name (create only), bin size, bin property.

use super::model::{Binset, BinsetDraft};
use super::shape::Action;
use super::store::BinsetStore;
use crate::catalog::{CatalogLookup, SYSTEM_OWNER};
use crate::core::{ApiError, Record};

/// Admit a new row for `openid`
pub async fn admit_create(
    store: &dyn BinsetStore,
    catalog: &dyn CatalogLookup,
    openid: &str,
    draft: &BinsetDraft,
) -> Result<(), ApiError> {
    if store.name_taken(openid, &draft.bin_name).await? {
        tracing::debug!(openid, bin_name = %draft.bin_name, "rejected duplicate bin name");
        return Err(ApiError::Duplicate);
    }

    admit_write(catalog, openid, draft).await
}

/// Check the catalog references of a create or update
pub async fn admit_write(
    catalog: &dyn CatalogLookup,
    openid: &str,
    draft: &BinsetDraft,
) -> Result<(), ApiError> {
    if !catalog.bin_size_exists(openid, &draft.bin_size).await? {
        tracing::debug!(openid, bin_size = %draft.bin_size, "bin size unavailable");
        return Err(ApiError::SizeUnavailable);
    }

    // System-owned properties are shared with every account.
    if !catalog
        .bin_property_exists(&[openid, SYSTEM_OWNER], &draft.bin_property)
        .await?
    {
        tracing::debug!(openid, bin_property = %draft.bin_property, "bin property unavailable");
        return Err(ApiError::PropertyUnavailable);
    }

    Ok(())
}

/// Reject writes to a row owned by someone else
pub fn ensure_owner(row: &Binset, openid: &str, action: Action) -> Result<(), ApiError> {
    if row.openid() != openid {
        tracing::warn!(id = row.id, action = %action, "write to foreign row rejected");
        return Err(ApiError::NotYours {
            action: action.verb(),
        });
    }
    Ok(())
}
