//! In-memory record store and catalog for testing and development

use crate::binset::model::Binset;
use crate::binset::store::{BinsetStore, RowStream};
use crate::catalog::{BinProperty, BinSize, CatalogLookup};
use crate::core::{Record, StorageError};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

struct TableState<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

/// A single table keyed by sequential ids starting at 1.
///
/// Uses RwLock for thread-safe access; clones share the same rows.
pub struct InMemoryTable<T> {
    state: Arc<RwLock<TableState<T>>>,
}

impl<T> Clone for InMemoryTable<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Record> Default for InMemoryTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> InMemoryTable<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(TableState {
                rows: BTreeMap::new(),
                next_id: 1,
            })),
        }
    }

    /// Insert a row, assigning the next id
    pub fn insert(&self, mut row: T) -> Result<T, StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::Poisoned(T::table_name()))?;

        let id = state.next_id;
        state.next_id += 1;
        row.set_id(id);
        state.rows.insert(id, row.clone());

        Ok(row)
    }

    /// Replace an existing row
    pub fn save(&self, row: T) -> Result<T, StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::Poisoned(T::table_name()))?;

        let slot = state.rows.get_mut(&row.id()).ok_or(StorageError::MissingRow {
            table: T::table_name(),
            id: row.id(),
        })?;
        *slot = row.clone();

        Ok(row)
    }

    /// Rows matching `predicate`, in id order
    pub fn select(&self, predicate: impl Fn(&T) -> bool) -> Result<Vec<T>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::Poisoned(T::table_name()))?;

        Ok(state.rows.values().filter(|r| predicate(r)).cloned().collect())
    }

    /// Whether any row matches `predicate`
    pub fn any(&self, predicate: impl Fn(&T) -> bool) -> Result<bool, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::Poisoned(T::table_name()))?;

        Ok(state.rows.values().any(predicate))
    }

    /// Ids of rows matching `predicate`, in id order
    fn select_ids(&self, predicate: impl Fn(&T) -> bool) -> Result<Vec<i64>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::Poisoned(T::table_name()))?;

        Ok(state
            .rows
            .iter()
            .filter(|(_, r)| predicate(r))
            .map(|(id, _)| *id)
            .collect())
    }

    fn get(&self, id: i64) -> Result<Option<T>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::Poisoned(T::table_name()))?;

        Ok(state.rows.get(&id).cloned())
    }
}

/// In-memory binset store
#[derive(Clone, Default)]
pub struct InMemoryBinsetStore {
    table: InMemoryTable<Binset>,
}

impl InMemoryBinsetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BinsetStore for InMemoryBinsetStore {
    async fn list_live(&self, openid: &str) -> Result<Vec<Binset>, StorageError> {
        self.table.select(|b| b.is_live_for(openid))
    }

    async fn get_live(&self, openid: &str, id: i64) -> Result<Option<Binset>, StorageError> {
        Ok(self.table.get(id)?.filter(|b| b.is_live_for(openid)))
    }

    async fn name_taken(&self, openid: &str, bin_name: &str) -> Result<bool, StorageError> {
        self.table
            .any(|b| b.is_live_for(openid) && b.bin_name == bin_name)
    }

    async fn insert(&self, binset: Binset) -> Result<Binset, StorageError> {
        self.table.insert(binset)
    }

    async fn save(&self, binset: Binset) -> Result<Binset, StorageError> {
        self.table.save(binset)
    }

    async fn stream_live(&self, openid: &str) -> Result<RowStream, StorageError> {
        // Snapshot the matching ids; each row is fetched only when polled.
        let ids = self.table.select_ids(|b| b.is_live_for(openid))?;
        let table = self.table.clone();
        let openid = openid.to_string();

        let rows = futures::stream::iter(ids).filter_map(move |id| {
            let row = table
                .get(id)
                .map(|row| row.filter(|b| b.is_live_for(&openid)))
                .transpose();
            futures::future::ready(row)
        });

        Ok(rows.boxed())
    }
}

/// In-memory bin size and bin property catalogs
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    sizes: InMemoryTable<BinSize>,
    properties: InMemoryTable<BinProperty>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a live bin size entry
    pub fn add_bin_size(
        &self,
        openid: impl Into<String>,
        bin_size: impl Into<String>,
    ) -> Result<BinSize, StorageError> {
        self.sizes.insert(BinSize::new(openid, bin_size))
    }

    /// Add a live bin property entry
    pub fn add_bin_property(
        &self,
        openid: impl Into<String>,
        bin_property: impl Into<String>,
    ) -> Result<BinProperty, StorageError> {
        self.properties.insert(BinProperty::new(openid, bin_property))
    }

    /// Soft-delete every bin size entry of `openid` named `bin_size`
    pub fn delete_bin_size(&self, openid: &str, bin_size: &str) -> Result<usize, StorageError> {
        let rows = self
            .sizes
            .select(|s| s.is_live_for(openid) && s.bin_size == bin_size)?;
        let count = rows.len();
        for mut row in rows {
            row.soft_delete();
            self.sizes.save(row)?;
        }
        Ok(count)
    }

    /// Soft-delete every bin property entry of `openid` named `bin_property`
    pub fn delete_bin_property(
        &self,
        openid: &str,
        bin_property: &str,
    ) -> Result<usize, StorageError> {
        let rows = self
            .properties
            .select(|p| p.is_live_for(openid) && p.bin_property == bin_property)?;
        let count = rows.len();
        for mut row in rows {
            row.soft_delete();
            self.properties.save(row)?;
        }
        Ok(count)
    }
}

#[async_trait]
impl CatalogLookup for InMemoryCatalog {
    async fn bin_size_exists(&self, openid: &str, bin_size: &str) -> Result<bool, StorageError> {
        self.sizes
            .any(|s| s.is_live_for(openid) && s.bin_size == bin_size)
    }

    async fn bin_property_exists(
        &self,
        owners: &[&str],
        bin_property: &str,
    ) -> Result<bool, StorageError> {
        self.properties.any(|p| {
            owners.iter().any(|owner| p.is_live_for(owner)) && p.bin_property == bin_property
        })
    }
}
