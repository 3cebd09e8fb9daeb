//! Record store contract for binsets

use super::model::Binset;
use crate::core::StorageError;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Lazily produced rows, one at a time
pub type RowStream = BoxStream<'static, Result<Binset, StorageError>>;

/// Persistent binset table.
///
/// Every read is scoped to one owner and excludes soft-deleted rows. The
/// store is agnostic to the validation rules; it only answers and persists.
#[async_trait]
pub trait BinsetStore: Send + Sync {
    /// All live rows of `openid`
    async fn list_live(&self, openid: &str) -> Result<Vec<Binset>, StorageError>;

    /// One live row of `openid`
    async fn get_live(&self, openid: &str, id: i64) -> Result<Option<Binset>, StorageError>;

    /// Whether `openid` already has a live row named `bin_name`
    async fn name_taken(&self, openid: &str, bin_name: &str) -> Result<bool, StorageError>;

    /// Insert a new row, returning it with its assigned id
    async fn insert(&self, binset: Binset) -> Result<Binset, StorageError>;

    /// Persist every column of an existing row
    async fn save(&self, binset: Binset) -> Result<Binset, StorageError>;

    /// Live rows of `openid` as a lazy stream
    async fn stream_live(&self, openid: &str) -> Result<RowStream, StorageError>;
}
