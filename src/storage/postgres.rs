//! PostgreSQL storage backend using sqlx.
//!
//! Provides `PostgresBinsetStore` and `PostgresCatalog` backed by a
//! PostgreSQL database via `sqlx::PgPool`.
//!
//! # Feature flag
//!
//! This module is gated behind the `postgres` feature flag:
//! ```toml
//! [dependencies]
//! binset-rs = { version = "0.1", features = ["postgres"] }
//! ```

use crate::binset::model::Binset;
use crate::binset::store::{BinsetStore, RowStream};
use crate::catalog::CatalogLookup;
use crate::core::StorageError;
use async_trait::async_trait;
use futures::StreamExt;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Rows buffered between the export cursor and the response body
const STREAM_BUFFER: usize = 64;

const BINSET_COLUMNS: &str =
    "id, openid, bin_name, bin_size, bin_property, is_delete, create_time, update_time";

/// Create the binset, binsize and binproperty tables if they are missing.
///
/// No unique index on (openid, bin_name); duplicate names are rejected by
/// the write rules.
pub async fn migrate(pool: &PgPool) -> Result<(), StorageError> {
    const TABLES: [&str; 3] = [
        r#"CREATE TABLE IF NOT EXISTS binset (
            id BIGSERIAL PRIMARY KEY,
            openid VARCHAR(255) NOT NULL,
            bin_name VARCHAR(255) NOT NULL,
            bin_size VARCHAR(255) NOT NULL,
            bin_property VARCHAR(255) NOT NULL,
            is_delete BOOLEAN NOT NULL DEFAULT FALSE,
            create_time TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            update_time TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"#,
        r#"CREATE TABLE IF NOT EXISTS binsize (
            id BIGSERIAL PRIMARY KEY,
            openid VARCHAR(255) NOT NULL,
            bin_size VARCHAR(255) NOT NULL,
            is_delete BOOLEAN NOT NULL DEFAULT FALSE,
            create_time TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            update_time TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"#,
        r#"CREATE TABLE IF NOT EXISTS binproperty (
            id BIGSERIAL PRIMARY KEY,
            openid VARCHAR(255) NOT NULL,
            bin_property VARCHAR(255) NOT NULL,
            is_delete BOOLEAN NOT NULL DEFAULT FALSE,
            create_time TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            update_time TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"#,
    ];

    for statement in TABLES {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("binset tables ready");
    Ok(())
}

/// Binset record store backed by PostgreSQL.
#[derive(Clone, Debug)]
pub struct PostgresBinsetStore {
    pool: PgPool,
}

impl PostgresBinsetStore {
    /// Create a new `PostgresBinsetStore` with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BinsetStore for PostgresBinsetStore {
    async fn list_live(&self, openid: &str) -> Result<Vec<Binset>, StorageError> {
        let sql = format!(
            "SELECT {} FROM binset WHERE openid = $1 AND is_delete = FALSE ORDER BY id",
            BINSET_COLUMNS
        );
        let rows = sqlx::query_as::<_, Binset>(&sql)
            .bind(openid)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_live(&self, openid: &str, id: i64) -> Result<Option<Binset>, StorageError> {
        let sql = format!(
            "SELECT {} FROM binset WHERE openid = $1 AND id = $2 AND is_delete = FALSE",
            BINSET_COLUMNS
        );
        let row = sqlx::query_as::<_, Binset>(&sql)
            .bind(openid)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn name_taken(&self, openid: &str, bin_name: &str) -> Result<bool, StorageError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM binset WHERE openid = $1 AND bin_name = $2 AND is_delete = FALSE)",
        )
        .bind(openid)
        .bind(bin_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn insert(&self, binset: Binset) -> Result<Binset, StorageError> {
        let sql = format!(
            "INSERT INTO binset (openid, bin_name, bin_size, bin_property, is_delete, create_time, update_time) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            BINSET_COLUMNS
        );
        let row = sqlx::query_as::<_, Binset>(&sql)
            .bind(&binset.openid)
            .bind(&binset.bin_name)
            .bind(&binset.bin_size)
            .bind(&binset.bin_property)
            .bind(binset.is_delete)
            .bind(binset.create_time)
            .bind(binset.update_time)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn save(&self, binset: Binset) -> Result<Binset, StorageError> {
        let sql = format!(
            "UPDATE binset SET bin_name = $2, bin_size = $3, bin_property = $4, is_delete = $5, update_time = $6 \
             WHERE id = $1 RETURNING {}",
            BINSET_COLUMNS
        );
        sqlx::query_as::<_, Binset>(&sql)
            .bind(binset.id)
            .bind(&binset.bin_name)
            .bind(&binset.bin_size)
            .bind(&binset.bin_property)
            .bind(binset.is_delete)
            .bind(binset.update_time)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::MissingRow {
                table: "binset",
                id: binset.id,
            })
    }

    async fn stream_live(&self, openid: &str) -> Result<RowStream, StorageError> {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let pool = self.pool.clone();
        let openid = openid.to_string();

        // The cursor lives in its own task; the receiver side is what the
        // response body polls.
        tokio::spawn(async move {
            let sql = format!(
                "SELECT {} FROM binset WHERE openid = $1 AND is_delete = FALSE ORDER BY id",
                BINSET_COLUMNS
            );
            let mut rows = sqlx::query_as::<_, Binset>(&sql).bind(&openid).fetch(&pool);

            while let Some(row) = rows.next().await {
                let row = row.map_err(StorageError::from);
                let failed = row.is_err();
                if tx.send(row).await.is_err() {
                    tracing::debug!(openid = %openid, "export receiver dropped, closing cursor");
                    break;
                }
                if failed {
                    break;
                }
            }
        });

        Ok(ReceiverStream::new(rx).boxed())
    }
}

/// Bin size / bin property catalog backed by PostgreSQL.
#[derive(Clone, Debug)]
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    /// Create a new `PostgresCatalog` with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogLookup for PostgresCatalog {
    async fn bin_size_exists(&self, openid: &str, bin_size: &str) -> Result<bool, StorageError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM binsize WHERE openid = $1 AND bin_size = $2 AND is_delete = FALSE)",
        )
        .bind(openid)
        .bind(bin_size)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn bin_property_exists(
        &self,
        owners: &[&str],
        bin_property: &str,
    ) -> Result<bool, StorageError> {
        let owners: Vec<String> = owners.iter().map(|o| o.to_string()).collect();
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM binproperty WHERE openid = ANY($1) AND bin_property = $2 AND is_delete = FALSE)",
        )
        .bind(owners)
        .bind(bin_property)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
