//! Binset resource controller
//!
//! Transport-independent implementation of every binset action. Handlers
//! resolve the caller and decode the body; everything else happens here.

use super::export::{self, CsvStream, Locale};
use super::model::Binset;
use super::rules;
use super::shape::{Action, Payload};
use super::store::{BinsetStore, RowStream};
use crate::catalog::CatalogLookup;
use crate::config::ListConfig;
use crate::core::{ApiError, AuthContext, ListQuery, Page, Record};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;

/// Owner-scoped CRUD and export over one binset store
pub struct BinsetController {
    store: Arc<dyn BinsetStore>,
    catalog: Arc<dyn CatalogLookup>,
    list_config: ListConfig,
}

impl BinsetController {
    pub fn new(
        store: Arc<dyn BinsetStore>,
        catalog: Arc<dyn CatalogLookup>,
        list_config: ListConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            list_config,
        }
    }

    /// Filtered, ordered page of the caller's live rows
    pub async fn list(
        &self,
        caller: &AuthContext,
        params: &HashMap<String, String>,
    ) -> Result<Page<Binset>, ApiError> {
        let query = ListQuery::parse::<Binset>(params, &self.list_config)?;

        let rows = match caller.openid() {
            Some(openid) => self.store.list_live(openid).await?,
            None => Vec::new(),
        };

        query.apply(rows)
    }

    /// One live row of the caller
    pub async fn retrieve(&self, caller: &AuthContext, id: i64) -> Result<Binset, ApiError> {
        let openid = caller.openid().ok_or(ApiError::NotFound)?;
        self.store
            .get_live(openid, id)
            .await?
            .ok_or(ApiError::NotFound)
    }

    /// Insert a row owned by the caller
    pub async fn create(&self, caller: &AuthContext, payload: Payload) -> Result<Binset, ApiError> {
        let openid = caller.openid().ok_or(ApiError::NotAuthenticated)?;
        let draft = payload.into_draft(None)?;

        rules::admit_create(self.store.as_ref(), self.catalog.as_ref(), openid, &draft).await?;

        let row = self.store.insert(Binset::new(openid, draft)).await?;
        tracing::info!(id = row.id, openid, bin_name = %row.bin_name, "binset created");
        Ok(row)
    }

    /// Full (`Action::Update`) or partial (`Action::PartialUpdate`) update
    ///
    /// The row is looked up before `body` is decoded, so a missing row wins
    /// over a malformed body.
    pub async fn update(
        &self,
        caller: &AuthContext,
        action: Action,
        id: i64,
        body: &[u8],
    ) -> Result<Binset, ApiError> {
        let mut row = self.retrieve(caller, id).await?;
        let openid = caller.openid().ok_or(ApiError::NotFound)?;
        rules::ensure_owner(&row, openid, action)?;

        let payload = action.shape().decode(body)?;
        let draft = payload.into_draft(Some(row.draft()))?;
        rules::admit_write(self.catalog.as_ref(), openid, &draft).await?;

        row.apply(draft);
        row.touch();
        let row = self.store.save(row).await?;
        tracing::info!(id = row.id, openid, action = %action, "binset updated");
        Ok(row)
    }

    /// Soft-delete a row, returning it as stored
    pub async fn destroy(&self, caller: &AuthContext, id: i64) -> Result<Binset, ApiError> {
        let mut row = self.retrieve(caller, id).await?;
        let openid = caller.openid().ok_or(ApiError::NotFound)?;
        rules::ensure_owner(&row, openid, Action::Destroy)?;

        row.soft_delete();
        let row = self.store.save(row).await?;
        tracing::info!(id = row.id, openid, "binset deleted");
        Ok(row)
    }

    /// Lazily rendered CSV of the caller's live rows
    pub async fn export(&self, caller: &AuthContext, locale: Locale) -> Result<CsvStream, ApiError> {
        let rows: RowStream = match caller.openid() {
            Some(openid) => self.store.stream_live(openid).await?,
            None => stream::empty().boxed(),
        };

        tracing::debug!(?locale, "binset export started");
        Ok(export::render(locale, rows))
    }
}

#[cfg(all(test, feature = "in-memory"))]
mod tests {
    use super::*;
    use crate::binset::model::BinsetPost;
    use crate::catalog::SYSTEM_OWNER;
    use crate::storage::{InMemoryBinsetStore, InMemoryCatalog};

    fn controller() -> (BinsetController, InMemoryCatalog) {
        let catalog = InMemoryCatalog::new();
        catalog.add_bin_size("owner-a", "S1").unwrap();
        catalog.add_bin_size("owner-a", "S2").unwrap();
        catalog.add_bin_property("owner-a", "P1").unwrap();
        catalog.add_bin_property(SYSTEM_OWNER, "Normal").unwrap();

        let controller = BinsetController::new(
            Arc::new(InMemoryBinsetStore::new()),
            Arc::new(catalog.clone()),
            ListConfig::default(),
        );
        (controller, catalog)
    }

    fn post(name: &str, size: &str, property: &str) -> Payload {
        Payload::Post(BinsetPost {
            bin_name: Some(name.to_string()),
            bin_size: Some(size.to_string()),
            bin_property: Some(property.to_string()),
        })
    }

    fn owner_a() -> AuthContext {
        AuthContext::user("owner-a")
    }

    #[tokio::test]
    async fn test_create_injects_owner() {
        let (controller, _) = controller();

        let row = controller
            .create(&owner_a(), post("A-01", "S1", "P1"))
            .await
            .unwrap();

        assert_eq!(row.id, 1);
        assert_eq!(row.openid, "owner-a");
        assert!(!row.is_delete);
    }

    #[tokio::test]
    async fn test_anonymous_create_is_rejected() {
        let (controller, _) = controller();

        let err = controller
            .create(&AuthContext::Anonymous, post("A-01", "S1", "P1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_rejected_create_persists_nothing() {
        let (controller, _) = controller();

        let err = controller
            .create(&owner_a(), post("A-01", "S9", "P1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::SizeUnavailable));

        let page = controller.list(&owner_a(), &HashMap::new()).await.unwrap();
        assert_eq!(page.count, 0);
    }

    #[tokio::test]
    async fn test_partial_update_checks_merged_row() {
        let (controller, catalog) = controller();
        let row = controller
            .create(&owner_a(), post("A-01", "S1", "P1"))
            .await
            .unwrap();

        // The stored property disappears; a patch touching only the size
        // still has to pass the property check.
        catalog.delete_bin_property("owner-a", "P1").unwrap();
        let err = controller
            .update(
                &owner_a(),
                Action::PartialUpdate,
                row.id,
                br#"{"bin_size": "S2"}"#,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::PropertyUnavailable));

        let updated = controller
            .update(
                &owner_a(),
                Action::PartialUpdate,
                row.id,
                br#"{"bin_size": "S2", "bin_property": "Normal"}"#,
            )
            .await
            .unwrap();
        assert_eq!(updated.bin_name, "A-01");
        assert_eq!(updated.bin_size, "S2");
        assert!(updated.update_time >= row.update_time);
    }

    #[tokio::test]
    async fn test_foreign_rows_are_not_found() {
        let (controller, _) = controller();
        let row = controller
            .create(&owner_a(), post("A-01", "S1", "P1"))
            .await
            .unwrap();

        let owner_b = AuthContext::user("owner-b");
        assert!(matches!(
            controller.retrieve(&owner_b, row.id).await,
            Err(ApiError::NotFound)
        ));
        assert!(matches!(
            controller.destroy(&owner_b, row.id).await,
            Err(ApiError::NotFound)
        ));
        assert!(matches!(
            controller.retrieve(&AuthContext::Anonymous, row.id).await,
            Err(ApiError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_missing_row_wins_over_bad_body() {
        let (controller, _) = controller();

        let err = controller
            .update(&owner_a(), Action::Update, 99, b"{not json")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[tokio::test]
    async fn test_destroy_hides_row() {
        let (controller, _) = controller();
        let row = controller
            .create(&owner_a(), post("A-01", "S1", "P1"))
            .await
            .unwrap();

        let deleted = controller.destroy(&owner_a(), row.id).await.unwrap();
        assert!(deleted.is_delete);

        let page = controller.list(&owner_a(), &HashMap::new()).await.unwrap();
        assert!(page.results.is_empty());
        assert!(matches!(
            controller.destroy(&owner_a(), row.id).await,
            Err(ApiError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_export_counts_live_rows() {
        let (controller, _) = controller();
        for name in ["A", "B", "C"] {
            controller
                .create(&owner_a(), post(name, "S1", "P1"))
                .await
                .unwrap();
        }
        controller.destroy(&owner_a(), 2).await.unwrap();

        let lines: Vec<String> = controller
            .export(&owner_a(), Locale::English)
            .await
            .unwrap()
            .map(|line| line.unwrap())
            .collect()
            .await;
        assert_eq!(lines.len(), 3);

        let anonymous: Vec<_> = controller
            .export(&AuthContext::Anonymous, Locale::English)
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(anonymous.len(), 1);
    }
}
