//! ServerBuilder for fluent API to build HTTP servers

use super::entity_registry::EntityRegistry;
use crate::binset::{BinsetController, BinsetDescriptor, BinsetStore};
use crate::catalog::CatalogLookup;
use crate::config::ServerConfig;
use crate::core::{AuthProvider, StaticTokenAuthProvider};
use anyhow::Result;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Builder for creating the binset HTTP server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_binset_store(InMemoryBinsetStore::new())
///     .with_catalog(catalog)
///     .build()?;
/// ```
pub struct ServerBuilder {
    config: ServerConfig,
    auth_provider: Option<Arc<dyn AuthProvider>>,
    binset_store: Option<Arc<dyn BinsetStore>>,
    catalog: Option<Arc<dyn CatalogLookup>>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder with the default configuration
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            auth_provider: None,
            binset_store: None,
            catalog: None,
            custom_routes: Vec::new(),
        }
    }

    /// Use a loaded configuration (list settings, token table)
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the auth provider
    ///
    /// Without one, a [`StaticTokenAuthProvider`] is built from the config's
    /// token table.
    pub fn with_auth_provider(mut self, provider: impl AuthProvider + 'static) -> Self {
        self.auth_provider = Some(Arc::new(provider));
        self
    }

    /// Set the binset record store (required)
    pub fn with_binset_store(mut self, store: impl BinsetStore + 'static) -> Self {
        self.binset_store = Some(Arc::new(store));
        self
    }

    /// Set the bin size / bin property catalog (required)
    pub fn with_catalog(mut self, catalog: impl CatalogLookup + 'static) -> Self {
        self.catalog = Some(Arc::new(catalog));
        self
    }

    /// Add custom routes to the server
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the final router
    ///
    /// Fails when the store or catalog is missing, or when the list
    /// settings cannot paginate.
    ///
    /// This generates:
    /// - Health check routes
    /// - Binset routes
    /// - Custom routes
    ///
    /// wrapped in a request tracing layer.
    pub fn build(self) -> Result<Router> {
        self.config.list.validate()?;

        let store = self.binset_store.ok_or_else(|| {
            anyhow::anyhow!("BinsetStore is required. Call .with_binset_store()")
        })?;
        let catalog = self
            .catalog
            .ok_or_else(|| anyhow::anyhow!("CatalogLookup is required. Call .with_catalog()"))?;
        let auth = match self.auth_provider {
            Some(provider) => provider,
            None => Arc::new(StaticTokenAuthProvider::new(self.config.tokens.clone())),
        };

        let controller = Arc::new(BinsetController::new(store, catalog, self.config.list));

        let mut registry = EntityRegistry::new();
        registry.register(Box::new(BinsetDescriptor::new(controller, auth)));

        let mut app = health_routes().merge(registry.build_routes());
        for custom_router in self.custom_routes {
            app = app.merge(custom_router);
        }

        Ok(app.layer(TraceLayer::new_for_http()))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    ///
    /// # Example
    ///
    /// ```ignore
    /// ServerBuilder::new()
    ///     .with_binset_store(store)
    ///     .with_catalog(catalog)
    ///     .serve("127.0.0.1:8008").await?;
    /// ```
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build health check routes
fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

/// Health check endpoint handler
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "binset-rs"
    }))
}

/// Wait for a shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}

#[cfg(all(test, feature = "in-memory"))]
mod tests {
    use super::*;
    use crate::core::NoAuthProvider;
    use crate::storage::{InMemoryBinsetStore, InMemoryCatalog};

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = ServerBuilder::new();
        assert!(builder.auth_provider.is_none());
        assert!(builder.binset_store.is_none());
        assert!(builder.catalog.is_none());
        assert!(builder.custom_routes.is_empty());
    }

    #[test]
    fn test_with_config_replaces_defaults() {
        let mut config = ServerConfig::default();
        config.list.page_size = 5;
        let builder = ServerBuilder::new().with_config(config);
        assert_eq!(builder.config.list.page_size, 5);
    }

    #[test]
    fn test_build_without_store_fails() {
        let result = ServerBuilder::new()
            .with_catalog(InMemoryCatalog::new())
            .build();
        let err = result.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(err.contains("BinsetStore is required"));
    }

    #[test]
    fn test_build_rejects_zero_page_size() {
        let mut config = ServerConfig::default();
        config.list.page_size = 0;

        let result = ServerBuilder::new()
            .with_config(config)
            .with_binset_store(InMemoryBinsetStore::new())
            .with_catalog(InMemoryCatalog::new())
            .build();
        let err = result.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(err.contains("page_size"));
    }

    #[test]
    fn test_build_without_catalog_fails() {
        let result = ServerBuilder::new()
            .with_binset_store(InMemoryBinsetStore::new())
            .build();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_health_route_responds() {
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use tower::ServiceExt;

        let app = ServerBuilder::new()
            .with_binset_store(InMemoryBinsetStore::new())
            .with_catalog(InMemoryCatalog::new())
            .build()
            .unwrap();

        let response = app
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_build_with_everything() {
        let result = ServerBuilder::new()
            .with_auth_provider(NoAuthProvider)
            .with_binset_store(InMemoryBinsetStore::new())
            .with_catalog(InMemoryCatalog::new())
            .with_custom_routes(Router::new().route("/ping", get(|| async { "pong" })))
            .build();
        assert!(result.is_ok());
    }
}
