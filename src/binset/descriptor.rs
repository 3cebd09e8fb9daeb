//! Entity descriptor for Binset

use super::controller::BinsetController;
use super::handlers::{
    BinsetAppState, create_binset, delete_binset, export_binsets, get_binset, list_binsets,
    method_not_allowed, partial_update_binset, update_binset,
};
use crate::core::AuthProvider;
use crate::server::EntityDescriptor;
use axum::{Router, routing::get};
use std::sync::Arc;

/// Descriptor for the Binset resource
pub struct BinsetDescriptor {
    pub controller: Arc<BinsetController>,
    pub auth: Arc<dyn AuthProvider>,
}

impl BinsetDescriptor {
    pub fn new(controller: Arc<BinsetController>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { controller, auth }
    }
}

impl EntityDescriptor for BinsetDescriptor {
    fn entity_type(&self) -> &str {
        "binset"
    }

    fn path(&self) -> &str {
        "/binset/"
    }

    fn build_routes(&self) -> Router {
        let state = BinsetAppState {
            controller: self.controller.clone(),
            auth: self.auth.clone(),
        };

        // `file/` is a literal segment and wins over `{id}`.
        Router::new()
            .route(
                "/binset/",
                get(list_binsets)
                    .post(create_binset)
                    .fallback(method_not_allowed),
            )
            .route(
                "/binset/file/",
                get(export_binsets).fallback(method_not_allowed),
            )
            .route(
                "/binset/{id}/",
                get(get_binset)
                    .put(update_binset)
                    .patch(partial_update_binset)
                    .delete(delete_binset)
                    .fallback(method_not_allowed),
            )
            .with_state(state)
    }
}
