//! Entity registry collecting resource descriptors and their routes

use axum::Router;
use std::collections::BTreeMap;

/// Trait that describes how to build routes for a resource
///
/// Each resource (binset, ...) implements this trait to contribute its
/// routes to the server.
pub trait EntityDescriptor: Send + Sync {
    /// The resource name (e.g., "binset")
    fn entity_type(&self) -> &str;

    /// The collection path (e.g., "/binset/")
    fn path(&self) -> &str;

    /// Build the routes for this resource, state already attached
    fn build_routes(&self) -> Router;
}

/// Registry for all resources served by the application
#[derive(Default)]
pub struct EntityRegistry {
    descriptors: BTreeMap<String, Box<dyn EntityDescriptor>>,
}

impl EntityRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            descriptors: BTreeMap::new(),
        }
    }

    /// Register an entity descriptor
    ///
    /// The entity type name is used as the key; registering the same type
    /// twice replaces the earlier descriptor.
    pub fn register(&mut self, descriptor: Box<dyn EntityDescriptor>) {
        let entity_type = descriptor.entity_type().to_string();
        tracing::debug!(entity_type = %entity_type, path = descriptor.path(), "registered resource");
        self.descriptors.insert(entity_type, descriptor);
    }

    /// Merge every registered resource's routes into one router
    pub fn build_routes(&self) -> Router {
        let mut router = Router::new();

        for descriptor in self.descriptors.values() {
            router = router.merge(descriptor.build_routes());
        }

        router
    }

    /// Get all registered entity types
    pub fn entity_types(&self) -> Vec<&str> {
        self.descriptors.keys().map(|s| s.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    /// Minimal mock EntityDescriptor for testing
    struct MockDescriptor {
        entity_type: String,
        path: String,
    }

    impl MockDescriptor {
        fn new(entity_type: &str, path: &str) -> Self {
            Self {
                entity_type: entity_type.to_string(),
                path: path.to_string(),
            }
        }
    }

    impl EntityDescriptor for MockDescriptor {
        fn entity_type(&self) -> &str {
            &self.entity_type
        }

        fn path(&self) -> &str {
            &self.path
        }

        fn build_routes(&self) -> Router {
            Router::new().route(&self.path, get(|| async { "ok" }))
        }
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry = EntityRegistry::new();
        assert!(registry.entity_types().is_empty());
    }

    #[test]
    fn test_register_multiple_entities() {
        let mut registry = EntityRegistry::new();
        registry.register(Box::new(MockDescriptor::new("binset", "/binset/")));
        registry.register(Box::new(MockDescriptor::new("binsize", "/binsize/")));
        assert_eq!(registry.entity_types(), vec!["binset", "binsize"]);
    }

    #[test]
    fn test_register_duplicate_replaces() {
        let mut registry = EntityRegistry::new();
        registry.register(Box::new(MockDescriptor::new("binset", "/binset/")));
        registry.register(Box::new(MockDescriptor::new("binset", "/bins/")));
        assert_eq!(registry.entity_types().len(), 1);
    }

    #[test]
    fn test_build_routes_with_entities() {
        let mut registry = EntityRegistry::new();
        registry.register(Box::new(MockDescriptor::new("binset", "/binset/")));
        registry.register(Box::new(MockDescriptor::new("binsize", "/binsize/")));
        let _router = registry.build_routes(); // Should not panic
    }
}
