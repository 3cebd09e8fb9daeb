//! Server module for assembling and serving the HTTP application
//!
//! [`ServerBuilder`] wires the record store, catalog and auth provider into
//! the resource controllers and merges every resource's routes, registered
//! through the [`EntityRegistry`], with the health routes.

pub mod builder;
pub mod entity_registry;

pub use builder::ServerBuilder;
pub use entity_registry::{EntityDescriptor, EntityRegistry};
