//! The binset resource: a named bin size + bin property combination owned
//! by one account
//!
//! - [`model`]: the record and its request bodies
//! - [`shape`]: action to request-shape mapping
//! - [`rules`]: write admission checks
//! - [`store`]: the record store contract
//! - [`controller`]: the actions themselves
//! - [`export`]: CSV rendering
//! - [`handlers`] / [`descriptor`]: HTTP surface

pub mod controller;
pub mod descriptor;
pub mod export;
pub mod handlers;
pub mod model;
pub mod rules;
pub mod shape;
pub mod store;

pub use controller::BinsetController;
pub use descriptor::BinsetDescriptor;
pub use export::{ExportError, Locale};
pub use model::{Binset, BinsetDraft, BinsetPatch, BinsetPost, BinsetUpdate};
pub use shape::{Action, Payload, Shape};
pub use store::{BinsetStore, RowStream};
