//! Tree Services
//!
//! This module contains the engine's service layer:
//!
//! - `TreeStateStore` - per-node interaction state, synced with the cache
//! - `visibility` - the pure visible-ordering resolver
//! - `ListTreeService` - move/reorder protocol and mutation dispatch
//!
//! Services coordinate between the entity cache, the tree state, and the
//! persistence backend, implementing the drop decision table and its
//! invariants.

pub mod error;
pub mod list_tree_service;
pub mod tree_state_store;
pub mod visibility;

pub use error::TreeServiceError;
pub use list_tree_service::{DropTarget, LinePosition, ListTreeService, TreeServiceConfig};
pub use tree_state_store::TreeStateStore;
pub use visibility::{resolve_visible_order, ResolveOptions};
