//! SpaceTree Core Tree-State Engine
//!
//! This crate keeps a mutable, user-reorderable tree of hierarchical
//! lists consistent under two simultaneous change sources: direct user
//! edits (create/rename/collapse) and drag-and-drop reparenting or
//! reordering, while a backing store persists the authoritative
//! structure asynchronously.
//!
//! # Architecture
//!
//! - **Normalized arena**: lists live flat in a by-id cache with
//!   `parent_id`/`path` pointers; nested tree objects are never built
//! - **Optimistic mutations**: structural changes land in the cache
//!   synchronously and mirror to the persistence backend afterwards,
//!   without automatic rollback on failure
//! - **Fractional ordering**: sibling positions are opaque keys that
//!   support insertion without renumbering existing siblings
//! - **Cycle-safe moves**: reparenting is validated against the dragged
//!   node's descendant set before anything mutates
//!
//! # Modules
//!
//! - [`models`] - Data structures (ListNode, TreeNodeState, DragSession)
//! - [`cache`] - Normalized by-id entity cache
//! - [`ordering`] - Fractional sibling-order key allocation
//! - [`persistence`] - Async backend seam and in-memory reference backend
//! - [`services`] - Tree state store, visibility resolver, drop protocol

pub mod cache;
pub mod models;
pub mod ordering;
pub mod persistence;
pub mod services;

// Re-export commonly used types
pub use cache::ListCache;
pub use models::*;
pub use services::*;
