//! Service Layer Error Types
//!
//! This module defines error types for tree-service operations.
//!
//! The taxonomy separates synchronous invariant violations, which fail
//! fast before any mutation, from asynchronous backend failures, which
//! surface after the optimistic local change has landed and are left to
//! the caller to reconcile.

use crate::models::ValidationError;
use crate::persistence::PersistenceError;
use thiserror::Error;

/// Tree service operation errors.
#[derive(Error, Debug)]
pub enum TreeServiceError {
    /// Attempted reparent under the dragged node itself or one of its
    /// descendants. Rejected before any local or remote mutation.
    #[error("Circular reference detected: {context}")]
    CircularReference { context: String },

    /// A persistence call failed after the optimistic local mutation was
    /// applied. The local state is intentionally not rolled back.
    #[error("Persistence call failed: {0}")]
    Persistence(#[from] PersistenceError),

    /// Node validation failed
    #[error("List validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

impl TreeServiceError {
    /// Create a circular reference error
    pub fn circular_reference(context: impl Into<String>) -> Self {
        Self::CircularReference {
            context: context.into(),
        }
    }
}
