//! Persistence backend seam.
//!
//! The tree core never talks to storage directly; structural mutations
//! are mirrored to a [`ListPersistence`] implementation after the
//! optimistic cache update has already landed. Failures propagate to the
//! caller and are never used to roll the local state back.
//!
//! [`InMemoryPersistence`] is the reference implementation: it records
//! every call and can be told to fail, which is what the drop-protocol
//! tests assert against.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by a persistence backend.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Remote call failed (network, backend rejection, ...)
    #[error("remote persistence call failed: {0}")]
    Remote(String),
}

impl PersistenceError {
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }
}

/// Result of a successful remote child creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedList {
    /// Backend-assigned stable id for the new list
    pub id: String,
}

/// Asynchronous backing store for the authoritative tree structure.
///
/// All methods are fire-after-optimistic-update: by the time a call is
/// issued, the local cache already reflects the mutation.
#[async_trait]
pub trait ListPersistence: Send + Sync {
    /// Persist a parent change. `new_parent_id` of `None` makes the node
    /// a root.
    async fn update_parent(
        &self,
        node_id: &str,
        new_parent_id: Option<&str>,
    ) -> Result<(), PersistenceError>;

    /// Persist a sibling-order change. Carries the full ordered
    /// sibling-id list and the intended index so the backend can apply
    /// the same deterministic allocation scheme server-side.
    async fn update_order(
        &self,
        node_id: &str,
        sibling_ids: &[String],
        target_index: usize,
    ) -> Result<(), PersistenceError>;

    /// Create a new child list remotely, returning its assigned id.
    async fn create_child(
        &self,
        parent_id: &str,
        name: &str,
    ) -> Result<CreatedList, PersistenceError>;
}

/// A persistence call as observed by [`InMemoryPersistence`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    UpdateParent {
        node_id: String,
        new_parent_id: Option<String>,
    },
    UpdateOrder {
        node_id: String,
        sibling_ids: Vec<String>,
        target_index: usize,
    },
    CreateChild {
        parent_id: String,
        name: String,
    },
}

/// In-memory recording backend.
///
/// Generates UUID ids for created children. `fail_next_call` makes the
/// next call return [`PersistenceError::Remote`] (the call is still
/// recorded), which is how the no-rollback contract gets exercised.
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    calls: Mutex<Vec<RecordedCall>>,
    fail_next: AtomicBool,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next persistence call fail.
    pub fn fail_next_call(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Snapshot of every call recorded so far, in issue order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: RecordedCall) -> Result<(), PersistenceError> {
        self.calls.lock().unwrap().push(call);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PersistenceError::remote("injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl ListPersistence for InMemoryPersistence {
    async fn update_parent(
        &self,
        node_id: &str,
        new_parent_id: Option<&str>,
    ) -> Result<(), PersistenceError> {
        self.record(RecordedCall::UpdateParent {
            node_id: node_id.to_string(),
            new_parent_id: new_parent_id.map(str::to_string),
        })
    }

    async fn update_order(
        &self,
        node_id: &str,
        sibling_ids: &[String],
        target_index: usize,
    ) -> Result<(), PersistenceError> {
        self.record(RecordedCall::UpdateOrder {
            node_id: node_id.to_string(),
            sibling_ids: sibling_ids.to_vec(),
            target_index,
        })
    }

    async fn create_child(
        &self,
        parent_id: &str,
        name: &str,
    ) -> Result<CreatedList, PersistenceError> {
        self.record(RecordedCall::CreateChild {
            parent_id: parent_id.to_string(),
            name: name.to_string(),
        })?;
        Ok(CreatedList {
            id: Uuid::new_v4().to_string(),
        })
    }
}
