//! List Data Structures
//!
//! This module defines the `ListNode` struct and related types for
//! SpaceTree's normalized list tree.
//!
//! # Architecture
//!
//! - **Normalized by id**: nodes live flat in the [`crate::cache::ListCache`]
//!   arena, related through `parent_id`/`path` pointers instead of nested
//!   child arrays
//! - **Denormalized ancestry**: `path` holds the ancestor chain root→parent
//!   for O(1) descendant checks during cycle prevention
//! - **Opaque sibling keys**: `order` is a totally-ordered fractional key
//!   allocated by [`crate::ordering`]; unique only among siblings
//!
//! # Examples
//!
//! ```rust
//! use spacetree_core::models::ListNode;
//!
//! // A root-level list
//! let work = ListNode::new_root("Work".to_string(), 1.0);
//!
//! // A child list nested under it
//! let projects = ListNode::new_child("Projects".to_string(), &work, 1.0);
//! assert_eq!(projects.parent_id.as_deref(), Some(work.id.as_str()));
//! assert_eq!(projects.path, vec![work.id.clone()]);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for ListNode structure
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid parent reference: {0}")]
    InvalidParent(String),

    #[error("Invalid ancestor path: {0}")]
    InvalidPath(String),
}

/// A user-visible named collection that can nest under another list,
/// forming a tree.
///
/// # Fields
///
/// - `id`: unique, stable identifier (UUID string)
/// - `name`: display name
/// - `parent_id`: optional reference to the parent list; `None` means root
/// - `path`: ordered ancestor ids from root to this node's parent; kept
///   consistent with `parent_id` by the owning cache on every reparent
/// - `order`: fractional sibling-order key, compared with `total_cmp`
/// - `created_at`: timestamp when the list was created
///
/// The tree core treats nodes as externally owned: only `parent_id` and
/// `order` are ever mutated by it (via [`ListNodeUpdate`] through the cache).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNode {
    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Parent list id; `None` means this list is a root
    pub parent_id: Option<String>,

    /// Ancestor ids from root to parent, denormalized for O(1) cycle checks
    #[serde(default)]
    pub path: Vec<String>,

    /// Sibling-order key; unique only among siblings of the same parent
    pub order: f64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl ListNode {
    /// Create a new root-level list with an auto-generated UUID.
    pub fn new_root(name: String, order: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            parent_id: None,
            path: Vec::new(),
            order,
            created_at: Utc::now(),
        }
    }

    /// Create a new list nested under `parent`, deriving `path` from the
    /// parent's own path.
    pub fn new_child(name: String, parent: &ListNode, order: f64) -> Self {
        let mut path = parent.path.clone();
        path.push(parent.id.clone());
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            parent_id: Some(parent.id.clone()),
            path,
            order,
            created_at: Utc::now(),
        }
    }

    /// Create a list with an explicit id (backend-assigned ids).
    pub fn with_id(
        id: String,
        name: String,
        parent_id: Option<String>,
        path: Vec<String>,
        order: f64,
    ) -> Self {
        Self {
            id,
            name,
            parent_id,
            path,
            order,
            created_at: Utc::now(),
        }
    }

    /// Whether this list sits at the root level.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Validate structural invariants.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if:
    /// - `id` is empty
    /// - the node references itself as parent
    /// - the node's own id appears in its ancestor `path` (cycle)
    /// - `path` disagrees with `parent_id` at the tail
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::MissingField("id".to_string()));
        }

        if let Some(parent_id) = &self.parent_id {
            if parent_id == &self.id {
                return Err(ValidationError::InvalidParent(
                    "List cannot be its own parent".to_string(),
                ));
            }
            if self.path.last() != Some(parent_id) {
                return Err(ValidationError::InvalidPath(format!(
                    "path tail does not match parent_id '{}'",
                    parent_id
                )));
            }
        } else if !self.path.is_empty() {
            return Err(ValidationError::InvalidPath(
                "root list must have an empty path".to_string(),
            ));
        }

        if self.path.iter().any(|ancestor| ancestor == &self.id) {
            return Err(ValidationError::InvalidPath(
                "List appears in its own ancestor path".to_string(),
            ));
        }

        Ok(())
    }
}

/// Custom deserializer for optional fields that accepts both plain values
/// and null.
///
/// Maps three input formats to the double-Option pattern:
/// - Missing field → None (don't update)
/// - null → Some(None) (set to NULL)
/// - "value" → Some(Some("value")) (set to value)
fn deserialize_optional_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    // Missing field is handled by #[serde(default)] on the struct field
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}

/// Partial update for a [`ListNode`], applied through the cache.
///
/// # Double-Option Pattern for `parent_id`
///
/// - `None`: don't change the parent
/// - `Some(None)`: make the list a root
/// - `Some(Some(id))`: reparent under `id`
///
/// This distinction matters because "become a root" is a real reparent
/// outcome of the drop protocol, not an omitted field.
///
/// # Examples
///
/// ```rust
/// # use spacetree_core::models::ListNodeUpdate;
/// // Rename only
/// let update = ListNodeUpdate {
///     name: Some("Archive".to_string()),
///     ..Default::default()
/// };
///
/// // Reparent to root, leave name and order untouched
/// let update = ListNodeUpdate {
///     parent_id: Some(None),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNodeUpdate {
    /// Update display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Update parent reference (double-Option, see struct docs)
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub parent_id: Option<Option<String>>,

    /// Update sibling-order key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
}

impl ListNodeUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reparent under the given list (or to root with `None`).
    pub fn with_parent(mut self, parent_id: Option<String>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Set a new sibling-order key.
    pub fn with_order(mut self, order: f64) -> Self {
        self.order = Some(order);
        self
    }

    /// Check if the update contains any changes.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.parent_id.is_none() && self.order.is_none()
    }
}
