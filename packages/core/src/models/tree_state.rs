//! Per-node interaction state and the ephemeral drag session.
//!
//! `TreeNodeState` is owned by this core, one entry per [`super::ListNode`],
//! created and destroyed in lockstep with list existence by
//! [`crate::services::TreeStateStore::sync`]. Nothing here is persisted;
//! it is UI/interaction state only.

use serde::{Deserialize, Serialize};

/// Lifecycle of an asynchronous child-creation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildCreateState {
    /// No call issued yet
    Pristine,
    /// Call in flight
    Running,
    /// Last call succeeded
    Success,
    /// Last call failed
    Error,
}

impl Default for ChildCreateState {
    fn default() -> Self {
        Self::Pristine
    }
}

/// Per-list UI/interaction state.
///
/// `has_children` is derived and recomputed on every sync; the remaining
/// flags are user-driven and carried across syncs for surviving ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNodeState {
    /// Foreign key to the list this state belongs to
    pub node_id: String,

    /// True iff any list currently references this node as parent
    pub has_children: bool,

    /// User toggle; children are hidden while false (default)
    pub are_children_shown: bool,

    /// Transient flag for an in-progress "create child" affordance
    pub is_new_child_input_shown: bool,

    /// Tracks the async child-creation call for this node
    pub new_child_create_state: ChildCreateState,

    /// Set right after this node receives a dropped child; auto-reset
    /// after a fixed delay. Highlighting only, never load-bearing.
    pub was_just_moved: bool,
}

impl TreeNodeState {
    /// Default (collapsed, pristine) state for a list.
    pub fn seed(node_id: String, has_children: bool) -> Self {
        Self {
            node_id,
            has_children,
            are_children_shown: false,
            is_new_child_input_shown: false,
            new_child_create_state: ChildCreateState::Pristine,
            was_just_moved: false,
        }
    }
}

/// Ephemeral drag-and-drop session, alive only during an active gesture.
///
/// Kept as an explicit value object instead of reading ambient
/// drag-and-drop globals, so the drop protocol is testable without a
/// real event source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragSession {
    /// List currently being dragged
    pub dragged_node_id: Option<String>,

    /// List currently hovered as a drop candidate
    pub drag_over_node_id: Option<String>,
}

impl DragSession {
    /// True while a gesture is active.
    pub fn is_dragging(&self) -> bool {
        self.dragged_node_id.is_some()
    }

    /// Clear both fields (drop or drag-end).
    pub fn clear(&mut self) {
        self.dragged_node_id = None;
        self.drag_over_node_id = None;
    }
}
