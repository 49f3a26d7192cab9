//! Data Models
//!
//! This module contains the core data structures of the tree engine:
//!
//! - `ListNode` - a list record in the normalized tree
//! - `TreeNodeState` - per-list UI/interaction state
//! - `DragSession` - ephemeral drag-and-drop gesture state

mod list_node;
mod tree_state;

pub use list_node::{ListNode, ListNodeUpdate, ValidationError};
pub use tree_state::{ChildCreateState, DragSession, TreeNodeState};
