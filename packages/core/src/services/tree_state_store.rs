//! Per-node tree interaction state store.
//!
//! Single source of truth for [`TreeNodeState`] entries, kept
//! synchronized with the external list collection via [`TreeStateStore::sync`]
//! without losing user-set flags. Every operation tolerates stale ids as
//! silent no-ops: between an external delete and the next sync there is
//! a window where the UI can still address removed nodes.

use std::collections::{HashMap, HashSet};

use crate::models::{ChildCreateState, ListNode, TreeNodeState};

/// By-id mapping from list id to its interaction state.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TreeStateStore {
    by_id: HashMap<String, TreeNodeState>,
}

impl TreeStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the state mapping for `nodes`.
    ///
    /// User-driven flags (`are_children_shown`, `is_new_child_input_shown`,
    /// `new_child_create_state`) carry over for ids that already existed
    /// in `previous`; new ids seed collapsed/pristine. `has_children` is
    /// derived fresh on every call, and the transient `was_just_moved`
    /// always resets.
    ///
    /// Idempotent: syncing twice against the same `nodes` is a fixed point.
    pub fn sync(nodes: &[ListNode], previous: &TreeStateStore) -> TreeStateStore {
        let parents: HashSet<&str> = nodes
            .iter()
            .filter_map(|node| node.parent_id.as_deref())
            .collect();
        let by_id = nodes
            .iter()
            .map(|node| {
                let has_children = parents.contains(node.id.as_str());
                let state = match previous.by_id.get(&node.id) {
                    Some(prev) => TreeNodeState {
                        node_id: node.id.clone(),
                        has_children,
                        are_children_shown: prev.are_children_shown,
                        is_new_child_input_shown: prev.is_new_child_input_shown,
                        new_child_create_state: prev.new_child_create_state,
                        was_just_moved: false,
                    },
                    None => TreeNodeState::seed(node.id.clone(), has_children),
                };
                (node.id.clone(), state)
            })
            .collect();
        TreeStateStore { by_id }
    }

    pub fn get(&self, node_id: &str) -> Option<&TreeNodeState> {
        self.by_id.get(node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.by_id.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Flip `are_children_shown` for exactly one node.
    ///
    /// No cascading effect on descendants: collapsing hides them through
    /// the visibility resolver, not by touching their own state.
    pub fn toggle_children_shown(&mut self, node_id: &str) {
        if let Some(state) = self.by_id.get_mut(node_id) {
            state.are_children_shown = !state.are_children_shown;
        }
    }

    /// Flip `is_new_child_input_shown`.
    ///
    /// Showing the input also forces the node open so the affordance is
    /// visible in context; hiding it leaves the toggle untouched.
    pub fn toggle_new_child_input(&mut self, node_id: &str) {
        if let Some(state) = self.by_id.get_mut(node_id) {
            let showing = !state.is_new_child_input_shown;
            state.is_new_child_input_shown = showing;
            if showing {
                state.are_children_shown = true;
            }
        }
    }

    /// Mark a node as having children (dispatcher hook after a drop).
    pub fn mark_has_children(&mut self, node_id: &str) {
        if let Some(state) = self.by_id.get_mut(node_id) {
            state.has_children = true;
        }
    }

    /// Set or clear the transient just-received-a-drop highlight.
    pub fn set_was_just_moved(&mut self, node_id: &str, value: bool) {
        if let Some(state) = self.by_id.get_mut(node_id) {
            state.was_just_moved = value;
        }
    }

    /// Record the lifecycle of an async child-creation call.
    pub fn set_child_create_state(&mut self, node_id: &str, value: ChildCreateState) {
        if let Some(state) = self.by_id.get_mut(node_id) {
            state.new_child_create_state = value;
        }
    }

    /// Hide the new-child input (after a successful create).
    pub fn hide_new_child_input(&mut self, node_id: &str) {
        if let Some(state) = self.by_id.get_mut(node_id) {
            state.is_new_child_input_shown = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListNode;

    fn nodes() -> (Vec<ListNode>, String, String, String) {
        let root_a = ListNode::new_root("A".to_string(), 1.0);
        let root_b = ListNode::new_root("B".to_string(), 2.0);
        let child = ListNode::new_child("A1".to_string(), &root_a, 1.0);
        let ids = (root_a.id.clone(), root_b.id.clone(), child.id.clone());
        (vec![root_a, root_b, child], ids.0, ids.1, ids.2)
    }

    #[test]
    fn test_sync_seeds_defaults_and_derives_has_children() {
        let (nodes, root_a, root_b, child) = nodes();
        let store = TreeStateStore::sync(&nodes, &TreeStateStore::new());

        assert_eq!(store.len(), 3);
        assert!(store.get(&root_a).unwrap().has_children);
        assert!(!store.get(&root_b).unwrap().has_children);
        assert!(!store.get(&child).unwrap().are_children_shown);
    }

    #[test]
    fn test_sync_carries_user_flags_for_surviving_ids() {
        let (node_list, root_a, _root_b, _child) = nodes();
        let mut store = TreeStateStore::sync(&node_list, &TreeStateStore::new());
        store.toggle_children_shown(&root_a);
        store.toggle_new_child_input(&root_a);
        store.set_child_create_state(&root_a, ChildCreateState::Running);

        let resynced = TreeStateStore::sync(&node_list, &store);
        let state = resynced.get(&root_a).unwrap();
        assert!(state.are_children_shown);
        assert!(state.is_new_child_input_shown);
        assert_eq!(state.new_child_create_state, ChildCreateState::Running);
    }

    #[test]
    fn test_sync_is_idempotent() {
        let (node_list, root_a, ..) = nodes();
        let mut store = TreeStateStore::sync(&node_list, &TreeStateStore::new());
        store.toggle_children_shown(&root_a);

        let once = TreeStateStore::sync(&node_list, &store);
        let twice = TreeStateStore::sync(&node_list, &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sync_drops_removed_ids_and_resets_transient_flag() {
        let (mut node_list, root_a, _root_b, child) = nodes();
        let mut store = TreeStateStore::sync(&node_list, &TreeStateStore::new());
        store.set_was_just_moved(&root_a, true);

        node_list.retain(|n| n.id != child);
        let resynced = TreeStateStore::sync(&node_list, &store);

        assert!(!resynced.contains(&child));
        // Removing the only child also drops the derived flag
        assert!(!resynced.get(&root_a).unwrap().has_children);
        assert!(!resynced.get(&root_a).unwrap().was_just_moved);
    }

    #[test]
    fn test_toggle_children_shown_affects_one_node() {
        let (node_list, root_a, root_b, _child) = nodes();
        let mut store = TreeStateStore::sync(&node_list, &TreeStateStore::new());

        store.toggle_children_shown(&root_a);
        assert!(store.get(&root_a).unwrap().are_children_shown);
        assert!(!store.get(&root_b).unwrap().are_children_shown);

        store.toggle_children_shown(&root_a);
        assert!(!store.get(&root_a).unwrap().are_children_shown);
    }

    #[test]
    fn test_toggle_new_child_input_forces_children_shown() {
        let (node_list, root_a, ..) = nodes();
        let mut store = TreeStateStore::sync(&node_list, &TreeStateStore::new());

        store.toggle_new_child_input(&root_a);
        let state = store.get(&root_a).unwrap();
        assert!(state.is_new_child_input_shown);
        assert!(state.are_children_shown);

        // Hiding the input leaves the children-shown toggle alone
        store.toggle_new_child_input(&root_a);
        let state = store.get(&root_a).unwrap();
        assert!(!state.is_new_child_input_shown);
        assert!(state.are_children_shown);
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        let (node_list, ..) = nodes();
        let mut store = TreeStateStore::sync(&node_list, &TreeStateStore::new());
        let before = store.clone();

        store.toggle_children_shown("missing");
        store.toggle_new_child_input("missing");
        store.mark_has_children("missing");
        store.set_was_just_moved("missing", true);

        assert_eq!(store, before);
    }
}
