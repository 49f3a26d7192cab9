//! Visible-ordering resolver.
//!
//! Pure function from `(nodes, tree state, options)` to the flat ordered
//! sequence of visible lists. Safe to call on every render; no side
//! effects, no allocation of nested tree structures beyond the transient
//! traversal stack.

use std::collections::HashSet;

use crate::models::ListNode;
use crate::services::TreeStateStore;

/// Options for a single resolve pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Search/query override: when true, collapse state is ignored and
    /// every list is visible.
    pub are_lists_filtered: bool,

    /// Sort each node's children by order key before traversal. Without
    /// it, siblings follow their relative order in the input slice.
    pub sort_children_by_order: bool,
}

impl ResolveOptions {
    pub fn sorted() -> Self {
        Self {
            sort_children_by_order: true,
            ..Self::default()
        }
    }
}

/// Compute the ordered sequence of visible lists.
///
/// Roots are taken in input order; each root is traversed depth-first,
/// children pushed onto the stack in reverse so they pop in ascending
/// order. The output is pre-order: every parent immediately followed by
/// its visible descendants.
///
/// A node is emitted when it has a tree-state entry and either is a
/// root, or the filter override is on, or its parent was emitted with
/// `are_children_shown` set. Nodes without a state entry (a race with
/// sync) are skipped entirely.
pub fn resolve_visible_order(
    nodes: &[ListNode],
    tree_state: &TreeStateStore,
    options: ResolveOptions,
) -> Vec<ListNode> {
    let present: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
    // A parent id pointing outside the node set degrades the node to a
    // traversal root; cycles cannot arise from absent parents.
    let is_traversal_root = |node: &ListNode| match node.parent_id.as_deref() {
        None => true,
        Some(parent_id) => !present.contains(parent_id),
    };

    let mut visible: Vec<ListNode> = Vec::new();
    let mut shown: HashSet<&str> = HashSet::new();

    for root in nodes.iter().filter(|node| is_traversal_root(*node)) {
        let mut stack: Vec<&ListNode> = vec![root];
        while let Some(node) = stack.pop() {
            let is_visible = tree_state.contains(&node.id)
                && (is_traversal_root(node)
                    || options.are_lists_filtered
                    || node
                        .parent_id
                        .as_deref()
                        .is_some_and(|parent_id| {
                            shown.contains(parent_id)
                                && tree_state
                                    .get(parent_id)
                                    .is_some_and(|parent| parent.are_children_shown)
                        }));

            if is_visible {
                shown.insert(node.id.as_str());
                visible.push(node.clone());
            }

            let mut children: Vec<&ListNode> = nodes
                .iter()
                .filter(|candidate| candidate.parent_id.as_deref() == Some(node.id.as_str()))
                .collect();
            if options.sort_children_by_order {
                children.sort_by(|a, b| a.order.total_cmp(&b.order));
            }
            // Reversed push, ascending pop
            for child in children.into_iter().rev() {
                stack.push(child);
            }
        }
    }

    visible
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, parent: Option<&ListNode>, order: f64) -> ListNode {
        match parent {
            None => ListNode::with_id(id.to_string(), id.to_string(), None, Vec::new(), order),
            Some(parent) => {
                let mut path = parent.path.clone();
                path.push(parent.id.clone());
                ListNode::with_id(
                    id.to_string(),
                    id.to_string(),
                    Some(parent.id.clone()),
                    path,
                    order,
                )
            }
        }
    }

    fn ids(nodes: &[ListNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.id.as_str()).collect()
    }

    fn synced(nodes: &[ListNode]) -> TreeStateStore {
        TreeStateStore::sync(nodes, &TreeStateStore::new())
    }

    #[test]
    fn test_collapsed_parent_hides_child() {
        let n1 = node("1", None, 1.0);
        let n2 = node("2", None, 2.0);
        let n3 = node("3", Some(&n1), 1.0);
        let nodes = vec![n1, n2, n3];
        let mut state = synced(&nodes);

        let visible = resolve_visible_order(&nodes, &state, ResolveOptions::default());
        assert_eq!(ids(&visible), vec!["1", "2"]);

        state.toggle_children_shown("1");
        let visible = resolve_visible_order(&nodes, &state, ResolveOptions::default());
        assert_eq!(ids(&visible), vec!["1", "3", "2"]);
    }

    #[test]
    fn test_collapse_hides_whole_subtree() {
        let a = node("a", None, 1.0);
        let b = node("b", Some(&a), 1.0);
        let c = node("c", Some(&b), 1.0);
        let nodes = vec![a, b, c];
        let mut state = synced(&nodes);

        // Expand b but keep a collapsed: neither b nor c may appear
        state.toggle_children_shown("b");
        let visible = resolve_visible_order(&nodes, &state, ResolveOptions::default());
        assert_eq!(ids(&visible), vec!["a"]);

        // Expanding a now reveals b and, through b's open toggle, c
        state.toggle_children_shown("a");
        let visible = resolve_visible_order(&nodes, &state, ResolveOptions::default());
        assert_eq!(ids(&visible), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_filter_override_shows_everything() {
        let a = node("a", None, 1.0);
        let b = node("b", Some(&a), 1.0);
        let c = node("c", Some(&b), 1.0);
        let nodes = vec![a, b, c];
        let state = synced(&nodes);

        let options = ResolveOptions {
            are_lists_filtered: true,
            ..ResolveOptions::default()
        };
        let visible = resolve_visible_order(&nodes, &state, options);
        assert_eq!(ids(&visible), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sibling_order_follows_order_keys_when_sorted() {
        let root = node("root", None, 1.0);
        let c1 = node("c1", Some(&root), 3.0);
        let c2 = node("c2", Some(&root), 1.0);
        let c3 = node("c3", Some(&root), 2.0);
        let nodes = vec![root, c1, c2, c3];
        let mut state = synced(&nodes);
        state.toggle_children_shown("root");

        let visible = resolve_visible_order(&nodes, &state, ResolveOptions::sorted());
        assert_eq!(ids(&visible), vec!["root", "c2", "c3", "c1"]);
    }

    #[test]
    fn test_unsorted_children_follow_input_order() {
        let root = node("root", None, 1.0);
        let c1 = node("c1", Some(&root), 3.0);
        let c2 = node("c2", Some(&root), 1.0);
        let nodes = vec![root, c1, c2];
        let mut state = synced(&nodes);
        state.toggle_children_shown("root");

        let visible = resolve_visible_order(&nodes, &state, ResolveOptions::default());
        assert_eq!(ids(&visible), vec!["root", "c1", "c2"]);
    }

    #[test]
    fn test_node_without_state_entry_is_skipped() {
        let a = node("a", None, 1.0);
        let b = node("b", None, 2.0);
        let nodes = vec![a.clone(), b.clone()];
        // State synced before b existed
        let state = TreeStateStore::sync(&[a], &TreeStateStore::new());

        let visible = resolve_visible_order(&nodes, &state, ResolveOptions::default());
        assert_eq!(ids(&visible), vec!["a"]);
    }

    #[test]
    fn test_orphaned_parent_reference_degrades_to_root() {
        let a = node("a", None, 1.0);
        let orphan = ListNode::with_id(
            "orphan".to_string(),
            "orphan".to_string(),
            Some("deleted".to_string()),
            vec!["deleted".to_string()],
            2.0,
        );
        let nodes = vec![a, orphan];
        let state = synced(&nodes);

        let visible = resolve_visible_order(&nodes, &state, ResolveOptions::default());
        assert_eq!(ids(&visible), vec!["a", "orphan"]);
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let state = TreeStateStore::new();
        assert!(resolve_visible_order(&[], &state, ResolveOptions::default()).is_empty());
    }

    #[test]
    fn test_preorder_groups_descendants_before_next_root() {
        let r1 = node("r1", None, 1.0);
        let r2 = node("r2", None, 2.0);
        let c1 = node("c1", Some(&r1), 1.0);
        let c2 = node("c2", Some(&r1), 2.0);
        let g1 = node("g1", Some(&c1), 1.0);
        let nodes = vec![r1, r2, c1, c2, g1];
        let mut state = synced(&nodes);
        state.toggle_children_shown("r1");
        state.toggle_children_shown("c1");

        let visible = resolve_visible_order(&nodes, &state, ResolveOptions::sorted());
        assert_eq!(ids(&visible), vec!["r1", "c1", "g1", "c2", "r2"]);
    }
}
