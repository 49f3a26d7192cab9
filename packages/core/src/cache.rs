//! In-process entity cache for [`ListNode`] records.
//!
//! The cache is the single shared mutable resource of the tree core: a
//! normalized, by-id arena related through `parent_id`/`path` pointers.
//! Nested tree objects are never materialized here; the visibility
//! resolver builds its ordering transiently during traversal.
//!
//! The cache owns the `path` invariant: whenever a node's `parent_id`
//! changes, the node's ancestor path and the paths of all its descendants
//! are recomputed before the call returns.

use std::collections::HashMap;

use crate::models::{ListNode, ListNodeUpdate, ValidationError};

/// Normalized by-id storage for list nodes.
#[derive(Debug, Default, Clone)]
pub struct ListCache {
    by_id: HashMap<String, ListNode>,
}

impl ListCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cache from an existing node collection.
    ///
    /// Nodes failing validation are dropped with a warning rather than
    /// poisoning the whole collection.
    pub fn from_nodes(nodes: Vec<ListNode>) -> Self {
        let mut cache = Self::new();
        for node in nodes {
            if let Err(err) = cache.insert(node) {
                tracing::warn!("dropping invalid list node during cache seed: {err}");
            }
        }
        cache
    }

    /// Insert a node, validating its structure first.
    pub fn insert(&mut self, node: ListNode) -> Result<(), ValidationError> {
        node.validate()?;
        self.by_id.insert(node.id.clone(), node);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&ListNode> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<ListNode> {
        self.by_id.remove(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// All nodes, sorted by order key (ties broken by id).
    ///
    /// This is the "already sorted" input the visibility resolver expects:
    /// root ordering in the resolver follows input order.
    pub fn all(&self) -> Vec<ListNode> {
        let mut nodes: Vec<ListNode> = self.by_id.values().cloned().collect();
        nodes.sort_by(|a, b| a.order.total_cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        nodes
    }

    /// Children of `parent_id` (roots for `None`), sorted by order key.
    pub fn children_of(&self, parent_id: Option<&str>) -> Vec<ListNode> {
        let mut children: Vec<ListNode> = self
            .by_id
            .values()
            .filter(|node| node.parent_id.as_deref() == parent_id)
            .cloned()
            .collect();
        children.sort_by(|a, b| a.order.total_cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        children
    }

    /// Apply a partial update to a node.
    ///
    /// A parent change recomputes the node's `path` and cascades fresh
    /// paths through all descendants. Unknown ids are a silent no-op —
    /// the cache tolerates stale references during the gap between an
    /// external delete and the next state sync.
    pub fn update_node(&mut self, id: &str, update: ListNodeUpdate) {
        if update.is_empty() {
            return;
        }
        if !self.by_id.contains_key(id) {
            tracing::debug!(node_id = id, "update for unknown list node ignored");
            return;
        }

        if let Some(name) = update.name {
            if let Some(node) = self.by_id.get_mut(id) {
                node.name = name;
            }
        }
        if let Some(order) = update.order {
            if let Some(node) = self.by_id.get_mut(id) {
                node.order = order;
            }
        }
        if let Some(new_parent) = update.parent_id {
            self.reparent(id, new_parent);
        }
    }

    fn reparent(&mut self, id: &str, new_parent: Option<String>) {
        let new_path = match &new_parent {
            None => Vec::new(),
            Some(parent_id) => match self.by_id.get(parent_id) {
                Some(parent) => {
                    let mut path = parent.path.clone();
                    path.push(parent.id.clone());
                    path
                }
                None => {
                    tracing::debug!(parent_id, "reparent to unknown list node ignored");
                    return;
                }
            },
        };

        match self.by_id.get_mut(id) {
            Some(node) => {
                node.parent_id = new_parent;
                node.path = new_path;
            }
            None => return,
        }

        self.refresh_descendant_paths(id);
    }

    /// Recompute `path` for every descendant of `id`.
    fn refresh_descendant_paths(&mut self, id: &str) {
        let mut queue = vec![id.to_string()];
        while let Some(current) = queue.pop() {
            let child_path = match self.by_id.get(&current) {
                Some(node) => {
                    let mut path = node.path.clone();
                    path.push(node.id.clone());
                    path
                }
                None => continue,
            };
            let child_ids: Vec<String> = self
                .by_id
                .values()
                .filter(|node| node.parent_id.as_deref() == Some(current.as_str()))
                .map(|node| node.id.clone())
                .collect();
            for child_id in child_ids {
                if let Some(child) = self.by_id.get_mut(&child_id) {
                    child.path = child_path.clone();
                }
                queue.push(child_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_cache() -> (ListCache, ListNode, ListNode, ListNode) {
        let root_a = ListNode::new_root("A".to_string(), 1.0);
        let root_b = ListNode::new_root("B".to_string(), 2.0);
        let child = ListNode::new_child("A1".to_string(), &root_a, 1.0);

        let cache = ListCache::from_nodes(vec![root_a.clone(), root_b.clone(), child.clone()]);
        (cache, root_a, root_b, child)
    }

    #[test]
    fn test_children_of_sorted_by_order() {
        let root = ListNode::new_root("R".to_string(), 1.0);
        let c1 = ListNode::new_child("c1".to_string(), &root, 3.0);
        let c2 = ListNode::new_child("c2".to_string(), &root, 1.0);

        let cache = ListCache::from_nodes(vec![root.clone(), c1.clone(), c2.clone()]);
        let children = cache.children_of(Some(&root.id));

        assert_eq!(children.len(), 2);
        assert_eq!(children[0].id, c2.id);
        assert_eq!(children[1].id, c1.id);
    }

    #[test]
    fn test_roots_via_children_of_none() {
        let (cache, root_a, root_b, _child) = seeded_cache();
        let roots = cache.children_of(None);

        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].id, root_a.id);
        assert_eq!(roots[1].id, root_b.id);
    }

    #[test]
    fn test_reparent_recomputes_descendant_paths() {
        let (mut cache, root_a, root_b, child) = seeded_cache();
        let grandchild = ListNode::new_child("A1a".to_string(), &child, 1.0);
        cache.insert(grandchild.clone()).unwrap();

        // Move child under root B; both child and grandchild paths refresh
        cache.update_node(
            &child.id,
            ListNodeUpdate::new().with_parent(Some(root_b.id.clone())),
        );

        let moved = cache.get(&child.id).unwrap();
        assert_eq!(moved.parent_id.as_deref(), Some(root_b.id.as_str()));
        assert_eq!(moved.path, vec![root_b.id.clone()]);

        let moved_grandchild = cache.get(&grandchild.id).unwrap();
        assert_eq!(
            moved_grandchild.path,
            vec![root_b.id.clone(), child.id.clone()]
        );
        assert!(!moved_grandchild.path.contains(&root_a.id));
    }

    #[test]
    fn test_reparent_to_root_clears_path() {
        let (mut cache, _root_a, _root_b, child) = seeded_cache();

        cache.update_node(&child.id, ListNodeUpdate::new().with_parent(None));

        let moved = cache.get(&child.id).unwrap();
        assert!(moved.parent_id.is_none());
        assert!(moved.path.is_empty());
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let (mut cache, ..) = seeded_cache();
        let before = cache.all();

        cache.update_node("missing", ListNodeUpdate::new().with_order(9.0));

        assert_eq!(cache.all(), before);
    }

    #[test]
    fn test_reparent_to_unknown_parent_is_noop() {
        let (mut cache, _root_a, _root_b, child) = seeded_cache();
        let before = cache.get(&child.id).cloned().unwrap();

        cache.update_node(
            &child.id,
            ListNodeUpdate::new().with_parent(Some("missing".to_string())),
        );

        assert_eq!(cache.get(&child.id), Some(&before));
    }

    #[test]
    fn test_all_sorted_by_order_key() {
        let (cache, root_a, root_b, child) = seeded_cache();
        let all = cache.all();

        assert_eq!(all.len(), 3);
        // root_a (1.0) and child (1.0) tie on key, break on id; root_b (2.0) last
        assert_eq!(all[2].id, root_b.id);
        assert!(all[..2].iter().any(|n| n.id == root_a.id));
        assert!(all[..2].iter().any(|n| n.id == child.id));
    }
}
