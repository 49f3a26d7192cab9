//! List tree service: drop protocol and mutation dispatch.
//!
//! This is the central contract of the crate: it interprets a
//! drag-and-drop gesture against the current tree, decides between
//! reparenting and sibling reordering, rejects cycle-forming moves, and
//! applies accepted decisions optimistically — the cache mutates
//! synchronously, then the corresponding persistence calls are issued.
//!
//! Persistence failures propagate to the caller but never roll the
//! optimistic local change back; silently reverting a user's drag would
//! be more confusing than a stale remote. Reconciliation is an explicit
//! follow-up concern of the embedding application.

use std::sync::{Arc, Mutex};

use tokio::time::Duration;

use crate::cache::ListCache;
use crate::models::{ChildCreateState, DragSession, ListNode, ListNodeUpdate, TreeNodeState};
use crate::ordering::{self, OrderedItem};
use crate::persistence::ListPersistence;
use crate::services::error::TreeServiceError;
use crate::services::tree_state_store::TreeStateStore;
use crate::services::visibility::{resolve_visible_order, ResolveOptions};

/// Delay before a drop target's `was_just_moved` highlight auto-clears.
const WAS_JUST_MOVED_RESET: Duration = Duration::from_millis(2000);

/// Which side of the adjacent node a reorder line sits on.
///
/// `Before` only exists on the top line of the first root; every other
/// line sits after its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePosition {
    Before,
    After,
}

/// Drop-zone descriptor for a drag gesture.
///
/// Replaces DOM-level drop-element ids with a typed value: dropping onto
/// a node signals reparenting intent, dropping onto a reorder line
/// between nodes signals sibling-order intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Drop onto the node itself
    Node(String),
    /// Drop onto the reorder line adjacent to a node
    ReorderLine {
        node_id: String,
        position: LinePosition,
    },
}

/// Tree service behavior switches.
#[derive(Debug, Clone)]
pub struct TreeServiceConfig {
    /// When false, reorder lines at the root level degrade to "move the
    /// dragged list to the root" without reordering.
    pub allow_root_level_reordering: bool,
}

impl Default for TreeServiceConfig {
    fn default() -> Self {
        Self {
            allow_root_level_reordering: true,
        }
    }
}

/// Orchestrates tree state, visibility and the move/reorder protocol
/// over a shared [`ListCache`] and a [`ListPersistence`] backend.
///
/// All decision-making is synchronous over in-memory data; `await`
/// happens only around persistence calls, and no lock is ever held
/// across one.
#[derive(Clone)]
pub struct ListTreeService {
    cache: Arc<Mutex<ListCache>>,
    persistence: Arc<dyn ListPersistence>,
    tree_state: Arc<Mutex<TreeStateStore>>,
    drag: Arc<Mutex<DragSession>>,
    config: TreeServiceConfig,
}

impl ListTreeService {
    /// Create a service over a shared cache and persistence backend,
    /// seeding tree state from the cache's current contents.
    pub fn new(cache: Arc<Mutex<ListCache>>, persistence: Arc<dyn ListPersistence>) -> Self {
        let service = Self {
            cache,
            persistence,
            tree_state: Arc::new(Mutex::new(TreeStateStore::new())),
            drag: Arc::new(Mutex::new(DragSession::default())),
            config: TreeServiceConfig::default(),
        };
        service.sync_tree_state();
        service
    }

    /// Override the default configuration.
    pub fn with_config(mut self, config: TreeServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Access the shared entity cache.
    pub fn cache(&self) -> &Arc<Mutex<ListCache>> {
        &self.cache
    }

    /// Rebuild the per-node tree state from the cache's current node
    /// collection, preserving user-set flags for surviving ids.
    ///
    /// Call whenever the upstream collection changes size.
    pub fn sync_tree_state(&self) {
        let nodes = self.cache.lock().unwrap().all();
        let mut state = self.tree_state.lock().unwrap();
        let next = TreeStateStore::sync(&nodes, &state);
        *state = next;
    }

    /// Ordered sequence of currently visible lists.
    pub fn visible_nodes(&self, options: ResolveOptions) -> Vec<ListNode> {
        let nodes = self.cache.lock().unwrap().all();
        let state = self.tree_state.lock().unwrap();
        resolve_visible_order(&nodes, &state, options)
    }

    /// Snapshot of one node's interaction state.
    pub fn tree_state_of(&self, node_id: &str) -> Option<TreeNodeState> {
        self.tree_state.lock().unwrap().get(node_id).cloned()
    }

    /// Flip a node's children-shown toggle. Unknown ids are a no-op.
    pub fn toggle_children_shown(&self, node_id: &str) {
        self.tree_state.lock().unwrap().toggle_children_shown(node_id);
    }

    /// Flip a node's new-child input; showing it also expands the node.
    pub fn toggle_new_child_input(&self, node_id: &str) {
        self.tree_state.lock().unwrap().toggle_new_child_input(node_id);
    }

    /// Begin a drag gesture.
    pub fn start_drag(&self, node_id: &str) {
        self.drag.lock().unwrap().dragged_node_id = Some(node_id.to_string());
    }

    /// Update the hovered drop candidate.
    pub fn set_drag_over(&self, node_id: Option<&str>) {
        self.drag.lock().unwrap().drag_over_node_id = node_id.map(str::to_string);
    }

    /// Abandon the gesture. Clears the ephemeral session only; no cache
    /// or persistence side effects.
    pub fn end_drag(&self) {
        self.drag.lock().unwrap().clear();
    }

    /// Snapshot of the current drag session.
    pub fn drag_session(&self) -> DragSession {
        self.drag.lock().unwrap().clone()
    }

    /// Create a child list under `parent_id`.
    ///
    /// The name is trimmed; an empty result or an unknown parent returns
    /// `Ok(None)` without touching the backend. The parent's
    /// `new_child_create_state` tracks the call lifecycle; on success the
    /// created node lands in the cache ordered last among its siblings
    /// and the new-child input is hidden.
    ///
    /// # Errors
    ///
    /// Propagates the backend failure after recording
    /// [`ChildCreateState::Error`] on the parent.
    pub async fn create_child(
        &self,
        parent_id: &str,
        name: &str,
    ) -> Result<Option<String>, TreeServiceError> {
        let name = name.trim();
        if name.is_empty() || !self.cache.lock().unwrap().contains(parent_id) {
            tracing::debug!(parent_id, "child creation skipped");
            return Ok(None);
        }

        self.tree_state
            .lock()
            .unwrap()
            .set_child_create_state(parent_id, ChildCreateState::Running);

        let created = match self.persistence.create_child(parent_id, name).await {
            Ok(created) => created,
            Err(err) => {
                self.tree_state
                    .lock()
                    .unwrap()
                    .set_child_create_state(parent_id, ChildCreateState::Error);
                return Err(err.into());
            }
        };

        {
            let mut cache = self.cache.lock().unwrap();
            // The parent can disappear while the call is in flight; the
            // created node is then dropped with the rest of the stale state
            if let Some(parent) = cache.get(parent_id).cloned() {
                let siblings: Vec<OrderedItem> = cache
                    .children_of(Some(parent_id))
                    .iter()
                    .map(|sibling| OrderedItem::new(sibling.id.clone(), sibling.order))
                    .collect();
                let order = ordering::push_end(&siblings);
                let mut path = parent.path.clone();
                path.push(parent.id.clone());
                let node = ListNode::with_id(
                    created.id.clone(),
                    name.to_string(),
                    Some(parent.id.clone()),
                    path,
                    order,
                );
                cache.insert(node)?;
            }
        }

        {
            let mut state = self.tree_state.lock().unwrap();
            state.hide_new_child_input(parent_id);
            state.set_child_create_state(parent_id, ChildCreateState::Success);
            state.mark_has_children(parent_id);
        }
        tracing::debug!(parent_id, child_id = created.id.as_str(), "created child list");
        Ok(Some(created.id))
    }

    /// Resolve a drop gesture into reparent and/or reorder mutations.
    ///
    /// Clears the drag-over highlight first — observable even when the
    /// drop is rejected. A stale dragged id or a self-drop is a no-op.
    ///
    /// # Errors
    ///
    /// - [`TreeServiceError::CircularReference`] when the drop would put
    ///   a list under itself or one of its descendants; rejected before
    ///   any local or remote mutation.
    /// - [`TreeServiceError::Persistence`] when a backend call fails
    ///   after the optimistic local mutation; the local change stays.
    pub async fn on_drop(
        &self,
        dragged_node_id: &str,
        target: DropTarget,
    ) -> Result<(), TreeServiceError> {
        self.drag.lock().unwrap().drag_over_node_id = None;

        let dragged = match self.cache.lock().unwrap().get(dragged_node_id) {
            Some(node) => node.clone(),
            None => {
                tracing::warn!(dragged_node_id, "dropped a stale list id, ignoring");
                return Ok(());
            }
        };

        match target {
            DropTarget::Node(target_id) => {
                if target_id == dragged.id || !self.cache.lock().unwrap().contains(&target_id) {
                    return Ok(());
                }
                // Only reparent when dropped on a different parent
                if dragged.parent_id.as_deref() != Some(target_id.as_str()) {
                    self.perform_move(&dragged.id, Some(&target_id)).await?;
                }
                // Order the moved list first among its new siblings
                let first_sibling = self
                    .cache
                    .lock()
                    .unwrap()
                    .children_of(Some(&target_id))
                    .into_iter()
                    .find(|sibling| sibling.id != dragged.id);
                if let Some(first) = first_sibling {
                    self.perform_reorder(&dragged.id, &first.id, false).await?;
                }
            }
            DropTarget::ReorderLine { node_id, position } => {
                if node_id == dragged.id {
                    return Ok(());
                }
                self.drop_on_reorder_line(&dragged, &node_id, position == LinePosition::Before)
                    .await?;
            }
        }
        Ok(())
    }

    async fn drop_on_reorder_line(
        &self,
        dragged: &ListNode,
        target_id: &str,
        is_before_first_root: bool,
    ) -> Result<(), TreeServiceError> {
        let target = match self.cache.lock().unwrap().get(target_id) {
            Some(target) => target.clone(),
            None => return Ok(()),
        };
        let target_children_shown = self
            .tree_state
            .lock()
            .unwrap()
            .get(target_id)
            .is_some_and(|state| state.are_children_shown);

        // Root-level reordering disabled: the drop degrades to making the
        // dragged list a root
        if !self.config.allow_root_level_reordering && target.parent_id.is_none() {
            if dragged.parent_id.is_some() {
                self.perform_move(&dragged.id, None).await?;
            }
            return Ok(());
        }

        if is_before_first_root {
            // Dropping before the first root orders the dragged list
            // first among all of the target's siblings
            let siblings = self
                .cache
                .lock()
                .unwrap()
                .children_of(target.parent_id.as_deref());
            if dragged.parent_id != target.parent_id {
                self.perform_move(&dragged.id, target.parent_id.as_deref())
                    .await?;
            }
            if let Some(first) = siblings.first() {
                self.perform_reorder(&dragged.id, &first.id, false).await?;
            }
            return Ok(());
        }

        if target_children_shown {
            // An expanded target swallows the drop: the dragged list
            // becomes its first child
            let children = self.cache.lock().unwrap().children_of(Some(target_id));
            if dragged.parent_id.as_deref() != Some(target_id) {
                self.perform_move(&dragged.id, Some(target_id)).await?;
            }
            if let Some(first) = children.first() {
                self.perform_reorder(&dragged.id, &first.id, false).await?;
            }
            return Ok(());
        }

        // Otherwise the dragged list becomes the next sibling after the target
        let siblings = self
            .cache
            .lock()
            .unwrap()
            .children_of(target.parent_id.as_deref());
        if dragged.parent_id != target.parent_id {
            self.perform_move(&dragged.id, target.parent_id.as_deref())
                .await?;
        }
        let Some(target_index) = siblings.iter().position(|s| s.id == target.id) else {
            return Ok(());
        };
        // Landing after the last sibling means push-to-end, anchored on
        // the last sibling itself
        let (anchor_index, is_final_sibling) = if target_index == siblings.len() - 1 {
            (target_index, true)
        } else {
            (target_index + 1, false)
        };
        self.perform_reorder(&dragged.id, &siblings[anchor_index].id, is_final_sibling)
            .await
    }

    /// Apply a reparent decision: optimistic cache update, drop-target
    /// highlight, then the remote parent update.
    async fn perform_move(
        &self,
        node_id: &str,
        new_parent_id: Option<&str>,
    ) -> Result<(), TreeServiceError> {
        match new_parent_id {
            None => {
                if !self.cache.lock().unwrap().contains(node_id) {
                    return Ok(());
                }
                self.cache
                    .lock()
                    .unwrap()
                    .update_node(node_id, ListNodeUpdate::new().with_parent(None));
                tracing::debug!(node_id, "moved list to root level");
                self.persistence.update_parent(node_id, None).await?;
            }
            Some(parent_id) => {
                {
                    let cache = self.cache.lock().unwrap();
                    if !cache.contains(node_id) {
                        return Ok(());
                    }
                    let Some(new_parent) = cache.get(parent_id) else {
                        return Ok(());
                    };
                    if parent_id == node_id
                        || new_parent.path.iter().any(|ancestor| ancestor == node_id)
                    {
                        return Err(TreeServiceError::circular_reference(format!(
                            "cannot make list '{node_id}' a child of its descendant '{parent_id}'"
                        )));
                    }
                }

                {
                    let mut state = self.tree_state.lock().unwrap();
                    state.mark_has_children(parent_id);
                    state.set_was_just_moved(parent_id, true);
                }
                self.schedule_was_just_moved_reset(parent_id.to_string());

                self.cache.lock().unwrap().update_node(
                    node_id,
                    ListNodeUpdate::new().with_parent(Some(parent_id.to_string())),
                );
                tracing::debug!(node_id, parent_id, "reparented list");
                self.persistence
                    .update_parent(node_id, Some(parent_id))
                    .await?;
            }
        }
        Ok(())
    }

    /// Apply a reorder decision: allocate a fresh sibling key, update the
    /// cache, then mirror to the backend. A key identical to the current
    /// one short-circuits into a no-op.
    async fn perform_reorder(
        &self,
        node_id: &str,
        anchor_sibling_id: &str,
        is_final_sibling: bool,
    ) -> Result<(), TreeServiceError> {
        let (order, current_order, sibling_ids, intended_index) = {
            let cache = self.cache.lock().unwrap();
            let Some(anchor) = cache.get(anchor_sibling_id) else {
                return Ok(());
            };
            let Some(dragged) = cache.get(node_id) else {
                return Ok(());
            };
            let siblings = cache.children_of(anchor.parent_id.as_deref());
            let anchor_index = siblings.iter().position(|s| s.id == anchor_sibling_id);
            let items: Vec<OrderedItem> = siblings
                .iter()
                .map(|sibling| OrderedItem::new(sibling.id.clone(), sibling.order))
                .collect();
            let order = match anchor_index {
                Some(index) if !is_final_sibling => ordering::insert_before_index(&items, index),
                _ => ordering::push_end(&items),
            };
            let intended_index = if is_final_sibling {
                siblings.len()
            } else {
                anchor_index.unwrap_or(siblings.len())
            };
            let sibling_ids: Vec<String> = siblings.iter().map(|s| s.id.clone()).collect();
            (order, dragged.order, sibling_ids, intended_index)
        };

        if order.total_cmp(&current_order).is_eq() {
            tracing::debug!(node_id, "sibling order unchanged, skipping reorder");
            return Ok(());
        }

        self.cache
            .lock()
            .unwrap()
            .update_node(node_id, ListNodeUpdate::new().with_order(order));
        tracing::debug!(node_id, order, "reordered list among siblings");
        self.persistence
            .update_order(node_id, &sibling_ids, intended_index)
            .await?;
        Ok(())
    }

    fn schedule_was_just_moved_reset(&self, node_id: String) {
        let tree_state = Arc::clone(&self.tree_state);
        tokio::spawn(async move {
            tokio::time::sleep(WAS_JUST_MOVED_RESET).await;
            // A node deleted in the meantime makes this a stale-id no-op
            tree_state.lock().unwrap().set_was_just_moved(&node_id, false);
        });
    }
}

#[cfg(test)]
#[path = "list_tree_service_drop_test.rs"]
mod list_tree_service_drop_test;
