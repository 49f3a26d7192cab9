//! Fractional sibling-order key allocation.
//!
//! Keys are opaque `f64` values that sort correctly between neighbors
//! without renumbering existing siblings: inserting between two keys
//! takes their midpoint, appending steps past the last key, and
//! prepending steps before the first.
//!
//! Callers pass the ordered `{id, key}` sibling set and get back a fresh
//! key for the node being placed; persistence backends are expected to
//! apply the same scheme server-side from the sibling-id list and the
//! intended index.

/// An `{id, key}` pair from an ordered sibling set.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedItem {
    pub id: String,
    pub key: f64,
}

impl OrderedItem {
    pub fn new(id: impl Into<String>, key: f64) -> Self {
        Self { id: id.into(), key }
    }
}

/// Step used when appending past the last key or prepending before the
/// first; also the key handed to the very first item of an empty set.
const ORDER_STEP: f64 = 1.0;

/// Gap below which midpoint insertion loses float precision and the
/// sibling set should be rebalanced.
const MIN_KEY_GAP: f64 = 0.0001;

/// Calculate a key between two optional neighbors.
fn key_between(prev: Option<f64>, next: Option<f64>) -> f64 {
    match (prev, next) {
        (None, None) => ORDER_STEP,                   // first item ever
        (None, Some(next)) => next - ORDER_STEP,      // before first
        (Some(prev), None) => prev + ORDER_STEP,      // after last
        (Some(prev), Some(next)) => (prev + next) / 2.0, // between siblings
    }
}

/// Key for appending after the last item of `items`.
pub fn push_end(items: &[OrderedItem]) -> f64 {
    key_between(items.last().map(|item| item.key), None)
}

/// Key for inserting immediately before `items[index]`.
///
/// An out-of-range `index` behaves as push-to-end, so callers resolving a
/// stale sibling index still get a usable key.
pub fn insert_before_index(items: &[OrderedItem], index: usize) -> f64 {
    if index >= items.len() {
        return push_end(items);
    }
    let prev = index.checked_sub(1).map(|i| items[i].key);
    key_between(prev, Some(items[index].key))
}

/// Check whether any sibling gap has shrunk below the precision threshold.
pub fn needs_rebalancing(keys: &[f64]) -> bool {
    keys.windows(2).any(|pair| pair[1] - pair[0] < MIN_KEY_GAP)
}

/// Evenly respaced keys for `count` siblings.
///
/// Input:  [1.0, 1.0001, 1.0002, 1.0003]
/// Output: [1.0, 2.0, 3.0, 4.0]
pub fn rebalance(count: usize) -> Vec<f64> {
    (1..=count).map(|i| i as f64).collect()
}
