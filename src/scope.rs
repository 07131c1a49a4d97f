use crate::types::NodeId;
use std::collections::HashSet;

/// Authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Target lies within the caller scope.
    Allow,
    /// Target reaches outside the caller scope.
    Deny,
}

/// A set of node ids a query spans or a caller may reach.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeScope {
    ids: HashSet<NodeId>,
}

impl NodeScope {
    /// Creates an empty scope.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a scope holding exactly one node.
    pub fn singleton(id: NodeId) -> Self {
        let mut ids = HashSet::with_capacity(1);
        ids.insert(id);
        Self { ids }
    }

    /// Returns whether `id` is in the scope.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.ids.contains(id)
    }

    /// Returns whether every id of `other` is in this scope.
    pub fn contains_all(&self, other: &NodeScope) -> bool {
        other.ids.is_subset(&self.ids)
    }

    /// Returns whether the scope holds no node.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of nodes in the scope.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Iterates the node ids in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeId> {
        self.ids.iter()
    }

    /// Returns the node ids sorted, for stable output.
    pub fn to_sorted_vec(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.ids.iter().cloned().collect();
        ids.sort_unstable();
        ids
    }
}

impl FromIterator<NodeId> for NodeScope {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for NodeScope {
    type Item = NodeId;
    type IntoIter = std::collections::hash_set::IntoIter<NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.into_iter()
    }
}

/// Decides whether a caller with `caller` scope may act on `target`.
///
/// Allows iff `target` is a subset of `caller`. An empty target is allowed
/// vacuously; callers that need a meaningful check must not pass one.
pub fn evaluate(caller: &NodeScope, target: &NodeScope) -> Decision {
    if caller.contains_all(target) {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// Boolean form of [`evaluate`].
pub fn is_allowed(caller: &NodeScope, target: &NodeScope) -> bool {
    evaluate(caller, target) == Decision::Allow
}
