use crate::error::{Error, Result};
use crate::scope::NodeScope;
use crate::store::TreeStore;
use crate::types::NodeId;

/// Computes the node ids a query rooted at `base` spans.
///
/// Without descendants this is `{base}` and the store is not consulted. With
/// descendants it is `base` plus its subtree, or empty when `base` is unknown.
pub async fn resolve_scope<S>(
    store: &S,
    base: &NodeId,
    include_descendants: bool,
) -> Result<NodeScope>
where
    S: TreeStore + ?Sized + Sync,
{
    if !include_descendants {
        return Ok(NodeScope::singleton(base.clone()));
    }
    let ids = store
        .self_and_descendants(base.clone())
        .await
        .map_err(Error::from)?;
    let scope: NodeScope = ids.into_iter().collect();
    tracing::debug!(base = %base, nodes = scope.len(), "resolved subtree scope");
    Ok(scope)
}

/// Computes the security perimeter of a caller anchored at `caller_node`.
///
/// The caller reaches its own node and everything beneath it. Recomputed on
/// every call; an unknown node yields an empty scope.
pub async fn resolve_accessible_scope<S>(store: &S, caller_node: &NodeId) -> Result<NodeScope>
where
    S: TreeStore + ?Sized + Sync,
{
    let scope = resolve_scope(store, caller_node, true).await?;
    if scope.is_empty() {
        tracing::warn!(node = %caller_node, "caller node not found; scope is empty");
    }
    Ok(scope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::model::{Node, NodeDraft};
    use crate::types::NodeKind;
    use async_trait::async_trait;
    use futures::executor::block_on;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TestTree {
        nodes: Vec<Node>,
        lookups: AtomicUsize,
        fail: bool,
    }

    impl TestTree {
        fn scenario() -> Self {
            let root = NodeDraft::root("Root", NodeKind::Office).into_node(id("1"));
            let office = root.child("Office", NodeKind::Office).into_node(id("2"));
            let store = office.child("Store", NodeKind::Store).into_node(id("3"));
            Self {
                nodes: vec![root, office, store],
                ..Self::default()
            }
        }
    }

    fn id(value: &str) -> NodeId {
        NodeId::try_from(value).unwrap()
    }

    fn ids(scope: &NodeScope) -> Vec<String> {
        scope
            .to_sorted_vec()
            .into_iter()
            .map(|id| id.as_str().to_string())
            .collect()
    }

    #[async_trait]
    impl TreeStore for TestTree {
        async fn node(&self, id: NodeId) -> std::result::Result<Option<Node>, StoreError> {
            Ok(self.nodes.iter().find(|node| node.id == id).cloned())
        }

        async fn node_by_name_and_parent(
            &self,
            name: String,
            parent: Option<NodeId>,
        ) -> std::result::Result<Option<Node>, StoreError> {
            Ok(self
                .nodes
                .iter()
                .find(|node| node.name == name && node.parent_id == parent)
                .cloned())
        }

        async fn nodes_by_name(&self, name: String) -> std::result::Result<Vec<Node>, StoreError> {
            Ok(self
                .nodes
                .iter()
                .filter(|node| node.name == name)
                .cloned()
                .collect())
        }

        async fn self_and_descendants(
            &self,
            id: NodeId,
        ) -> std::result::Result<Vec<NodeId>, StoreError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err("tree unavailable".into());
            }
            Ok(self
                .nodes
                .iter()
                .filter(|node| node.is_self_or_descendant_of(&id))
                .map(|node| node.id.clone())
                .collect())
        }

        async fn insert_node_if_absent(
            &self,
            draft: NodeDraft,
        ) -> std::result::Result<Node, StoreError> {
            Ok(draft.into_node(id("unused")))
        }
    }

    #[test]
    fn descendants_span_subtree_only() {
        let tree = TestTree::scenario();
        let scope = block_on(resolve_scope(&tree, &id("2"), true)).unwrap();
        assert_eq!(ids(&scope), vec!["2", "3"]);

        let scope = block_on(resolve_scope(&tree, &id("1"), true)).unwrap();
        assert_eq!(ids(&scope), vec!["1", "2", "3"]);

        let scope = block_on(resolve_scope(&tree, &id("3"), true)).unwrap();
        assert_eq!(ids(&scope), vec!["3"]);
    }

    #[test]
    fn without_descendants_scope_is_singleton_and_skips_store() {
        let tree = TestTree::scenario();
        let scope = block_on(resolve_scope(&tree, &id("1"), false)).unwrap();
        assert_eq!(ids(&scope), vec!["1"]);

        let scope = block_on(resolve_scope(&tree, &id("missing"), false)).unwrap();
        assert_eq!(ids(&scope), vec!["missing"]);
        assert_eq!(tree.lookups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unknown_base_with_descendants_is_empty() {
        let tree = TestTree::scenario();
        let scope = block_on(resolve_scope(&tree, &id("missing"), true)).unwrap();
        assert!(scope.is_empty());
    }

    #[test]
    fn accessible_scope_is_idempotent() {
        let tree = TestTree::scenario();
        let first = block_on(resolve_accessible_scope(&tree, &id("2"))).unwrap();
        let second = block_on(resolve_accessible_scope(&tree, &id("2"))).unwrap();
        assert_eq!(first, second);
        assert_eq!(tree.lookups.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn store_failure_propagates_as_store_error() {
        let tree = TestTree {
            fail: true,
            ..TestTree::scenario()
        };
        let result = block_on(resolve_accessible_scope(&tree, &id("2")));
        assert!(matches!(result, Err(Error::Store(_))));
    }
}
