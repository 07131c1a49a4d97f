use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{Node, NodeDraft, User, UserDraft};
use crate::scope::NodeScope;
use crate::store::{InsertOutcome, ReplaceOutcome, TreeStore, UserStore};
use crate::types::{Email, NodeId, Role, UserId};

/// In-memory store implementation for tests and demos.
///
/// Uniqueness of (name, parent) and of email is enforced under the table's
/// write lock, so concurrent inserts cannot both succeed. The tree holds a
/// single root, and a child's path is always rebuilt from its stored parent.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    nodes: RwLock<NodeTable>,
    users: RwLock<UserTable>,
    sequence: AtomicU64,
}

#[derive(Debug, Default)]
struct NodeTable {
    root: Option<NodeId>,
    by_id: BTreeMap<NodeId, Node>,
    by_path: HashMap<(String, Option<NodeId>), NodeId>,
}

#[derive(Debug, Default)]
struct UserTable {
    by_id: BTreeMap<UserId, User>,
    by_email: HashMap<Email, UserId>,
}

fn poisoned() -> StoreError {
    "memory store lock poisoned".into()
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> Result<usize, StoreError> {
        Ok(self.nodes()?.by_id.len())
    }

    /// Number of users.
    pub fn user_count(&self) -> Result<usize, StoreError> {
        Ok(self.users()?.by_id.len())
    }

    fn next_id(&self, prefix: &str) -> String {
        let seq = self.inner.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}_{seq:012x}")
    }

    fn nodes(&self) -> Result<RwLockReadGuard<'_, NodeTable>, StoreError> {
        self.inner.nodes.read().map_err(|_| poisoned())
    }

    fn nodes_mut(&self) -> Result<RwLockWriteGuard<'_, NodeTable>, StoreError> {
        self.inner.nodes.write().map_err(|_| poisoned())
    }

    fn users(&self) -> Result<RwLockReadGuard<'_, UserTable>, StoreError> {
        self.inner.users.read().map_err(|_| poisoned())
    }

    fn users_mut(&self) -> Result<RwLockWriteGuard<'_, UserTable>, StoreError> {
        self.inner.users.write().map_err(|_| poisoned())
    }
}

#[async_trait]
impl TreeStore for MemoryStore {
    async fn node(&self, id: NodeId) -> std::result::Result<Option<Node>, StoreError> {
        Ok(self.nodes()?.by_id.get(&id).cloned())
    }

    async fn node_by_name_and_parent(
        &self,
        name: String,
        parent: Option<NodeId>,
    ) -> std::result::Result<Option<Node>, StoreError> {
        let guard = self.nodes()?;
        Ok(guard
            .by_path
            .get(&(name, parent))
            .and_then(|id| guard.by_id.get(id))
            .cloned())
    }

    async fn nodes_by_name(&self, name: String) -> std::result::Result<Vec<Node>, StoreError> {
        let guard = self.nodes()?;
        Ok(guard
            .by_id
            .values()
            .filter(|node| node.name == name)
            .cloned()
            .collect())
    }

    async fn self_and_descendants(
        &self,
        id: NodeId,
    ) -> std::result::Result<Vec<NodeId>, StoreError> {
        let guard = self.nodes()?;
        Ok(guard
            .by_id
            .values()
            .filter(|node| node.is_self_or_descendant_of(&id))
            .map(|node| node.id.clone())
            .collect())
    }

    async fn insert_node_if_absent(
        &self,
        mut draft: NodeDraft,
    ) -> std::result::Result<Node, StoreError> {
        let mut guard = self.nodes_mut()?;
        let key = (draft.name.clone(), draft.parent_id.clone());
        if let Some(existing) = guard.by_path.get(&key).and_then(|id| guard.by_id.get(id)) {
            return Ok(existing.clone());
        }

        match &draft.parent_id {
            None => {
                if let Some(root) = &guard.root {
                    return Err(format!("tree already has root node {root}").into());
                }
                draft.superiors.clear();
            }
            Some(parent_id) => {
                let Some(parent) = guard.by_id.get(parent_id) else {
                    return Err(format!("parent node {parent_id} does not exist").into());
                };
                let mut superiors = Vec::with_capacity(parent.superiors.len() + 1);
                superiors.extend(parent.superiors.iter().cloned());
                superiors.push(parent.id.clone());
                draft.superiors = superiors;
            }
        }

        let node = draft.into_node(NodeId::from_string(self.next_id("node")));
        if node.is_root() {
            guard.root = Some(node.id.clone());
        }
        guard.by_path.insert(key, node.id.clone());
        guard.by_id.insert(node.id.clone(), node.clone());
        Ok(node)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn user(&self, id: UserId) -> std::result::Result<Option<User>, StoreError> {
        Ok(self.users()?.by_id.get(&id).cloned())
    }

    async fn user_by_email(&self, email: Email) -> std::result::Result<Option<User>, StoreError> {
        let guard = self.users()?;
        Ok(guard
            .by_email
            .get(&email)
            .and_then(|id| guard.by_id.get(id))
            .cloned())
    }

    async fn users_in_scope(
        &self,
        role: Role,
        scope: NodeScope,
    ) -> std::result::Result<Vec<User>, StoreError> {
        let guard = self.users()?;
        Ok(guard
            .by_id
            .values()
            .filter(|user| user.role == role && scope.contains(&user.node_id))
            .cloned()
            .collect())
    }

    async fn insert_user(
        &self,
        draft: UserDraft,
    ) -> std::result::Result<InsertOutcome<User>, StoreError> {
        let mut guard = self.users_mut()?;
        if guard.by_email.contains_key(&draft.email) {
            return Ok(InsertOutcome::Duplicate);
        }
        let user = draft.into_user(UserId::from_string(self.next_id("user")));
        guard.by_email.insert(user.email.clone(), user.id.clone());
        guard.by_id.insert(user.id.clone(), user.clone());
        Ok(InsertOutcome::Inserted(user))
    }

    async fn replace_user(&self, user: User) -> std::result::Result<ReplaceOutcome, StoreError> {
        let mut guard = self.users_mut()?;
        let Some(previous_email) = guard.by_id.get(&user.id).map(|u| u.email.clone()) else {
            return Ok(ReplaceOutcome::Missing);
        };
        if let Some(holder) = guard.by_email.get(&user.email)
            && holder != &user.id
        {
            return Ok(ReplaceOutcome::Duplicate);
        }

        guard.by_email.remove(&previous_email);
        guard.by_email.insert(user.email.clone(), user.id.clone());
        guard.by_id.insert(user.id.clone(), user);
        Ok(ReplaceOutcome::Replaced)
    }

    async fn delete_user(&self, id: UserId) -> std::result::Result<bool, StoreError> {
        let mut guard = self.users_mut()?;
        match guard.by_id.remove(&id) {
            Some(user) => {
                guard.by_email.remove(&user.email);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
