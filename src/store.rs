use crate::error::StoreError;
use crate::model::{Node, NodeDraft, User, UserDraft};
use crate::scope::NodeScope;
use crate::types::{Email, NodeId, Role, UserId};
use async_trait::async_trait;

/// Result of a conditional insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome<T> {
    /// The record was written.
    Inserted(T),
    /// A uniqueness constraint rejected the write.
    Duplicate,
}

/// Result of replacing an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// The record was overwritten.
    Replaced,
    /// No record with that id exists.
    Missing,
    /// A uniqueness constraint rejected the write.
    Duplicate,
}

/// Store interface for the organization tree.
#[async_trait]
pub trait TreeStore {
    /// Looks a node up by id.
    async fn node(&self, id: NodeId) -> std::result::Result<Option<Node>, StoreError>;

    /// Looks a node up by its sibling-unique key.
    async fn node_by_name_and_parent(
        &self,
        name: String,
        parent: Option<NodeId>,
    ) -> std::result::Result<Option<Node>, StoreError>;

    /// Returns every node carrying `name`, anywhere in the tree.
    async fn nodes_by_name(&self, name: String) -> std::result::Result<Vec<Node>, StoreError>;

    /// Returns `id` and every node whose materialized path contains `id`.
    ///
    /// Returns an empty list when `id` does not exist.
    async fn self_and_descendants(&self, id: NodeId)
    -> std::result::Result<Vec<NodeId>, StoreError>;

    /// Inserts the draft unless a node with the same (name, parent) exists,
    /// in which case the existing node is returned untouched.
    ///
    /// Implementations reject a second root and a missing parent, and derive
    /// the new node's path from the stored parent rather than the draft.
    async fn insert_node_if_absent(
        &self,
        draft: NodeDraft,
    ) -> std::result::Result<Node, StoreError>;
}

/// Store interface for user records.
#[async_trait]
pub trait UserStore {
    /// Looks a user up by id.
    async fn user(&self, id: UserId) -> std::result::Result<Option<User>, StoreError>;

    /// Looks a user up by normalized email.
    async fn user_by_email(&self, email: Email) -> std::result::Result<Option<User>, StoreError>;

    /// Returns users of `role` attached to any node in `scope`.
    async fn users_in_scope(
        &self,
        role: Role,
        scope: NodeScope,
    ) -> std::result::Result<Vec<User>, StoreError>;

    /// Inserts the draft unless the email is already taken. Must be atomic.
    async fn insert_user(
        &self,
        draft: UserDraft,
    ) -> std::result::Result<InsertOutcome<User>, StoreError>;

    /// Overwrites the user with the same id. Email uniqueness is checked
    /// against every other user atomically with the write.
    async fn replace_user(&self, user: User) -> std::result::Result<ReplaceOutcome, StoreError>;

    /// Removes a user, returning whether one was removed.
    async fn delete_user(&self, id: UserId) -> std::result::Result<bool, StoreError>;
}

/// Composite store trait.
pub trait Store: TreeStore + UserStore + Send + Sync {}

impl<T> Store for T where T: TreeStore + UserStore + Send + Sync {}
