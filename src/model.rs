//! Domain records: organization nodes, users and operation inputs.

use crate::types::{Email, NodeId, NodeKind, Role, UserId};

/// A unit of the organization tree.
///
/// `superiors` is the materialized path: ancestor ids from the root down to
/// the immediate parent. It is fixed when the node is created.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Node {
    /// Node identifier.
    pub id: NodeId,
    /// Display name, unique among siblings.
    pub name: String,
    /// Office or store.
    pub kind: NodeKind,
    /// Parent node; `None` only for the root.
    pub parent_id: Option<NodeId>,
    /// Ancestor ids, root first.
    pub superiors: Vec<NodeId>,
}

impl Node {
    /// Returns whether this node is the root of the tree.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Number of ancestors above this node.
    pub fn depth(&self) -> usize {
        self.superiors.len()
    }

    /// Returns whether this node is `ancestor` itself or lies beneath it.
    pub fn is_self_or_descendant_of(&self, ancestor: &NodeId) -> bool {
        &self.id == ancestor || self.superiors.contains(ancestor)
    }

    /// Builds the draft of a child node, extending this node's path.
    pub fn child(&self, name: impl Into<String>, kind: NodeKind) -> NodeDraft {
        let mut superiors = Vec::with_capacity(self.superiors.len() + 1);
        superiors.extend(self.superiors.iter().cloned());
        superiors.push(self.id.clone());
        NodeDraft {
            name: name.into(),
            kind,
            parent_id: Some(self.id.clone()),
            superiors,
        }
    }
}

/// A node that has not been persisted yet; the store assigns the id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeDraft {
    pub(crate) name: String,
    pub(crate) kind: NodeKind,
    pub(crate) parent_id: Option<NodeId>,
    pub(crate) superiors: Vec<NodeId>,
}

impl NodeDraft {
    /// Builds the draft of a root node.
    pub fn root(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent_id: None,
            superiors: Vec::new(),
        }
    }

    /// Draft name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Draft kind.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Parent of the draft.
    pub fn parent_id(&self) -> Option<&NodeId> {
        self.parent_id.as_ref()
    }

    /// Ancestor path of the draft.
    pub fn superiors(&self) -> &[NodeId] {
        &self.superiors
    }

    /// Materializes the draft under `id`.
    pub fn into_node(self, id: NodeId) -> Node {
        Node {
            id,
            name: self.name,
            kind: self.kind,
            parent_id: self.parent_id,
            superiors: self.superiors,
        }
    }
}

/// An actor attached to exactly one node.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Globally unique, lowercase email.
    pub email: Email,
    /// Role within the organization.
    pub role: Role,
    /// Opaque credential hash produced by an external hasher.
    #[cfg_attr(feature = "serde", serde(skip_serializing))]
    pub credential_hash: String,
    /// Node the user belongs to.
    pub node_id: NodeId,
}

/// A user that has not been persisted yet; the store assigns the id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserDraft {
    pub name: String,
    pub email: Email,
    pub role: Role,
    pub credential_hash: String,
    pub node_id: NodeId,
}

impl UserDraft {
    /// Materializes the draft under `id`.
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            role: self.role,
            credential_hash: self.credential_hash,
            node_id: self.node_id,
        }
    }
}

/// Input for creating a user under a named node.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub role: Role,
    pub node_name: String,
    pub credential_hash: String,
}

/// Partial update of a user. Absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub role: Option<Role>,
    pub node_name: Option<String>,
}

impl UserPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the new display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the new email.
    pub fn email(mut self, email: Email) -> Self {
        self.email = Some(email);
        self
    }

    /// Sets the new role.
    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Re-assigns the user to the node with this name.
    pub fn node_name(mut self, node_name: impl Into<String>) -> Self {
        self.node_name = Some(node_name.into());
        self
    }

    /// Returns whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.node_name.is_none()
    }
}

/// Parameters of a list operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListQuery {
    /// Node the listing starts from; the caller's own node when `None`.
    pub base_node: Option<NodeId>,
    /// Whether the listing spans the whole subtree.
    pub include_descendants: bool,
    /// Role filter.
    pub role: Role,
}

impl ListQuery {
    /// Lists users of `role` attached directly to the caller's node.
    pub fn new(role: Role) -> Self {
        Self {
            base_node: None,
            include_descendants: false,
            role,
        }
    }

    /// Starts the listing from `node` instead of the caller's node.
    pub fn base_node(mut self, node: NodeId) -> Self {
        self.base_node = Some(node);
        self
    }

    /// Spans the subtree below the base node.
    pub fn include_descendants(mut self, on: bool) -> Self {
        self.include_descendants = on;
        self
    }
}
