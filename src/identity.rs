use crate::error::{Error, Result};
use crate::scope::NodeScope;
use crate::types::{NodeId, Role, UserId};

/// Verified caller identity handed to the core by an authentication step.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Identity {
    /// Authenticated user.
    pub user_id: UserId,
    /// Role claimed at authentication time.
    pub role: Role,
    /// Node the caller is anchored at.
    pub node_id: NodeId,
}

impl Identity {
    /// Creates an identity.
    pub fn new(user_id: UserId, role: Role, node_id: NodeId) -> Self {
        Self {
            user_id,
            role,
            node_id,
        }
    }
}

/// Per-request caller context: the identity plus its accessible node set.
///
/// Built by [`crate::Directory::authenticate`] for a single request and
/// dropped with it.
#[derive(Debug, Clone)]
pub struct CallerContext {
    identity: Identity,
    scope: NodeScope,
}

impl CallerContext {
    pub(crate) fn new(identity: Identity, scope: NodeScope) -> Self {
        Self { identity, scope }
    }

    /// Caller identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Node the caller is anchored at.
    pub fn node_id(&self) -> &NodeId {
        &self.identity.node_id
    }

    /// Caller role.
    pub fn role(&self) -> Role {
        self.identity.role
    }

    /// Nodes the caller may act upon.
    pub fn scope(&self) -> &NodeScope {
        &self.scope
    }

    /// Coarse role gate applied before directory operations.
    pub fn require_role(&self, role: Role) -> Result<()> {
        if self.identity.role == role {
            Ok(())
        } else {
            tracing::warn!(
                user = %self.identity.user_id,
                role = %self.identity.role,
                required = %role,
                "role gate denied"
            );
            Err(Error::Forbidden)
        }
    }
}
