use crate::error::{Error, Result};
use crate::identity::{CallerContext, Identity};
use crate::model::{ListQuery, NewUser, Node, User, UserDraft, UserPatch};
use crate::resolver::{resolve_accessible_scope, resolve_scope};
use crate::scope::{Decision, NodeScope, evaluate};
use crate::store::{InsertOutcome, ReplaceOutcome, Store};
use crate::types::{NodeId, UserId};

/// Which scope rule applies to create, update and delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationScope {
    /// The nodes a mutation touches must lie in the caller's subtree.
    #[default]
    CallerSubtree,
    /// Any caller past the upstream role gate may mutate users under any node.
    Unrestricted,
}

/// Scoped user directory over a pluggable store.
#[derive(Debug)]
pub struct Directory<S> {
    store: S,
    mutation_scope: MutationScope,
}

/// Builder for [`Directory`].
pub struct DirectoryBuilder<S> {
    store: S,
    mutation_scope: MutationScope,
}

impl<S> DirectoryBuilder<S> {
    /// Creates a new builder with default configuration.
    pub fn new(store: S) -> Self {
        Self {
            store,
            mutation_scope: MutationScope::default(),
        }
    }

    /// Sets the scope rule for mutations.
    pub fn mutation_scope(mut self, scope: MutationScope) -> Self {
        self.mutation_scope = scope;
        self
    }

    /// Builds the directory.
    pub fn build(self) -> Directory<S> {
        Directory {
            store: self.store,
            mutation_scope: self.mutation_scope,
        }
    }
}

impl<S> Directory<S>
where
    S: Store,
{
    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the configured mutation scope rule.
    pub fn mutation_scope(&self) -> MutationScope {
        self.mutation_scope
    }

    /// Derives the caller context for one request.
    ///
    /// The accessible scope is read from the store on every call.
    pub async fn authenticate(&self, identity: Identity) -> Result<CallerContext> {
        let scope = resolve_accessible_scope(&self.store, &identity.node_id).await?;
        Ok(CallerContext::new(identity, scope))
    }

    /// Computes the node ids a query rooted at `base` spans.
    pub async fn resolve_scope(&self, base: &NodeId, include_descendants: bool) -> Result<NodeScope> {
        resolve_scope(&self.store, base, include_descendants).await
    }

    /// Lists users of the requested role within the requested scope.
    pub async fn list_users(&self, ctx: &CallerContext, query: ListQuery) -> Result<Vec<User>> {
        let base = query.base_node.unwrap_or_else(|| ctx.node_id().clone());
        let target = self.resolve_scope(&base, query.include_descendants).await?;
        if target.is_empty() {
            tracing::warn!(
                user = %ctx.identity().user_id,
                base = %base,
                "list denied: base node has no subtree"
            );
            return Err(Error::Forbidden);
        }
        authorize(ctx, &target, "list")?;

        let users = self
            .store
            .users_in_scope(query.role, target)
            .await
            .map_err(Error::from)?;
        tracing::debug!(base = %base, role = %query.role, count = users.len(), "listed users");
        Ok(users)
    }

    /// Loads a single user the caller may see.
    ///
    /// Users outside the caller scope are reported as not found.
    pub async fn user(&self, ctx: &CallerContext, id: &UserId) -> Result<User> {
        let user = self.load_user(id).await?;
        match authorize(ctx, &NodeScope::singleton(user.node_id.clone()), "read") {
            Ok(()) => Ok(user),
            Err(Error::Forbidden) => Err(Error::UserNotFound { user: id.clone() }),
            Err(err) => Err(err),
        }
    }

    /// Creates a user under the node named in `input`.
    pub async fn create_user(&self, ctx: &CallerContext, input: NewUser) -> Result<User> {
        let node = self.node_named(&input.node_name).await?;
        self.authorize_mutation(ctx, &node.id, "create")?;

        if self
            .store
            .user_by_email(input.email.clone())
            .await
            .map_err(Error::from)?
            .is_some()
        {
            return Err(Error::EmailConflict { email: input.email });
        }

        let draft = UserDraft {
            name: input.name,
            email: input.email.clone(),
            role: input.role,
            credential_hash: input.credential_hash,
            node_id: node.id,
        };
        match self.store.insert_user(draft).await.map_err(Error::from)? {
            InsertOutcome::Inserted(user) => {
                tracing::info!(
                    actor = %ctx.identity().user_id,
                    user = %user.id,
                    node = %user.node_id,
                    role = %user.role,
                    "user created"
                );
                Ok(user)
            }
            InsertOutcome::Duplicate => Err(Error::EmailConflict { email: input.email }),
        }
    }

    /// Applies `patch` to a user in a single write.
    ///
    /// Every supplied field is validated before anything is written; on error
    /// the stored record is unchanged.
    pub async fn update_user(
        &self,
        ctx: &CallerContext,
        id: &UserId,
        patch: UserPatch,
    ) -> Result<User> {
        let current = self.load_user(id).await?;
        self.authorize_mutation(ctx, &current.node_id, "update")?;
        if patch.is_empty() {
            return Ok(current);
        }

        let mut updated = current.clone();
        if let Some(node_name) = patch.node_name.as_deref() {
            let node = self.node_named(node_name).await?;
            self.authorize_mutation(ctx, &node.id, "reassign")?;
            updated.node_id = node.id;
        }
        if let Some(email) = patch.email {
            if let Some(holder) = self
                .store
                .user_by_email(email.clone())
                .await
                .map_err(Error::from)?
                && holder.id != current.id
            {
                return Err(Error::EmailConflict { email });
            }
            updated.email = email;
        }
        if let Some(name) = patch.name {
            updated.name = name;
        }
        if let Some(role) = patch.role {
            updated.role = role;
        }

        match self
            .store
            .replace_user(updated.clone())
            .await
            .map_err(Error::from)?
        {
            ReplaceOutcome::Replaced => {
                tracing::info!(
                    actor = %ctx.identity().user_id,
                    user = %updated.id,
                    node = %updated.node_id,
                    "user updated"
                );
                Ok(updated)
            }
            ReplaceOutcome::Missing => Err(Error::UserNotFound { user: id.clone() }),
            ReplaceOutcome::Duplicate => Err(Error::EmailConflict {
                email: updated.email,
            }),
        }
    }

    /// Removes a user.
    pub async fn delete_user(&self, ctx: &CallerContext, id: &UserId) -> Result<()> {
        let user = self.load_user(id).await?;
        self.authorize_mutation(ctx, &user.node_id, "delete")?;

        if !self
            .store
            .delete_user(id.clone())
            .await
            .map_err(Error::from)?
        {
            return Err(Error::UserNotFound { user: id.clone() });
        }
        tracing::info!(actor = %ctx.identity().user_id, user = %id, "user deleted");
        Ok(())
    }

    async fn load_user(&self, id: &UserId) -> Result<User> {
        self.store
            .user(id.clone())
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::UserNotFound { user: id.clone() })
    }

    async fn node_named(&self, name: &str) -> Result<Node> {
        let mut nodes = self
            .store
            .nodes_by_name(name.to_string())
            .await
            .map_err(Error::from)?;
        match nodes.len() {
            0 => Err(Error::NodeNotFound {
                node: name.to_string(),
            }),
            1 => Ok(nodes.remove(0)),
            matches => Err(Error::AmbiguousNode {
                name: name.to_string(),
                matches,
            }),
        }
    }

    fn authorize_mutation(&self, ctx: &CallerContext, node: &NodeId, action: &str) -> Result<()> {
        match self.mutation_scope {
            MutationScope::CallerSubtree => {
                authorize(ctx, &NodeScope::singleton(node.clone()), action)
            }
            MutationScope::Unrestricted => Ok(()),
        }
    }
}

fn authorize(ctx: &CallerContext, target: &NodeScope, action: &str) -> Result<()> {
    match evaluate(ctx.scope(), target) {
        Decision::Allow => {
            tracing::debug!(
                user = %ctx.identity().user_id,
                action,
                targets = target.len(),
                "access allowed"
            );
            Ok(())
        }
        Decision::Deny => {
            tracing::warn!(
                user = %ctx.identity().user_id,
                node = %ctx.node_id(),
                action,
                targets = target.len(),
                "access denied: target outside caller scope"
            );
            Err(Error::Forbidden)
        }
    }
}
