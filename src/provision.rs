//! Tree provisioning and demo seeding.
//!
//! Node creation is not part of the request path. These helpers are used by
//! administrative tooling and tests to build a tree whose materialized paths
//! are computed from the parent at creation time.

use crate::error::{Error, Result};
use crate::model::{Node, NodeDraft, User, UserDraft};
use crate::store::{InsertOutcome, Store, TreeStore, UserStore};
use crate::types::{Email, NodeKind, Role};

/// Returns the node named `name` under `parent`, creating it when absent.
pub async fn ensure_node<S>(
    store: &S,
    name: &str,
    kind: NodeKind,
    parent: Option<&Node>,
) -> Result<Node>
where
    S: TreeStore + ?Sized + Sync,
{
    let draft = match parent {
        Some(parent) => parent.child(name, kind),
        None => NodeDraft::root(name, kind),
    };
    store.insert_node_if_absent(draft).await.map_err(Error::from)
}

/// Returns the user holding the draft's email, creating it when absent.
///
/// An existing user is returned as stored; the draft is not applied to it.
pub async fn ensure_user<S>(store: &S, draft: UserDraft) -> Result<User>
where
    S: UserStore + ?Sized + Sync,
{
    let email = draft.email.clone();
    match store.insert_user(draft).await.map_err(Error::from)? {
        InsertOutcome::Inserted(user) => Ok(user),
        InsertOutcome::Duplicate => store
            .user_by_email(email.clone())
            .await
            .map_err(Error::from)?
            .ok_or(Error::EmailConflict { email }),
    }
}

/// Counts of records present after seeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub nodes: usize,
    pub users: usize,
}

// (name, kind, parent name); parents precede their children.
const DEMO_TREE: &[(&str, NodeKind, Option<&str>)] = &[
    ("Head Office", NodeKind::Office, None),
    ("North Region", NodeKind::Office, Some("Head Office")),
    ("North District", NodeKind::Office, Some("North Region")),
    ("Riverside", NodeKind::Office, Some("North District")),
    ("Store 1", NodeKind::Store, Some("Riverside")),
    ("South District", NodeKind::Office, Some("North Region")),
    ("Old Town", NodeKind::Office, Some("South District")),
    ("Market Square", NodeKind::Office, Some("Old Town")),
    ("Store 2", NodeKind::Store, Some("Market Square")),
    ("Store 3", NodeKind::Store, Some("Market Square")),
    ("Harbour", NodeKind::Office, Some("Old Town")),
    ("Store 4", NodeKind::Store, Some("Harbour")),
    ("Store 5", NodeKind::Store, Some("Harbour")),
    ("Capital Region", NodeKind::Office, Some("Head Office")),
    ("New Quarter", NodeKind::Office, Some("Capital Region")),
    ("Westgate", NodeKind::Office, Some("New Quarter")),
    ("Store 6", NodeKind::Store, Some("Westgate")),
    ("Hillside", NodeKind::Office, Some("Capital Region")),
    ("Parkview", NodeKind::Office, Some("Hillside")),
    ("Store 7", NodeKind::Store, Some("Parkview")),
    ("Red Cross", NodeKind::Office, Some("Hillside")),
    ("Store 8", NodeKind::Store, Some("Red Cross")),
];

/// Seeds a demo organization with users.
///
/// Every office gets one manager and two employees, every store three
/// employees. Emails follow `m<n>.<node>@demo.rs` / `e<n>.<node>@demo.rs`.
/// Running it twice leaves the store unchanged.
pub async fn seed_demo<S>(store: &S, credential_hash: &str) -> Result<SeedReport>
where
    S: Store + ?Sized,
{
    let mut nodes: Vec<Node> = Vec::with_capacity(DEMO_TREE.len());
    for (name, kind, parent) in DEMO_TREE {
        let parent = match parent {
            Some(parent_name) => Some(
                nodes
                    .iter()
                    .find(|node| node.name == *parent_name)
                    .ok_or_else(|| Error::NodeNotFound {
                        node: parent_name.to_string(),
                    })?,
            ),
            None => None,
        };
        let node = ensure_node(store, name, *kind, parent).await?;
        nodes.push(node);
    }

    let mut users = 0;
    let mut managers_seq = 1;
    let mut employees_seq = 1;
    for node in &nodes {
        let (managers, employees) = match node.kind {
            NodeKind::Office => (1, 2),
            NodeKind::Store => (0, 3),
        };
        let slug = node.name.to_lowercase().replace(' ', "-");

        for _ in 0..managers {
            let email = Email::new(format!("m{managers_seq}.{slug}@demo.rs"))?;
            managers_seq += 1;
            ensure_user(
                store,
                UserDraft {
                    name: format!("Manager {}", node.name),
                    email,
                    role: Role::Manager,
                    credential_hash: credential_hash.to_string(),
                    node_id: node.id.clone(),
                },
            )
            .await?;
            users += 1;
        }
        for i in 0..employees {
            let email = Email::new(format!("e{employees_seq}.{slug}@demo.rs"))?;
            employees_seq += 1;
            ensure_user(
                store,
                UserDraft {
                    name: format!("Employee {} {}", node.name, i + 1),
                    email,
                    role: Role::Employee,
                    credential_hash: credential_hash.to_string(),
                    node_id: node.id.clone(),
                },
            )
            .await?;
            users += 1;
        }
    }

    tracing::info!(nodes = nodes.len(), users, "demo organization seeded");
    Ok(SeedReport {
        nodes: nodes.len(),
        users,
    })
}
