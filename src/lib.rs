//! Hierarchical access control for multi-tenant organizations.
//!
//! Offices and stores form a tree whose nodes carry a materialized path of
//! ancestor ids. A caller anchored at a node may act on that node and its
//! whole subtree, never on siblings or ancestors. Every directory operation
//! resolves the nodes it touches and checks that they lie within the caller's
//! scope before reading or writing user records. Decisions are deny-by-default
//! and recomputed from the store on every request.
//!
//! # Examples
//!
//! Listing employees below the caller's node using the in-memory store
//! (enabled by the default `memory-store` feature):
//! ```no_run
//! use rs_orgtree::{DirectoryBuilder, Identity, ListQuery, Role};
//! # #[cfg(feature = "memory-store")]
//! # futures::executor::block_on(async {
//! use rs_orgtree::{MemoryStore, UserStore, provision};
//! let store = MemoryStore::new();
//! provision::seed_demo(&store, "<hash>").await?;
//! let directory = DirectoryBuilder::new(store).build();
//!
//! let manager = directory
//!     .store()
//!     .user_by_email(rs_orgtree::Email::new("m1.head-office@demo.rs")?)
//!     .await?
//!     .expect("seeded");
//! let ctx = directory
//!     .authenticate(Identity::new(manager.id, manager.role, manager.node_id))
//!     .await?;
//! let employees = directory
//!     .list_users(&ctx, ListQuery::new(Role::Employee).include_descendants(true))
//!     .await?;
//! # let _ = employees;
//! # Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
//! # });
//! ```
#![forbid(unsafe_code)]

mod directory;
mod error;
mod identity;
mod model;
mod resolver;
mod scope;
mod store;
mod types;

pub mod provision;

#[cfg(feature = "memory-store")]
mod memory_store;

#[cfg(feature = "axum")]
pub mod axum;

pub use crate::directory::{Directory, DirectoryBuilder, MutationScope};
pub use crate::error::{Error, ErrorKind, Result, StoreError};
pub use crate::identity::{CallerContext, Identity};
pub use crate::model::{ListQuery, NewUser, Node, NodeDraft, User, UserDraft, UserPatch};
pub use crate::resolver::{resolve_accessible_scope, resolve_scope};
pub use crate::scope::{Decision, NodeScope, evaluate, is_allowed};
pub use crate::store::{InsertOutcome, ReplaceOutcome, Store, TreeStore, UserStore};
pub use crate::types::{Email, NodeId, NodeKind, Role, UserId};

#[cfg(feature = "memory-store")]
pub use crate::memory_store::MemoryStore;
