// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hierarchical membership and access control.
//!
//! Users, groups and resources form a directed graph of membership edges. A user has access to a
//! group or resource when a path of edges leads from the user to it, groups can be nested into
//! each other as long as no cycle is formed. Workspace admins bypass all access checks.
//!
//! Every mutation is a pure state transition (see `group`, `membership` and `admin`) which either
//! returns a new `MembershipState` or an error, leaving the original untouched. The `Engine` wraps
//! these functions with snapshot reads, serialized writes and persistence through a `GraphStore`.
//!
//! ```
//! use membership_engine::{Config, Engine, MemoryStore, Object, Subject};
//! # use membership_engine::{Directory, IdentityHandle};
//! # #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
//! # struct Id(u8);
//! # impl std::fmt::Display for Id {
//! #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//! #         write!(f, "{}", self.0)
//! #     }
//! # }
//! # impl IdentityHandle for Id {}
//! # struct Everyone;
//! # impl Directory<Id> for Everyone {
//! #     fn user_exists(&self, _: &Id) -> bool { true }
//! #     fn resource_exists(&self, _: &Id) -> bool { true }
//! # }
//! let (alice, bob, document) = (Id(1), Id(2), Id(3));
//! let engine = Engine::open(Everyone, MemoryStore::new(), Config::default()).unwrap();
//!
//! let team = engine.create_group(alice, "team").unwrap();
//! engine.add_member(alice, Subject::User(bob), Object::Group(team)).unwrap();
//! engine.add_member(alice, Subject::Group(team), Object::Resource(document)).unwrap();
//!
//! assert!(engine.has_access(&bob, &Object::Resource(document)));
//! ```
pub mod access;
pub mod admin;
mod config;
pub mod cycle;
mod engine;
mod error;
pub mod group;
pub mod membership;
mod memory_store;
pub mod state;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
pub mod traits;
mod types;

pub use config::{Config, DEFAULT_MAX_GROUP_NAME_LEN};
pub use engine::{Engine, EngineError};
pub use error::MembershipError;
pub use memory_store::MemoryStore;
pub use state::{GraphTables, MembershipState};
pub use traits::{Directory, GraphStore, IdentityHandle};
pub use types::{
    AdminFlag, Entity, Group, GroupId, Membership, MembershipId, Object, Subject, Timestamp,
};
