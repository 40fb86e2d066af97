// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identifiers, records and the tagged unions connecting them.
use std::fmt::{Display, Formatter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::traits::IdentityHandle;

/// Microseconds since the UNIX epoch.
pub type Timestamp = u64;

/// Identifier of a group, minted by the engine when the group gets created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroupId(pub(crate) u64);

impl GroupId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Display for GroupId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// Identifier of a membership edge, minted by the engine when the edge gets inserted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MembershipId(pub(crate) u64);

impl MembershipId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Display for MembershipId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "membership#{}", self.0)
    }
}

/// Left side of a membership edge, the entity gaining access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Subject<ID> {
    User(ID),
    Group(GroupId),
}

impl<ID> Subject<ID> {
    pub fn as_group(&self) -> Option<GroupId> {
        match self {
            Subject::Group(id) => Some(*id),
            Subject::User(_) => None,
        }
    }
}

impl<ID: Display> Display for Subject<ID> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Subject::User(id) => write!(f, "user {id}"),
            Subject::Group(id) => write!(f, "{id}"),
        }
    }
}

/// Right side of a membership edge, the entity being accessed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Object<ID> {
    Group(GroupId),
    Resource(ID),
}

impl<ID> Object<ID> {
    pub fn as_group(&self) -> Option<GroupId> {
        match self {
            Object::Group(id) => Some(*id),
            Object::Resource(_) => None,
        }
    }
}

impl<ID: Display> Display for Object<ID> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Object::Group(id) => write!(f, "{id}"),
            Object::Resource(id) => write!(f, "resource {id}"),
        }
    }
}

/// Any entity the engine can refer to, used to report what could not be found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity<ID> {
    User(ID),
    Group(GroupId),
    Resource(ID),
    Membership(MembershipId),
}

impl<ID> From<Subject<ID>> for Entity<ID> {
    fn from(subject: Subject<ID>) -> Self {
        match subject {
            Subject::User(id) => Entity::User(id),
            Subject::Group(id) => Entity::Group(id),
        }
    }
}

impl<ID> From<Object<ID>> for Entity<ID> {
    fn from(object: Object<ID>) -> Self {
        match object {
            Object::Group(id) => Entity::Group(id),
            Object::Resource(id) => Entity::Resource(id),
        }
    }
}

impl<ID: Display> Display for Entity<ID> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::User(id) => write!(f, "user {id}"),
            Entity::Group(id) => write!(f, "{id}"),
            Entity::Resource(id) => write!(f, "resource {id}"),
            Entity::Membership(id) => write!(f, "{id}"),
        }
    }
}

/// Returns `true` if both sides of an edge name the same entity.
///
/// Users and resources live in different namespaces, so only a group can be a member of itself.
pub fn is_same_entity<ID>(subject: &Subject<ID>, object: &Object<ID>) -> bool {
    matches!((subject, object), (Subject::Group(a), Object::Group(b)) if a == b)
}

/// A named container of members.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub created_at: Timestamp,
}

/// Directed edge stating that `subject` is a direct member of `object`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Membership<ID> {
    pub id: MembershipId,
    pub created_at: Timestamp,
    pub subject: Subject<ID>,
    pub object: Object<ID>,
}

impl<ID> Membership<ID>
where
    ID: IdentityHandle,
{
    /// Returns `true` if both sides of this edge are groups.
    pub fn is_containment(&self) -> bool {
        self.subject.as_group().is_some() && self.object.as_group().is_some()
    }

    /// Returns `true` if the given group appears on either side of this edge.
    pub fn names_group(&self, group: GroupId) -> bool {
        self.subject == Subject::Group(group) || self.object == Object::Group(group)
    }
}

/// Administrative privilege record of a single user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AdminFlag {
    pub is_admin: bool,
    pub updated_at: Timestamp,
}
