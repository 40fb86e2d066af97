// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

use crate::types::{Entity, GroupId, MembershipId};

/// Reasons a query or mutation of the membership graph was rejected.
///
/// Every mutation failing with one of these leaves the graph exactly as it was before the call.
#[derive(Debug, Error, PartialEq)]
pub enum MembershipError<ID> {
    #[error("{0} does not exist")]
    NotFound(Entity<ID>),

    #[error("{0} can not be a member of itself")]
    SelfMembership(GroupId),

    #[error("membership already exists: {0}")]
    DuplicateMembership(MembershipId),

    #[error("adding {subject} to {object} would create a containment cycle")]
    Cycle { subject: GroupId, object: GroupId },

    #[error("actor lacks access to perform this change: {0}")]
    NotAuthorized(ID),

    #[error("membership graph is corrupted: {0}")]
    InvariantViolation(String),

    #[error("invalid group name: {0}")]
    InvalidName(String),

    #[error("an admin was already bootstrapped")]
    AlreadyBootstrapped,
}
