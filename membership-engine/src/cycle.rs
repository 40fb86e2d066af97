// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structural guard keeping the group containment graph acyclic.
use std::collections::HashSet;

use petgraph::Direction;
use petgraph::algo::is_cyclic_directed;
use tracing::{trace, warn};

use crate::error::MembershipError;
use crate::state::MembershipState;
use crate::traits::IdentityHandle;
use crate::types::GroupId;

/// Returns `true` if making `subject` a member of `object` would close a containment loop.
///
/// This is the case when `object` already is, directly or transitively, a member of `subject`,
/// as the new edge would then allow walking `subject ∈ object ∈ … ∈ subject` forever. A group
/// trying to become a member of itself is reported as a cycle as well.
///
/// The search starts at `subject` and walks towards its members with an explicit stack, every
/// group is expanded at most once. The number of examined edges is capped by the number of
/// containment edges, or by `limit` if that is larger. A healthy state never reaches the cap,
/// hitting it or finding `subject` among its own members means the graph was corrupted and is
/// reported as `InvariantViolation`.
pub fn would_create_cycle<ID>(
    y: &MembershipState<ID>,
    subject: GroupId,
    object: GroupId,
    limit: Option<usize>,
) -> Result<bool, MembershipError<ID>>
where
    ID: IdentityHandle,
{
    if subject == object {
        return Ok(true);
    }

    let containment = y.containment();
    let limit = limit.map_or(containment.edge_count(), |limit| {
        limit.max(containment.edge_count())
    });

    let mut visited = HashSet::from([subject]);
    let mut stack = vec![subject];
    let mut steps: usize = 0;

    while let Some(group) = stack.pop() {
        for member in containment.neighbors_directed(group, Direction::Incoming) {
            steps += 1;
            if steps > limit {
                warn!(%subject, %object, limit, "cycle check exceeded traversal limit");
                return Err(MembershipError::InvariantViolation(format!(
                    "cycle check from {subject} exceeded {limit} steps"
                )));
            }

            if member == object {
                trace!(%subject, %object, via = %group, "edge would close a containment cycle");
                return Ok(true);
            }

            if member == subject {
                warn!(%subject, "group is transitively a member of itself");
                return Err(MembershipError::InvariantViolation(format!(
                    "{subject} is transitively a member of itself"
                )));
            }

            if visited.insert(member) {
                stack.push(member);
            }
        }
    }

    Ok(false)
}

/// Verifies that the containment graph of a state does not contain any cycle.
pub fn check_acyclic<ID>(y: &MembershipState<ID>) -> Result<(), MembershipError<ID>>
where
    ID: IdentityHandle,
{
    if is_cyclic_directed(y.containment()) {
        warn!("containment graph contains a cycle");
        return Err(MembershipError::InvariantViolation(
            "containment graph contains a cycle".to_string(),
        ));
    }

    Ok(())
}
