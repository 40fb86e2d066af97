// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inserting and removing membership edges.
//!
//! Edges can only be granted into objects the caller already controls (or by admins), which
//! keeps outsiders from escalating their own privileges. Group-to-group edges are additionally
//! checked by the cycle guard before they get inserted.
use crate::access::has_access;
use crate::admin::is_admin;
use crate::config::Config;
use crate::cycle::would_create_cycle;
use crate::error::MembershipError;
use crate::state::MembershipState;
use crate::traits::{Directory, IdentityHandle};
use crate::types::{Entity, Membership, MembershipId, Object, Subject, Timestamp};

/// Makes `subject` a direct member of `object`.
///
/// Checks happen in this order, the first failing one decides the error:
///
/// 1. both sides exist (`NotFound`)
/// 2. both sides differ (`SelfMembership`)
/// 3. the caller is an admin or has access to `object` (`NotAuthorized`)
/// 4. the edge does not exist yet (`DuplicateMembership`)
/// 5. a group-to-group edge does not close a loop (`Cycle`)
pub fn add_member<ID, D>(
    y: MembershipState<ID>,
    directory: &D,
    config: &Config,
    caller: ID,
    subject: Subject<ID>,
    object: Object<ID>,
    now: Timestamp,
) -> Result<(MembershipState<ID>, MembershipId), MembershipError<ID>>
where
    ID: IdentityHandle,
    D: Directory<ID>,
{
    let subject_exists = match subject {
        Subject::User(user) => directory.user_exists(&user),
        Subject::Group(group) => y.has_group(group),
    };
    if !subject_exists {
        return Err(MembershipError::NotFound(subject.into()));
    }

    let object_exists = match object {
        Object::Group(group) => y.has_group(group),
        Object::Resource(resource) => directory.resource_exists(&resource),
    };
    if !object_exists {
        return Err(MembershipError::NotFound(object.into()));
    }

    match (subject, object) {
        (Subject::Group(member), Object::Group(container)) if member == container => {
            return Err(MembershipError::SelfMembership(member));
        }
        _ => (),
    }

    // Admins are covered by `has_access` already.
    if !has_access(&y, &caller, &object) {
        return Err(MembershipError::NotAuthorized(caller));
    }

    if let Some(existing) = y.edge(&subject, &object) {
        return Err(MembershipError::DuplicateMembership(existing));
    }

    if let (Subject::Group(member), Object::Group(container)) = (subject, object) {
        if would_create_cycle(&y, member, container, config.traversal_limit)? {
            return Err(MembershipError::Cycle {
                subject: member,
                object: container,
            });
        }
    }

    let mut y = y;
    let id = y.insert_membership(subject, object, now);
    Ok((y, id))
}

/// Removes a membership edge.
///
/// The caller needs to be an admin or have access to the edge's object. Removing the caller's
/// own last path to something, or the last path of any other member, is allowed; whether that
/// should be prevented is up to the application.
pub fn remove_member<ID>(
    y: MembershipState<ID>,
    caller: ID,
    membership: MembershipId,
) -> Result<(MembershipState<ID>, Membership<ID>), MembershipError<ID>>
where
    ID: IdentityHandle,
{
    let Some(object) = y.membership(membership).map(|membership| membership.object) else {
        return Err(MembershipError::NotFound(Entity::Membership(membership)));
    };

    if !has_access(&y, &caller, &object) {
        return Err(MembershipError::NotAuthorized(caller));
    }

    let mut y = y;
    let removed = y
        .remove_membership(membership)
        .ok_or(MembershipError::NotFound(Entity::Membership(membership)))?;
    Ok((y, removed))
}

/// All direct members of an object, ordered by membership id.
pub fn list_members<ID>(y: &MembershipState<ID>, object: &Object<ID>) -> Vec<Membership<ID>>
where
    ID: IdentityHandle,
{
    y.incoming(object).copied().collect()
}

/// Everything a subject is a direct member of, ordered by membership id.
pub fn memberships_of<ID>(y: &MembershipState<ID>, subject: &Subject<ID>) -> Vec<Membership<ID>>
where
    ID: IdentityHandle,
{
    y.outgoing(subject).copied().collect()
}

/// Removes every edge granting access to a resource.
///
/// Applications call this when they delete a resource, so no membership keeps pointing to it.
/// The resource itself does not need to exist anymore. Returns the removed memberships.
pub fn forget_resource<ID>(
    y: MembershipState<ID>,
    caller: ID,
    resource: ID,
) -> Result<(MembershipState<ID>, Vec<Membership<ID>>), MembershipError<ID>>
where
    ID: IdentityHandle,
{
    let object = Object::Resource(resource);
    if !has_access(&y, &caller, &object) {
        return Err(MembershipError::NotAuthorized(caller));
    }

    let ids: Vec<MembershipId> = y.incoming(&object).map(|membership| membership.id).collect();

    let mut y = y;
    let removed = ids
        .into_iter()
        .filter_map(|id| y.remove_membership(id))
        .collect();
    Ok((y, removed))
}

/// Removes every membership of a user and their admin flag.
///
/// Only admins may deprovision users. Returns the removed memberships.
pub fn forget_user<ID>(
    y: MembershipState<ID>,
    caller: ID,
    user: ID,
) -> Result<(MembershipState<ID>, Vec<Membership<ID>>), MembershipError<ID>>
where
    ID: IdentityHandle,
{
    if !is_admin(&y, &caller) {
        return Err(MembershipError::NotAuthorized(caller));
    }

    let subject = Subject::User(user);
    let ids: Vec<MembershipId> = y
        .outgoing(&subject)
        .map(|membership| membership.id)
        .collect();

    let mut y = y;
    let removed = ids
        .into_iter()
        .filter_map(|id| y.remove_membership(id))
        .collect();
    y.remove_admin_flag(&user);
    Ok((y, removed))
}
