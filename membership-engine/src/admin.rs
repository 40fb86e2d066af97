// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of users holding blanket administrative privilege.
use std::collections::BTreeSet;

use crate::error::MembershipError;
use crate::state::MembershipState;
use crate::traits::{Directory, IdentityHandle};
use crate::types::{Entity, Timestamp};

/// Returns `true` if the user currently holds admin privilege.
///
/// Unknown users are never admins.
pub fn is_admin<ID>(y: &MembershipState<ID>, user: &ID) -> bool
where
    ID: IdentityHandle,
{
    y.admin_flag(user).is_some_and(|flag| flag.is_admin)
}

/// All users currently holding admin privilege.
pub fn admins<ID>(y: &MembershipState<ID>) -> BTreeSet<ID>
where
    ID: IdentityHandle,
{
    y.admin_flags()
        .filter_map(|(user, flag)| if flag.is_admin { Some(*user) } else { None })
        .collect()
}

/// Grants or revokes admin privilege.
///
/// Only admins may change flags. Revoking one's own privilege is allowed, even if it was the
/// last admin.
pub fn set_admin<ID, D>(
    y: MembershipState<ID>,
    directory: &D,
    caller: ID,
    user: ID,
    value: bool,
    now: Timestamp,
) -> Result<MembershipState<ID>, MembershipError<ID>>
where
    ID: IdentityHandle,
    D: Directory<ID>,
{
    if !is_admin(&y, &caller) {
        return Err(MembershipError::NotAuthorized(caller));
    }

    if !directory.user_exists(&user) {
        return Err(MembershipError::NotFound(Entity::User(user)));
    }

    let mut y = y;
    y.set_admin_flag(user, value, now);
    Ok(y)
}

/// Makes the first admin of a workspace.
///
/// This is the only way to change admin flags without already being an admin. It succeeds
/// exactly once in the lifetime of a state, later calls fail with `AlreadyBootstrapped` even if
/// every admin revoked their privilege since.
pub fn bootstrap<ID, D>(
    y: MembershipState<ID>,
    directory: &D,
    user: ID,
    now: Timestamp,
) -> Result<MembershipState<ID>, MembershipError<ID>>
where
    ID: IdentityHandle,
    D: Directory<ID>,
{
    if y.is_bootstrapped() {
        return Err(MembershipError::AlreadyBootstrapped);
    }

    if !directory.user_exists(&user) {
        return Err(MembershipError::NotFound(Entity::User(user)));
    }

    let mut y = y;
    y.set_admin_flag(user, true, now);
    y.mark_bootstrapped();
    Ok(y)
}
