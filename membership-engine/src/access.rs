// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reachability queries deciding whether a user may act on a group or resource.
//!
//! A user has access to an object if there is a path of membership edges leading from the user
//! to it, for example `user ∈ team ∈ department ∈ project`. Admins have access to everything.
//!
//! All queries are read-only and never fail: an unknown user or object simply yields "no
//! access". Traversals are iterative and visit every group at most once, so their cost is bounded
//! by the size of the graph.
use std::collections::{HashSet, VecDeque};

use tracing::trace;

use crate::admin::is_admin;
use crate::state::MembershipState;
use crate::traits::IdentityHandle;
use crate::types::{GroupId, Object, Subject};

/// Returns `true` if the user may access the target.
pub fn has_access<ID>(y: &MembershipState<ID>, user: &ID, target: &Object<ID>) -> bool
where
    ID: IdentityHandle,
{
    if is_admin(y, user) {
        return true;
    }

    let mut visited: HashSet<GroupId> = HashSet::new();
    let mut frontier = VecDeque::from([Subject::User(*user)]);

    while let Some(subject) = frontier.pop_front() {
        if y.edge(&subject, target).is_some() {
            trace!(%user, %target, via = %subject, "access granted");
            return true;
        }

        for group in y.parent_groups(&subject) {
            if visited.insert(group) {
                frontier.push_back(Subject::Group(group));
            }
        }
    }

    false
}

/// All groups the user is a direct or transitive member of.
///
/// The closure is computed from the given state on every call, admins do not implicitly belong
/// to any group.
pub fn user_groups<ID>(y: &MembershipState<ID>, user: &ID) -> HashSet<GroupId>
where
    ID: IdentityHandle,
{
    let mut closure: HashSet<GroupId> = HashSet::new();
    let mut frontier: VecDeque<GroupId> = y.parent_groups(&Subject::User(*user)).collect();
    closure.extend(frontier.iter().copied());

    while let Some(group) = frontier.pop_front() {
        for parent in y.parent_groups(&Subject::Group(group)) {
            if closure.insert(parent) {
                frontier.push_back(parent);
            }
        }
    }

    closure
}

/// Filters the candidates down to the resources the user may access.
///
/// The group closure of the user is computed once and all resources reachable from it are
/// collected in one pass, instead of traversing the graph for every candidate.
pub fn accessible_resources<ID, I>(y: &MembershipState<ID>, user: &ID, candidates: I) -> HashSet<ID>
where
    ID: IdentityHandle,
    I: IntoIterator<Item = ID>,
{
    if is_admin(y, user) {
        return candidates.into_iter().collect();
    }

    let subjects = std::iter::once(Subject::User(*user))
        .chain(user_groups(y, user).into_iter().map(Subject::Group));

    let mut reachable: HashSet<ID> = HashSet::new();
    for subject in subjects {
        reachable.extend(y.outgoing(&subject).filter_map(|membership| {
            match membership.object {
                Object::Resource(resource) => Some(resource),
                Object::Group(_) => None,
            }
        }));
    }

    candidates
        .into_iter()
        .filter(|candidate| reachable.contains(candidate))
        .collect()
}

/// All users with a membership path to the object.
///
/// Admins are only included if they have such a path, their implicit access is not reflected
/// here.
pub fn members_with_access<ID>(y: &MembershipState<ID>, object: &Object<ID>) -> HashSet<ID>
where
    ID: IdentityHandle,
{
    let mut users: HashSet<ID> = HashSet::new();
    let mut visited: HashSet<GroupId> = HashSet::new();
    let mut frontier = VecDeque::from([*object]);

    while let Some(object) = frontier.pop_front() {
        for membership in y.incoming(&object) {
            match membership.subject {
                Subject::User(user) => {
                    users.insert(user);
                }
                Subject::Group(group) => {
                    if visited.insert(group) {
                        frontier.push_back(Object::Group(group));
                    }
                }
            }
        }
    }

    users
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::state::MembershipState;
    use crate::types::{GroupId, MembershipId, Object, Subject};

    use super::{accessible_resources, has_access, members_with_access, user_groups};

    struct Fixture {
        y: MembershipState<char>,
        a: GroupId,
        b: GroupId,
        c: GroupId,
        user_edge: MembershipId,
    }

    /// U ∈ A ∈ B ∈ C, C has access to resource P, B has access to resource Q.
    fn fixture() -> Fixture {
        let mut y = MembershipState::new();
        let a = y.insert_group("A".to_string(), 0);
        let b = y.insert_group("B".to_string(), 0);
        let c = y.insert_group("C".to_string(), 0);
        y.insert_membership(Subject::Group(a), Object::Group(b), 0);
        y.insert_membership(Subject::Group(b), Object::Group(c), 0);
        y.insert_membership(Subject::Group(c), Object::Resource('P'), 0);
        y.insert_membership(Subject::Group(b), Object::Resource('Q'), 0);
        let user_edge = y.insert_membership(Subject::User('U'), Object::Group(a), 0);

        Fixture {
            y,
            a,
            b,
            c,
            user_edge,
        }
    }

    #[test]
    fn transitive_access() {
        let Fixture { y, a, b, c, .. } = fixture();

        assert!(has_access(&y, &'U', &Object::Group(a)));
        assert!(has_access(&y, &'U', &Object::Group(b)));
        assert!(has_access(&y, &'U', &Object::Group(c)));
        assert!(has_access(&y, &'U', &Object::Resource('P')));
        assert!(has_access(&y, &'U', &Object::Resource('Q')));

        // Access only flows upwards.
        let mut y = y;
        let d = y.insert_group("D".to_string(), 0);
        y.insert_membership(Subject::Group(d), Object::Group(a), 0);
        y.insert_membership(Subject::User('V'), Object::Group(c), 0);
        assert!(!has_access(&y, &'V', &Object::Group(a)));
        assert!(!has_access(&y, &'U', &Object::Group(d)));
        assert!(!has_access(&y, &'V', &Object::Resource('Q')));
        assert!(has_access(&y, &'V', &Object::Resource('P')));
    }

    #[test]
    fn unknown_users_have_no_access() {
        let Fixture { y, a, .. } = fixture();

        assert!(!has_access(&y, &'Z', &Object::Group(a)));
        assert!(!has_access(&y, &'Z', &Object::Resource('P')));
        assert!(user_groups(&y, &'Z').is_empty());
        assert!(accessible_resources(&y, &'Z', ['P', 'Q']).is_empty());
    }

    #[test]
    fn removing_the_only_path_revokes_access() {
        let Fixture {
            mut y,
            c,
            user_edge,
            ..
        } = fixture();

        y.remove_membership(user_edge);
        assert!(!has_access(&y, &'U', &Object::Group(c)));
        assert!(!has_access(&y, &'U', &Object::Resource('P')));
    }

    #[test]
    fn closure() {
        let Fixture { y, a, b, c, .. } = fixture();

        assert_eq!(user_groups(&y, &'U'), HashSet::from([a, b, c]));
    }

    #[test]
    fn filter_resources() {
        let Fixture { mut y, a, .. } = fixture();

        // A direct grant to a resource works as well.
        y.insert_membership(Subject::User('V'), Object::Resource('R'), 0);
        y.insert_membership(Subject::User('V'), Object::Group(a), 0);

        assert_eq!(
            accessible_resources(&y, &'U', ['P', 'Q', 'R', 'S']),
            HashSet::from(['P', 'Q'])
        );
        assert_eq!(
            accessible_resources(&y, &'V', ['P', 'Q', 'R', 'S']),
            HashSet::from(['P', 'Q', 'R'])
        );
    }

    #[test]
    fn reverse_closure() {
        let Fixture { mut y, b, .. } = fixture();

        y.insert_membership(Subject::User('V'), Object::Group(b), 0);
        y.insert_membership(Subject::User('W'), Object::Resource('P'), 0);

        assert_eq!(
            members_with_access(&y, &Object::Resource('P')),
            HashSet::from(['U', 'V', 'W'])
        );
        assert_eq!(
            members_with_access(&y, &Object::Resource('Q')),
            HashSet::from(['U', 'V'])
        );
        assert!(members_with_access(&y, &Object::Resource('Z')).is_empty());
    }
}
