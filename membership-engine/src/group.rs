// SPDX-License-Identifier: MIT OR Apache-2.0

//! Creating, renaming and deleting groups.
//!
//! A group is a pure container: apart from its name it only consists of the membership edges
//! pointing into or out of it. Whoever has access to a group may change or delete it.
use crate::access::has_access;
use crate::config::Config;
use crate::error::MembershipError;
use crate::state::MembershipState;
use crate::traits::{Directory, IdentityHandle};
use crate::types::{Entity, GroupId, MembershipId, Object, Subject, Timestamp};

/// Creates a new group with the caller as its first direct member.
///
/// Any known user may create groups. The creator's membership is what gives them access to the
/// group afterwards.
pub fn create_group<ID, D>(
    y: MembershipState<ID>,
    directory: &D,
    config: &Config,
    caller: ID,
    name: &str,
    now: Timestamp,
) -> Result<(MembershipState<ID>, GroupId), MembershipError<ID>>
where
    ID: IdentityHandle,
    D: Directory<ID>,
{
    let name = validate_name::<ID>(config, name)?;

    if !directory.user_exists(&caller) {
        return Err(MembershipError::NotFound(Entity::User(caller)));
    }

    let mut y = y;
    let group = y.insert_group(name, now);
    y.insert_membership(Subject::User(caller), Object::Group(group), now);

    Ok((y, group))
}

/// Renames a group the caller has access to.
pub fn rename<ID>(
    y: MembershipState<ID>,
    config: &Config,
    caller: ID,
    group: GroupId,
    name: &str,
) -> Result<MembershipState<ID>, MembershipError<ID>>
where
    ID: IdentityHandle,
{
    if !y.has_group(group) {
        return Err(MembershipError::NotFound(Entity::Group(group)));
    }

    if !has_access(&y, &caller, &Object::Group(group)) {
        return Err(MembershipError::NotAuthorized(caller));
    }

    let name = validate_name::<ID>(config, name)?;

    let mut y = y;
    y.rename_group(group, name);
    Ok(y)
}

/// Deletes a group the caller has access to.
///
/// Every membership naming the group, as member or as container, is removed together with it.
/// Memberships of its former members in other groups are left untouched. Returns the ids of the
/// removed memberships.
pub fn delete_group<ID>(
    y: MembershipState<ID>,
    caller: ID,
    group: GroupId,
) -> Result<(MembershipState<ID>, Vec<MembershipId>), MembershipError<ID>>
where
    ID: IdentityHandle,
{
    if !y.has_group(group) {
        return Err(MembershipError::NotFound(Entity::Group(group)));
    }

    if !has_access(&y, &caller, &Object::Group(group)) {
        return Err(MembershipError::NotAuthorized(caller));
    }

    let mut removed: Vec<MembershipId> = y
        .outgoing(&Subject::Group(group))
        .chain(y.incoming(&Object::Group(group)))
        .map(|membership| membership.id)
        .collect();
    removed.sort();

    let mut y = y;
    for id in &removed {
        y.remove_membership(*id);
    }
    y.remove_group(group);

    Ok((y, removed))
}

/// Returns the trimmed name if it is acceptable as a group name.
fn validate_name<ID>(config: &Config, name: &str) -> Result<String, MembershipError<ID>> {
    let name = name.trim();

    if name.is_empty() {
        return Err(MembershipError::InvalidName("name is empty".to_string()));
    }

    if name.chars().count() > config.max_group_name_len {
        return Err(MembershipError::InvalidName(format!(
            "name is longer than {} characters",
            config.max_group_name_len
        )));
    }

    if name.chars().any(char::is_control) {
        return Err(MembershipError::InvalidName(
            "name contains control characters".to_string(),
        ));
    }

    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use crate::access::has_access;
    use crate::admin::bootstrap;
    use crate::config::Config;
    use crate::error::MembershipError;
    use crate::state::MembershipState;
    use crate::test_utils::TestDirectory;
    use crate::types::{Entity, GroupId, Object, Subject};

    use super::{create_group, delete_group, rename};

    #[test]
    fn creator_becomes_member() {
        let directory = TestDirectory::new().users(['A']);
        let config = Config::default();

        let (y, group) =
            create_group(MembershipState::new(), &directory, &config, 'A', " Crew ", 7).unwrap();

        let record = y.group(group).unwrap();
        assert_eq!(record.name, "Crew");
        assert_eq!(record.created_at, 7);

        let members: Vec<_> = y.incoming(&Object::Group(group)).collect();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].subject, Subject::User('A'));
        assert!(has_access(&y, &'A', &Object::Group(group)));
    }

    #[test]
    fn malformed_input() {
        let directory = TestDirectory::new().users(['A']);
        let config = Config {
            max_group_name_len: 4,
            ..Config::default()
        };
        let y = MembershipState::new();

        for name in ["", "   ", "toolong", "a\nb"] {
            assert_matches!(
                create_group(y.clone(), &directory, &config, 'A', name, 1),
                Err(MembershipError::InvalidName(_))
            );
        }

        // Multi-byte characters count as one.
        assert!(create_group(y.clone(), &directory, &config, 'A', "ñøøß", 1).is_ok());

        assert_eq!(
            create_group(y, &directory, &config, 'Z', "crew", 1).unwrap_err(),
            MembershipError::NotFound(Entity::User('Z'))
        );
    }

    #[test]
    fn rename_requires_access() {
        let directory = TestDirectory::new().users(['A', 'B', 'C']);
        let config = Config::default();
        let y = bootstrap(MembershipState::new(), &directory, 'C', 0).unwrap();
        let (y, group) = create_group(y, &directory, &config, 'A', "crew", 1).unwrap();

        // Bob renames the group...
        let result = rename(y.clone(), &config, 'B', group, "bob's");

        // ...but he has no access to it.
        assert_eq!(result.unwrap_err(), MembershipError::NotAuthorized('B'));

        // Alice renames the group.
        let y = rename(y, &config, 'A', group, "alice's").unwrap();
        assert_eq!(y.group(group).unwrap().name, "alice's");

        // Charlie is an admin and may rename any group.
        let y = rename(y, &config, 'C', group, "charlie's").unwrap();
        assert_eq!(y.group(group).unwrap().name, "charlie's");

        // Unknown groups are reported before checking access.
        assert_eq!(
            rename(y, &config, 'B', GroupId(99), "x").unwrap_err(),
            MembershipError::NotFound(Entity::Group(GroupId(99)))
        );
    }

    #[test]
    fn delete_cascades_to_own_edges_only() {
        let directory = TestDirectory::new().users(['A', 'B']);
        let config = Config::default();
        let y = MembershipState::new();

        let (y, crew) = create_group(y, &directory, &config, 'A', "crew", 1).unwrap();
        let (mut y, ship) = create_group(y, &directory, &config, 'A', "ship", 1).unwrap();
        let fleet = y.insert_group("fleet".to_string(), 1);

        // Bob ∈ crew ∈ ship ∈ fleet, Bob ∈ ship, crew has access to resource P.
        y.insert_membership(Subject::User('B'), Object::Group(crew), 2);
        y.insert_membership(Subject::Group(crew), Object::Group(ship), 2);
        y.insert_membership(Subject::Group(ship), Object::Group(fleet), 2);
        let bob_ship = y.insert_membership(Subject::User('B'), Object::Group(ship), 2);
        y.insert_membership(Subject::Group(crew), Object::Resource('P'), 2);

        let (y, removed) = delete_group(y, 'A', crew).unwrap();

        // Alice's and Bob's memberships in crew, crew ∈ ship and crew → P.
        assert_eq!(removed.len(), 4);
        assert!(y.group(crew).is_none());
        assert!(y.memberships().all(|membership| !membership.names_group(crew)));

        // Bob is still a member of ship and through it of fleet.
        assert!(y.membership(bob_ship).is_some());
        assert!(has_access(&y, &'B', &Object::Group(fleet)));
        assert!(!has_access(&y, &'B', &Object::Resource('P')));
    }

    #[test]
    fn delete_requires_access() {
        let directory = TestDirectory::new().users(['A', 'B']);
        let config = Config::default();
        let (y, group) =
            create_group(MembershipState::new(), &directory, &config, 'A', "crew", 1).unwrap();

        let result = delete_group(y.clone(), 'B', group);
        assert_eq!(result.unwrap_err(), MembershipError::NotAuthorized('B'));

        let (y, _) = delete_group(y, 'A', group).unwrap();
        assert_eq!(y.group_count(), 0);
        assert_eq!(y.membership_count(), 0);

        // Deleting twice fails.
        assert_eq!(
            delete_group(y, 'A', group).unwrap_err(),
            MembershipError::NotFound(Entity::Group(group))
        );
    }
}
