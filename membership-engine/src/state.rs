// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted tables of the membership graph and the lookup indexes derived from them.
use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::graphmap::DiGraphMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cycle::check_acyclic;
use crate::error::MembershipError;
use crate::traits::IdentityHandle;
use crate::types::{
    AdminFlag, Group, GroupId, Membership, MembershipId, Object, Subject, Timestamp,
    is_same_entity,
};

/// The three logical tables (groups, memberships and admin flags) plus the id counters.
///
/// This is everything a `GraphStore` needs to persist, all indexes are derived from it when the
/// state gets loaded.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "ID: Serialize",
        deserialize = "ID: Deserialize<'de> + Ord"
    ))
)]
pub struct GraphTables<ID> {
    pub(crate) groups: BTreeMap<GroupId, Group>,
    pub(crate) memberships: BTreeMap<MembershipId, Membership<ID>>,
    pub(crate) admins: BTreeMap<ID, AdminFlag>,
    pub(crate) bootstrapped: bool,
    pub(crate) next_group_id: u64,
    pub(crate) next_membership_id: u64,
}

impl<ID> GraphTables<ID> {
    pub fn new() -> Self {
        Self {
            groups: BTreeMap::new(),
            memberships: BTreeMap::new(),
            admins: BTreeMap::new(),
            bootstrapped: false,
            next_group_id: 0,
            next_membership_id: 0,
        }
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn memberships(&self) -> impl Iterator<Item = &Membership<ID>> {
        self.memberships.values()
    }

    pub fn admin_flags(&self) -> impl Iterator<Item = (&ID, &AdminFlag)> {
        self.admins.iter()
    }
}

impl<ID> Default for GraphTables<ID> {
    fn default() -> Self {
        Self::new()
    }
}

/// Complete, self-consistent view of the membership graph.
///
/// A state value is never shared while it is being changed: write transactions work on their own
/// copy and readers only ever see committed states.
#[derive(Clone, Debug)]
pub struct MembershipState<ID> {
    tables: GraphTables<ID>,

    /// Edges by their left side.
    outgoing: HashMap<Subject<ID>, BTreeSet<MembershipId>>,

    /// Edges by their right side.
    incoming: HashMap<Object<ID>, BTreeSet<MembershipId>>,

    /// Edges by both sides, at most one edge exists per pair.
    edges: HashMap<(Subject<ID>, Object<ID>), MembershipId>,

    /// Group-to-group edges only, pointing from the member to the containing group.
    containment: DiGraphMap<GroupId, MembershipId>,
}

impl<ID> MembershipState<ID>
where
    ID: IdentityHandle,
{
    pub fn new() -> Self {
        Self {
            tables: GraphTables::new(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
            edges: HashMap::new(),
            containment: DiGraphMap::new(),
        }
    }

    /// Rebuilds all indexes from persisted tables.
    ///
    /// Fails with `InvariantViolation` if the tables contain edges pointing to unknown groups,
    /// self-memberships, duplicate edges, id counters behind existing ids or a containment cycle.
    pub fn from_tables(tables: GraphTables<ID>) -> Result<Self, MembershipError<ID>> {
        let mut y = Self {
            tables: GraphTables {
                groups: tables.groups,
                memberships: BTreeMap::new(),
                admins: tables.admins,
                bootstrapped: tables.bootstrapped,
                next_group_id: tables.next_group_id,
                next_membership_id: tables.next_membership_id,
            },
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
            edges: HashMap::new(),
            containment: DiGraphMap::new(),
        };

        for (id, group) in &y.tables.groups {
            if *id != group.id || id.0 >= y.tables.next_group_id {
                return Err(MembershipError::InvariantViolation(format!(
                    "group record {id} is inconsistent"
                )));
            }
            y.containment.add_node(*id);
        }

        for (id, membership) in tables.memberships {
            if id != membership.id || id.0 >= y.tables.next_membership_id {
                return Err(MembershipError::InvariantViolation(format!(
                    "membership record {id} is inconsistent"
                )));
            }

            if is_same_entity(&membership.subject, &membership.object) {
                return Err(MembershipError::InvariantViolation(format!(
                    "{id} makes {} a member of itself",
                    membership.subject
                )));
            }

            for group in [membership.subject.as_group(), membership.object.as_group()]
                .into_iter()
                .flatten()
            {
                if !y.tables.groups.contains_key(&group) {
                    return Err(MembershipError::InvariantViolation(format!(
                        "{id} refers to unknown {group}"
                    )));
                }
            }

            if let Some(existing) = y.edge(&membership.subject, &membership.object) {
                return Err(MembershipError::InvariantViolation(format!(
                    "{id} duplicates {existing}"
                )));
            }

            y.index(&membership);
            y.tables.memberships.insert(id, membership);
        }

        check_acyclic(&y)?;

        Ok(y)
    }

    pub fn tables(&self) -> &GraphTables<ID> {
        &self.tables
    }

    pub fn into_tables(self) -> GraphTables<ID> {
        self.tables
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.tables.groups.get(&id)
    }

    pub fn has_group(&self, id: GroupId) -> bool {
        self.tables.groups.contains_key(&id)
    }

    /// All groups, ordered by id.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.tables.groups.values()
    }

    pub fn group_count(&self) -> usize {
        self.tables.groups.len()
    }

    pub fn membership(&self, id: MembershipId) -> Option<&Membership<ID>> {
        self.tables.memberships.get(&id)
    }

    /// All memberships, ordered by id.
    pub fn memberships(&self) -> impl Iterator<Item = &Membership<ID>> {
        self.tables.memberships.values()
    }

    pub fn membership_count(&self) -> usize {
        self.tables.memberships.len()
    }

    /// Id of the edge connecting exactly these two sides, if any.
    pub fn edge(&self, subject: &Subject<ID>, object: &Object<ID>) -> Option<MembershipId> {
        self.edges.get(&(*subject, *object)).copied()
    }

    /// Edges where the given subject is a direct member of something, ordered by id.
    pub fn outgoing(&self, subject: &Subject<ID>) -> impl Iterator<Item = &Membership<ID>> {
        self.outgoing
            .get(subject)
            .into_iter()
            .flatten()
            .filter_map(|id| self.tables.memberships.get(id))
    }

    /// Edges where something is a direct member of the given object, ordered by id.
    pub fn incoming(&self, object: &Object<ID>) -> impl Iterator<Item = &Membership<ID>> {
        self.incoming
            .get(object)
            .into_iter()
            .flatten()
            .filter_map(|id| self.tables.memberships.get(id))
    }

    /// Groups the given subject is a direct member of.
    pub fn parent_groups(&self, subject: &Subject<ID>) -> impl Iterator<Item = GroupId> {
        self.outgoing(subject)
            .filter_map(|membership| membership.object.as_group())
    }

    /// The group-to-group sub-graph, edges point from member to container.
    pub fn containment(&self) -> &DiGraphMap<GroupId, MembershipId> {
        &self.containment
    }

    pub fn admin_flag(&self, user: &ID) -> Option<&AdminFlag> {
        self.tables.admins.get(user)
    }

    pub fn admin_flags(&self) -> impl Iterator<Item = (&ID, &AdminFlag)> {
        self.tables.admins.iter()
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.tables.bootstrapped
    }

    pub(crate) fn insert_group(&mut self, name: String, now: Timestamp) -> GroupId {
        let id = GroupId(self.tables.next_group_id);
        self.tables.next_group_id += 1;
        self.tables.groups.insert(
            id,
            Group {
                id,
                name,
                created_at: now,
            },
        );
        self.containment.add_node(id);
        id
    }

    pub(crate) fn rename_group(&mut self, id: GroupId, name: String) -> bool {
        match self.tables.groups.get_mut(&id) {
            Some(group) => {
                group.name = name;
                true
            }
            None => false,
        }
    }

    /// Removes the group record, all edges naming it must have been removed before.
    pub(crate) fn remove_group(&mut self, id: GroupId) -> Option<Group> {
        let group = self.tables.groups.remove(&id)?;
        self.containment.remove_node(id);
        self.outgoing.remove(&Subject::Group(id));
        self.incoming.remove(&Object::Group(id));
        Some(group)
    }

    pub(crate) fn insert_membership(
        &mut self,
        subject: Subject<ID>,
        object: Object<ID>,
        now: Timestamp,
    ) -> MembershipId {
        let id = MembershipId(self.tables.next_membership_id);
        self.tables.next_membership_id += 1;
        let membership = Membership {
            id,
            created_at: now,
            subject,
            object,
        };
        self.index(&membership);
        self.tables.memberships.insert(id, membership);
        id
    }

    pub(crate) fn remove_membership(&mut self, id: MembershipId) -> Option<Membership<ID>> {
        let membership = self.tables.memberships.remove(&id)?;

        if let Some(ids) = self.outgoing.get_mut(&membership.subject) {
            ids.remove(&id);
            if ids.is_empty() {
                self.outgoing.remove(&membership.subject);
            }
        }

        if let Some(ids) = self.incoming.get_mut(&membership.object) {
            ids.remove(&id);
            if ids.is_empty() {
                self.incoming.remove(&membership.object);
            }
        }

        self.edges.remove(&(membership.subject, membership.object));

        if let (Some(member), Some(container)) =
            (membership.subject.as_group(), membership.object.as_group())
        {
            self.containment.remove_edge(member, container);
        }

        Some(membership)
    }

    pub(crate) fn set_admin_flag(&mut self, user: ID, is_admin: bool, now: Timestamp) {
        self.tables.admins.insert(
            user,
            AdminFlag {
                is_admin,
                updated_at: now,
            },
        );
    }

    pub(crate) fn remove_admin_flag(&mut self, user: &ID) -> Option<AdminFlag> {
        self.tables.admins.remove(user)
    }

    pub(crate) fn mark_bootstrapped(&mut self) {
        self.tables.bootstrapped = true;
    }

    fn index(&mut self, membership: &Membership<ID>) {
        self.outgoing
            .entry(membership.subject)
            .or_default()
            .insert(membership.id);
        self.incoming
            .entry(membership.object)
            .or_default()
            .insert(membership.id);
        self.edges
            .insert((membership.subject, membership.object), membership.id);

        if let (Some(member), Some(container)) =
            (membership.subject.as_group(), membership.object.as_group())
        {
            self.containment.add_edge(member, container, membership.id);
        }
    }
}

impl<ID> Default for MembershipState<ID>
where
    ID: IdentityHandle,
{
    fn default() -> Self {
        Self::new()
    }
}
