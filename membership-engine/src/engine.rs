// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thread-safe entry point tying the membership graph to the host's directory and store.
//!
//! Readers work on the last committed snapshot: they only hold a lock long enough to clone an
//! `Arc` and then traverse an immutable state, so they never wait for a running write.
//!
//! Writers are serialized. Every write transaction clones the committed state, runs all checks
//! and changes against that private copy, persists the result through the `GraphStore` and only
//! then publishes it. A transaction failing at any point leaves the published snapshot and the
//! store untouched, so two concurrent inserts can never both pass the cycle guard against the
//! same stale state.
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::MembershipError;
use crate::state::MembershipState;
use crate::traits::{Directory, GraphStore, IdentityHandle};
use crate::types::{Group, GroupId, Membership, MembershipId, Object, Subject, Timestamp};
use crate::{access, admin, group, membership};

#[derive(Debug, Error)]
pub enum EngineError<ID, E> {
    #[error(transparent)]
    Membership(#[from] MembershipError<ID>),

    #[error("store error: {0}")]
    Store(E),
}

/// Membership and access control engine.
///
/// `ID` identifies users and resources, `D` answers whether they exist and `S` persists the
/// committed graph.
#[derive(Debug)]
pub struct Engine<ID, D, S> {
    directory: D,
    store: S,
    config: Config,
    committed: RwLock<Arc<MembershipState<ID>>>,
    writer: Mutex<()>,
}

impl<ID, D, S> Engine<ID, D, S>
where
    ID: IdentityHandle,
    D: Directory<ID>,
    S: GraphStore<ID>,
{
    /// Opens the engine on top of the last state committed to the store.
    ///
    /// An empty store yields an empty graph. Persisted tables which break the graph's structural
    /// invariants are refused with `InvariantViolation`.
    pub fn open(directory: D, store: S, config: Config) -> Result<Self, EngineError<ID, S::Error>> {
        let y = match store.load().map_err(EngineError::Store)? {
            Some(tables) => MembershipState::from_tables(tables)?,
            None => MembershipState::new(),
        };

        debug!(
            groups = y.group_count(),
            memberships = y.membership_count(),
            "opened membership graph"
        );

        Ok(Self {
            directory,
            store,
            config,
            committed: RwLock::new(Arc::new(y)),
            writer: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the last committed state.
    ///
    /// The snapshot stays consistent for as long as it is held, later commits do not change it.
    pub fn snapshot(&self) -> Arc<MembershipState<ID>> {
        let committed = self.committed.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&committed)
    }

    pub fn is_admin(&self, user: &ID) -> bool {
        admin::is_admin(&self.snapshot(), user)
    }

    pub fn admins(&self) -> BTreeSet<ID> {
        admin::admins(&self.snapshot())
    }

    pub fn has_access(&self, user: &ID, target: &Object<ID>) -> bool {
        access::has_access(&self.snapshot(), user, target)
    }

    pub fn user_groups(&self, user: &ID) -> HashSet<GroupId> {
        access::user_groups(&self.snapshot(), user)
    }

    pub fn accessible_resources<I>(&self, user: &ID, candidates: I) -> HashSet<ID>
    where
        I: IntoIterator<Item = ID>,
    {
        access::accessible_resources(&self.snapshot(), user, candidates)
    }

    pub fn members_with_access(&self, object: &Object<ID>) -> HashSet<ID> {
        access::members_with_access(&self.snapshot(), object)
    }

    pub fn list_members(&self, object: &Object<ID>) -> Vec<Membership<ID>> {
        membership::list_members(&self.snapshot(), object)
    }

    pub fn memberships_of(&self, subject: &Subject<ID>) -> Vec<Membership<ID>> {
        membership::memberships_of(&self.snapshot(), subject)
    }

    pub fn membership(&self, id: MembershipId) -> Option<Membership<ID>> {
        self.snapshot().membership(id).copied()
    }

    pub fn group(&self, id: GroupId) -> Option<Group> {
        self.snapshot().group(id).cloned()
    }

    pub fn groups(&self) -> Vec<Group> {
        self.snapshot().groups().cloned().collect()
    }

    /// Makes the first admin of the workspace, see `admin::bootstrap`.
    pub fn bootstrap(&self, user: ID) -> Result<(), EngineError<ID, S::Error>> {
        self.transact("bootstrap", |y, now| {
            Ok((admin::bootstrap(y, &self.directory, user, now)?, ()))
        })?;
        debug!(%user, "bootstrapped first admin");
        Ok(())
    }

    pub fn set_admin(
        &self,
        caller: ID,
        user: ID,
        value: bool,
    ) -> Result<(), EngineError<ID, S::Error>> {
        self.transact("set_admin", |y, now| {
            Ok((
                admin::set_admin(y, &self.directory, caller, user, value, now)?,
                (),
            ))
        })?;
        debug!(%caller, %user, value, "changed admin flag");
        Ok(())
    }

    pub fn create_group(
        &self,
        caller: ID,
        name: &str,
    ) -> Result<GroupId, EngineError<ID, S::Error>> {
        let group = self.transact("create_group", |y, now| {
            group::create_group(y, &self.directory, &self.config, caller, name, now)
        })?;
        debug!(%caller, %group, "created group");
        Ok(group)
    }

    pub fn rename(
        &self,
        caller: ID,
        group: GroupId,
        name: &str,
    ) -> Result<(), EngineError<ID, S::Error>> {
        self.transact("rename", |y, _| {
            Ok((group::rename(y, &self.config, caller, group, name)?, ()))
        })?;
        debug!(%caller, %group, "renamed group");
        Ok(())
    }

    pub fn delete_group(
        &self,
        caller: ID,
        group: GroupId,
    ) -> Result<(), EngineError<ID, S::Error>> {
        let removed = self.transact("delete_group", |y, _| group::delete_group(y, caller, group))?;
        debug!(%caller, %group, memberships = removed.len(), "deleted group");
        Ok(())
    }

    pub fn add_member(
        &self,
        caller: ID,
        subject: Subject<ID>,
        object: Object<ID>,
    ) -> Result<MembershipId, EngineError<ID, S::Error>> {
        let id = self.transact("add_member", |y, now| {
            membership::add_member(
                y,
                &self.directory,
                &self.config,
                caller,
                subject,
                object,
                now,
            )
        })?;
        debug!(%caller, %subject, %object, membership = %id, "added member");
        Ok(id)
    }

    pub fn remove_member(
        &self,
        caller: ID,
        id: MembershipId,
    ) -> Result<(), EngineError<ID, S::Error>> {
        let removed = self.transact("remove_member", |y, _| {
            membership::remove_member(y, caller, id)
        })?;
        debug!(
            %caller,
            subject = %removed.subject,
            object = %removed.object,
            membership = %id,
            "removed member"
        );
        Ok(())
    }

    /// Removes every edge pointing to a deleted resource, returning how many were removed.
    pub fn forget_resource(
        &self,
        caller: ID,
        resource: ID,
    ) -> Result<usize, EngineError<ID, S::Error>> {
        let removed = self.transact("forget_resource", |y, _| {
            membership::forget_resource(y, caller, resource)
        })?;
        debug!(%caller, %resource, memberships = removed.len(), "forgot resource");
        Ok(removed.len())
    }

    /// Removes every membership and the admin flag of a user, returning how many edges were
    /// removed.
    pub fn forget_user(
        &self,
        caller: ID,
        user: ID,
    ) -> Result<usize, EngineError<ID, S::Error>> {
        let removed = self.transact("forget_user", |y, _| {
            membership::forget_user(y, caller, user)
        })?;
        debug!(%caller, %user, memberships = removed.len(), "forgot user");
        Ok(removed.len())
    }

    /// Runs a state transition as one serializable write transaction.
    fn transact<T, F>(&self, operation: &'static str, f: F) -> Result<T, EngineError<ID, S::Error>>
    where
        F: FnOnce(
            MembershipState<ID>,
            Timestamp,
        ) -> Result<(MembershipState<ID>, T), MembershipError<ID>>,
    {
        // A panicking writer never published anything, the committed state is still intact.
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let y = MembershipState::clone(&self.snapshot());
        let (y, output) = f(y, current_timestamp())
            .inspect_err(|err| warn!(operation, %err, "transaction rejected"))?;

        if let Err(err) = self.store.commit(y.tables()) {
            warn!(operation, %err, "failed committing transaction");
            return Err(EngineError::Store(err));
        }

        let mut committed = self.committed.write().unwrap_or_else(PoisonError::into_inner);
        *committed = Arc::new(y);

        Ok(output)
    }
}

fn current_timestamp() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_micros() as Timestamp)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use crate::config::Config;
    use crate::error::MembershipError;
    use crate::memory_store::MemoryStore;
    use crate::test_utils::{FailingStore, TestDirectory, setup_logging};
    use crate::traits::GraphStore;
    use crate::types::{Object, Subject};

    use super::{Engine, EngineError};

    fn directory() -> TestDirectory {
        TestDirectory::new()
            .users(['A', 'B', 'C'])
            .resources(['P'])
    }

    #[test]
    fn reopen_from_store() {
        setup_logging();

        let store = MemoryStore::new();
        let engine = Engine::open(directory(), store.clone(), Config::default()).unwrap();
        engine.bootstrap('C').unwrap();
        let crew = engine.create_group('A', "crew").unwrap();
        // Only the admin may grant access to resource P.
        engine
            .add_member('C', Subject::Group(crew), Object::Resource('P'))
            .unwrap();
        drop(engine);

        let engine = Engine::open(directory(), store, Config::default()).unwrap();
        assert!(engine.is_admin(&'C'));
        assert!(engine.has_access(&'A', &Object::Resource('P')));
        assert_eq!(engine.group(crew).unwrap().name, "crew");

        // Ids continue where the previous session stopped.
        let ship = engine.create_group('A', "ship").unwrap();
        assert!(ship > crew);
    }

    #[test]
    fn rejected_transactions_do_not_commit() {
        let store = MemoryStore::new();
        let engine = Engine::open(directory(), store.clone(), Config::default()).unwrap();
        let crew = engine.create_group('A', "crew").unwrap();
        let committed = store.load().unwrap();

        let result = engine.add_member('B', Subject::User('B'), Object::Group(crew));
        assert_matches!(
            result,
            Err(EngineError::Membership(MembershipError::NotAuthorized('B')))
        );

        assert_eq!(store.load().unwrap(), committed);
        assert_eq!(engine.snapshot().tables(), committed.as_ref().unwrap());
    }

    #[test]
    fn failed_commits_are_not_published() {
        let store = FailingStore::new();
        let engine = Engine::open(directory(), store.clone(), Config::default()).unwrap();
        let crew = engine.create_group('A', "crew").unwrap();
        let before = engine.snapshot();

        store.fail_commits(true);
        let result = engine.add_member('A', Subject::User('B'), Object::Group(crew));
        assert_matches!(result, Err(EngineError::Store(_)));

        // Neither the snapshot nor the store saw the edge.
        assert!(!engine.has_access(&'B', &Object::Group(crew)));
        assert_eq!(engine.snapshot().tables(), before.tables());
        assert_eq!(store.load().unwrap().as_ref(), Some(before.tables()));

        store.fail_commits(false);
        engine
            .add_member('A', Subject::User('B'), Object::Group(crew))
            .unwrap();
        assert!(engine.has_access(&'B', &Object::Group(crew)));
    }

    #[test]
    fn low_traversal_limit() {
        let config = Config {
            traversal_limit: Some(0),
            ..Config::default()
        };
        let engine = Engine::open(directory(), MemoryStore::new(), config).unwrap();
        let crew = engine.create_group('A', "crew").unwrap();
        let ship = engine.create_group('A', "ship").unwrap();
        let fleet = engine.create_group('A', "fleet").unwrap();

        // Healthy graphs are never rejected because of the configured limit.
        engine
            .add_member('A', Subject::Group(crew), Object::Group(ship))
            .unwrap();
        engine
            .add_member('A', Subject::Group(ship), Object::Group(fleet))
            .unwrap();
        assert_matches!(
            engine.add_member('A', Subject::Group(fleet), Object::Group(crew)),
            Err(EngineError::Membership(MembershipError::Cycle { .. }))
        );
    }

    #[test]
    fn snapshots_are_stable() {
        let engine = Engine::open(directory(), MemoryStore::new(), Config::default()).unwrap();
        let crew = engine.create_group('A', "crew").unwrap();

        let snapshot = engine.snapshot();
        engine.delete_group('A', crew).unwrap();

        // The old snapshot still describes the graph as it was when it was taken.
        assert!(snapshot.group(crew).is_some());
        assert!(engine.group(crew).is_none());
    }

    #[test]
    fn refuses_corrupted_store() {
        let store = MemoryStore::new();
        let engine = Engine::open(directory(), store.clone(), Config::default()).unwrap();
        let crew = engine.create_group('A', "crew").unwrap();
        let mut tables = engine.snapshot().tables().clone();
        drop(engine);

        // Drop the group record but keep the creator's membership.
        tables.groups.remove(&crew);
        store.commit(&tables).unwrap();

        assert_matches!(
            Engine::open(directory(), store, Config::default()),
            Err(EngineError::Membership(MembershipError::InvariantViolation(_)))
        );
    }
}
