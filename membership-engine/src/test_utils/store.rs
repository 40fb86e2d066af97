// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::memory_store::MemoryStore;
use crate::state::GraphTables;
use crate::traits::GraphStore;

#[derive(Debug, Error)]
#[error("commit refused")]
pub struct CommitRefused;

/// In-memory store which can be told to refuse commits.
#[derive(Clone, Debug, Default)]
pub struct FailingStore {
    inner: MemoryStore<char>,
    fail: Arc<AtomicBool>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_commits(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl GraphStore<char> for FailingStore {
    type Error = CommitRefused;

    fn load(&self) -> Result<Option<GraphTables<char>>, Self::Error> {
        self.inner.load().map_err(|err| match err {})
    }

    fn commit(&self, tables: &GraphTables<char>) -> Result<(), Self::Error> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CommitRefused);
        }

        self.inner.commit(tables).map_err(|err| match err {})
    }
}
