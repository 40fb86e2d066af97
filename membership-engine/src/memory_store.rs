// SPDX-License-Identifier: MIT OR Apache-2.0

//! Volatile `GraphStore` keeping the committed tables in memory.
use std::convert::Infallible;
use std::sync::{Arc, PoisonError, RwLock};

use crate::state::GraphTables;
use crate::traits::GraphStore;

/// In-memory store.
///
/// Clones share the same tables, so a clone handed to an engine can be used to inspect what it
/// committed or to open another engine on the same state.
#[derive(Debug, Clone)]
pub struct MemoryStore<ID> {
    inner: Arc<RwLock<Option<GraphTables<ID>>>>,
}

impl<ID> MemoryStore<ID> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }
}

impl<ID> Default for MemoryStore<ID> {
    fn default() -> Self {
        Self::new()
    }
}

impl<ID> GraphStore<ID> for MemoryStore<ID>
where
    ID: Clone,
{
    type Error = Infallible;

    fn load(&self) -> Result<Option<GraphTables<ID>>, Self::Error> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.clone())
    }

    fn commit(&self, tables: &GraphTables<ID>) -> Result<(), Self::Error> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *inner = Some(tables.clone());
        Ok(())
    }
}
