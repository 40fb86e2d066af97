// SPDX-License-Identifier: MIT OR Apache-2.0

use std::error::Error;

use crate::state::GraphTables;

/// Persistence layer for the three logical tables of the membership graph.
///
/// The engine computes every write transaction against a private copy of the last committed
/// state and hands the complete result to `commit`. Implementations must persist it atomically:
/// after a failed commit the previously committed tables must still be the ones `load` returns.
pub trait GraphStore<ID> {
    type Error: Error;

    /// Returns the last committed tables or `None` if nothing was committed yet.
    fn load(&self) -> Result<Option<GraphTables<ID>>, Self::Error>;

    /// Atomically replaces the committed tables.
    fn commit(&self, tables: &GraphTables<ID>) -> Result<(), Self::Error>;
}
