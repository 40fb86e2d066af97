// SPDX-License-Identifier: MIT OR Apache-2.0

/// The default maximum length of a group name in characters.
pub const DEFAULT_MAX_GROUP_NAME_LEN: usize = 128;

/// Configuration parameters for the membership engine.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum length of a group name in characters, counted after trimming surrounding
    /// whitespace.
    pub max_group_name_len: usize,

    /// Maximum number of containment edges the cycle guard may examine for one insert.
    ///
    /// The number of group-to-group edges in the graph is always allowed, values below it are
    /// raised to it. Only a corrupted graph can exceed the limit, the insert is then rejected with
    /// an invariant violation.
    pub traversal_limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_group_name_len: DEFAULT_MAX_GROUP_NAME_LEN,
            traversal_limit: None,
        }
    }
}
