// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashSet;

use crate::traits::Directory;

/// Directory with a fixed set of users and resources.
#[derive(Clone, Debug, Default)]
pub struct TestDirectory {
    users: HashSet<char>,
    resources: HashSet<char>,
}

impl TestDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(mut self, users: impl IntoIterator<Item = char>) -> Self {
        self.users.extend(users);
        self
    }

    pub fn resources(mut self, resources: impl IntoIterator<Item = char>) -> Self {
        self.resources.extend(resources);
        self
    }
}

impl Directory<char> for TestDirectory {
    fn user_exists(&self, id: &char) -> bool {
        self.users.contains(id)
    }

    fn resource_exists(&self, id: &char) -> bool {
        self.resources.contains(id)
    }
}
