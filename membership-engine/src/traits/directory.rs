// SPDX-License-Identifier: MIT OR Apache-2.0

/// Existence checks for entities the engine does not own.
///
/// Users are provisioned and resources are created by the surrounding application. Before a
/// membership naming one of them is inserted the engine asks the directory whether it (still)
/// exists.
pub trait Directory<ID> {
    /// Returns `true` if the user is known and not deleted.
    fn user_exists(&self, id: &ID) -> bool;

    /// Returns `true` if the resource is known and not deleted.
    fn resource_exists(&self, id: &ID) -> bool;
}

impl<ID, T> Directory<ID> for &T
where
    T: Directory<ID>,
{
    fn user_exists(&self, id: &ID) -> bool {
        (**self).user_exists(id)
    }

    fn resource_exists(&self, id: &ID) -> bool {
        (**self).resource_exists(id)
    }
}
