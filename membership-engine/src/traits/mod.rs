// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interfaces the host application implements to plug the engine into its own world.
mod directory;
mod identity;
mod store;

pub use directory::Directory;
pub use identity::IdentityHandle;
pub use store::GraphStore;
