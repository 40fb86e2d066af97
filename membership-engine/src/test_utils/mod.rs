// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directory and store implementations for tests, using `char` as user and resource id.
mod directory;
mod store;

pub use directory::TestDirectory;
pub use store::{CommitRefused, FailingStore};

use crate::traits::IdentityHandle;

impl IdentityHandle for char {}

pub fn setup_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}
