// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::{Debug, Display};
use std::hash::Hash as StdHash;

/// Opaque identifier of a user or resource, issued by the host application.
///
/// The engine never inspects the contents of an identity, it only compares, hashes and orders
/// them.
pub trait IdentityHandle: Copy + Debug + Display + Eq + StdHash + Ord {}
