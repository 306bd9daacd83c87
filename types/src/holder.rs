//! Holder identity type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The identity of a badge holder.
///
/// Holders are opaque address-like strings supplied by the caller's identity
/// layer; the registry imposes no format beyond non-emptiness, which it
/// checks itself rather than here. Compared only for equality; there is no
/// cryptographic material behind a holder address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HolderAddress(String);

impl HolderAddress {
    /// Wrap a raw identity string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the raw identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identity is the empty string. An empty holder is never a
    /// valid owner.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for HolderAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for HolderAddress {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for HolderAddress {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
