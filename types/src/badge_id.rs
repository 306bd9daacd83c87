//! Badge identifier type.
//!
//! Identifiers are assigned sequentially starting at 1 and are never reused,
//! including across restarts; the persistent backends derive the next id
//! from the highest id on disk.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique, monotonically assigned badge identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BadgeId(u64);

impl BadgeId {
    /// The "no badges yet" sentinel. Never assigned to a badge; the first
    /// assigned id is `BadgeId::ZERO.next()`.
    pub const ZERO: Self = Self(0);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The successor id. Saturates at `u64::MAX` so a wrapped counter can
    /// never alias an existing id.
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Whether this is the unassigned sentinel.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BadgeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
