use crest_types::BadgeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid owner: address must be non-empty")]
    InvalidOwner,

    #[error("invalid clone quota")]
    InvalidQuota,

    #[error("badge not found: {0}")]
    NotFound(BadgeId),

    #[error("not authorized to act on badge {badge_id}")]
    Unauthorized { badge_id: BadgeId },

    #[error("clone quota exhausted for badge {badge_id} (quota {clone_quota})")]
    QuotaExceeded { badge_id: BadgeId, clone_quota: u64 },

    #[error("storage error: {0}")]
    Storage(#[from] crest_store::StoreError),
}
