//! Schema versioning for the badge database.
//!
//! The meta table carries a version stamp. Opening a database runs any
//! pending upgrade steps in sequence and re-stamps it; a database stamped by
//! a newer node is refused rather than reinterpreted.

use crest_store::MetaStore;

use crate::LmdbError;

/// Schema version this code reads and writes.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Brings a freshly opened database up to the current schema.
pub struct Migrator;

impl Migrator {
    /// Inspect the stored version and upgrade step by step.
    ///
    /// An unstamped database reads as version 0 and is initialized in full.
    pub fn run(meta_store: &impl MetaStore) -> Result<(), LmdbError> {
        let stored = meta_store.get_schema_version().unwrap_or(0);

        if stored == CURRENT_SCHEMA_VERSION {
            tracing::info!(version = stored, "badge database schema is current");
            return Ok(());
        }
        if stored > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::Heed(format!(
                "badge database has schema {stored}, this node supports up to \
                 {CURRENT_SCHEMA_VERSION}; refusing to open"
            )));
        }

        for from in stored..CURRENT_SCHEMA_VERSION {
            tracing::info!(from, to = from + 1, "upgrading badge database schema");
            upgrade_step(from)?;
        }
        meta_store
            .set_schema_version(CURRENT_SCHEMA_VERSION)
            .map_err(|e| LmdbError::Heed(e.to_string()))?;

        tracing::info!(version = CURRENT_SCHEMA_VERSION, "schema upgrade complete");
        Ok(())
    }
}

/// One upgrade step, from `from` to `from + 1`.
fn upgrade_step(from: u32) -> Result<(), LmdbError> {
    match from {
        // v1: badges keyed by big-endian id, meta table holds the stamp.
        // A blank database needs no data rewritten.
        0 => Ok(()),
        _ => Err(LmdbError::Heed(format!(
            "no upgrade step from schema {from}"
        ))),
    }
}
