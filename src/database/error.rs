//! Error taxonomy for the guild store.

use thiserror::Error;

/// Errors produced by the guild store and the row/entity boundary.
///
/// `Connection`, `Query` and `MalformedRow` are startup-fatal: the bot must
/// not reach a serving state with a missing or partially loaded cache.
/// `Write` is local to a single guild and must never take the bot down.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be opened or migrated at startup.
    #[error("failed to open guild store: {0}")]
    Connection(#[source] sqlx::Error),

    /// The bootstrap full-table query failed.
    #[error("guild bootstrap query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// A stored row does not match the expected guild schema.
    #[error("malformed guild row, column `{column}`: {source}")]
    MalformedRow {
        column: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// An insert or update was not durably written. Covers the uniqueness
    /// constraint backstop when two writers race on the same guild_id.
    #[error("guild row write failed: {0}")]
    Write(#[source] sqlx::Error),

    /// An operation ran while the store handle is absent (before the
    /// starting transition or after the stopped transition).
    #[error("guild store is not open")]
    Closed,
}
