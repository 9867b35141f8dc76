//! Per-guild configuration entity.

use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::error::StoreError;
use super::store::Database;

/// Prefix accepted for guilds with no stored configuration.
pub const DEFAULT_PREFIX: &str = "./";

/// Star emoji used until a guild configures its own.
pub const DEFAULT_STAR_EMOJI: &str = "\u{2B50}";

/// Reactions required before a message reaches the starboard.
pub const DEFAULT_STAR_THRESHOLD: u32 = 3;

/// Configuration for a single guild.
///
/// `guild_id` is immutable once set: it is the cache key and the store's
/// primary key. The remaining fields are owned by this record in both the
/// cache and the store, and the two must not diverge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildConfig {
    pub guild_id: u64,
    pub prefix: String,
    pub star_emoji: String,
    pub star_threshold: u32,
}

impl GuildConfig {
    /// Build a configuration with the hard-coded defaults.
    pub fn new(guild_id: u64) -> Self {
        Self {
            guild_id,
            prefix: DEFAULT_PREFIX.to_string(),
            star_emoji: DEFAULT_STAR_EMOJI.to_string(),
            star_threshold: DEFAULT_STAR_THRESHOLD,
        }
    }

    /// Map a stored row into an entity, field by field.
    ///
    /// # Errors
    /// Returns [`StoreError::MalformedRow`] naming the offending column if
    /// the row does not match the guild schema. Callers treat this as fatal
    /// during bootstrap; a partially loaded cache is worse than a failed
    /// startup.
    pub fn from_row(row: &SqliteRow) -> Result<Self, StoreError> {
        let guild_id: i64 = row
            .try_get("guild_id")
            .map_err(|source| StoreError::MalformedRow {
                column: "guild_id",
                source,
            })?;

        let prefix: String = row
            .try_get("prefix")
            .map_err(|source| StoreError::MalformedRow {
                column: "prefix",
                source,
            })?;

        let star_emoji: String =
            row.try_get("star_emoji")
                .map_err(|source| StoreError::MalformedRow {
                    column: "star_emoji",
                    source,
                })?;

        let star_threshold: u32 =
            row.try_get("star_threshold")
                .map_err(|source| StoreError::MalformedRow {
                    column: "star_threshold",
                    source,
                })?;

        Ok(Self {
            guild_id: guild_id as u64,
            prefix,
            star_emoji,
            star_threshold,
        })
    }

    /// Build a default configuration for `guild_id` and persist it.
    ///
    /// The entity is returned only after the insert succeeds, so a caller
    /// can never cache a configuration that was not durably written.
    pub async fn default_with_insert(db: &Database, guild_id: u64) -> Result<Self, StoreError> {
        let guild = Self::new(guild_id);
        db.insert_guild(&guild).await?;
        Ok(guild)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_hardcoded_defaults() {
        let guild = GuildConfig::new(42);
        assert_eq!(guild.guild_id, 42);
        assert_eq!(guild.prefix, DEFAULT_PREFIX);
        assert_eq!(guild.star_emoji, "⭐");
        assert_eq!(guild.star_threshold, DEFAULT_STAR_THRESHOLD);
    }

    #[tokio::test]
    async fn default_with_insert_persists_one_row() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let guild = GuildConfig::default_with_insert(&db, 42).await.unwrap();
        assert_eq!(guild, GuildConfig::new(42));

        let rows = db.guild_rows().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(GuildConfig::from_row(&rows[0]).unwrap(), guild);
    }

    #[tokio::test]
    async fn from_row_rejects_mismatched_column() {
        let db = Database::connect("sqlite::memory:").await.unwrap();

        // SQLite stores the mismatched TEXT despite the column's INTEGER
        // affinity (guild_id is a rowid alias and strictly enforced, so a
        // non-PK column is the only way such a row can exist). This is
        // exactly the malformed shape bootstrap must refuse.
        sqlx::query(
            "INSERT INTO guilds (guild_id, prefix, star_emoji, star_threshold) \
             VALUES (7, './', '⭐', 'not-a-number')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let rows = db.guild_rows().await.unwrap();
        let err = GuildConfig::from_row(&rows[0]).unwrap_err();
        assert!(matches!(
            err,
            StoreError::MalformedRow {
                column: "star_threshold",
                ..
            }
        ));
    }
}
