//! SQLite guild store wrapper.

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use tracing::info;

use super::error::StoreError;
use super::guild::GuildConfig;

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS guilds (
    guild_id       INTEGER PRIMARY KEY,
    prefix         TEXT    NOT NULL,
    star_emoji     TEXT    NOT NULL,
    star_threshold INTEGER NOT NULL
);";

/// Database wrapper for guild configuration rows.
///
/// Cloning is cheap; the underlying pool is shared. The pool is opened once
/// at the starting transition and closed once at the stopped transition,
/// both driven by the lifecycle coordinator.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the store and ensure the guild schema exists.
    ///
    /// # Errors
    /// Returns [`StoreError::Connection`] if the pool cannot be opened or
    /// the schema migration fails. Both are fatal at startup.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(StoreError::Connection)?
            .create_if_missing(true)
            // Avoid transient "database is locked" errors under concurrent
            // event handlers.
            .busy_timeout(Duration::from_secs(5));

        // SQLite permits limited write concurrency; a single connection
        // keeps the in-memory test databases consistent as well.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(StoreError::Connection)?;

        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(StoreError::Connection)?;

        info!("guild store opened");

        Ok(Self { pool })
    }

    /// Fetch every guild row. Rows are mapped into entities by the caller
    /// so that schema mismatches surface as [`StoreError::MalformedRow`].
    pub async fn guild_rows(&self) -> Result<Vec<SqliteRow>, StoreError> {
        sqlx::query("SELECT guild_id, prefix, star_emoji, star_threshold FROM guilds")
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::Query)
    }

    /// Insert a single guild row. Fails with [`StoreError::Write`] if the
    /// row is not durably written, including on a primary-key conflict.
    pub async fn insert_guild(&self, guild: &GuildConfig) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO guilds (guild_id, prefix, star_emoji, star_threshold) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(guild.guild_id as i64)
        .bind(&guild.prefix)
        .bind(&guild.star_emoji)
        .bind(guild.star_threshold)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Write)?;

        Ok(())
    }

    /// Update the command prefix for an existing guild row.
    pub async fn update_prefix(&self, guild_id: u64, prefix: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE guilds SET prefix = ? WHERE guild_id = ?")
            .bind(prefix)
            .bind(guild_id as i64)
            .execute(&self.pool)
            .await
            .map_err(StoreError::Write)?;

        Ok(())
    }

    /// Get a reference to the underlying pool.
    #[allow(dead_code)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the store. Idempotent; safe to call more than once.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("guild store closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> Database {
        Database::connect("sqlite::memory:")
            .await
            .expect("in-memory store")
    }

    #[tokio::test]
    async fn connect_creates_empty_schema() {
        let db = memory_store().await;
        assert!(db.guild_rows().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insert_then_fetch_roundtrips() {
        let db = memory_store().await;
        let mut guild = GuildConfig::new(7);
        guild.prefix = "!".to_string();
        db.insert_guild(&guild).await.unwrap();

        let rows = db.guild_rows().await.unwrap();
        assert_eq!(rows.len(), 1);
        let loaded = GuildConfig::from_row(&rows[0]).unwrap();
        assert_eq!(loaded, guild);
    }

    #[tokio::test]
    async fn duplicate_insert_is_a_write_error() {
        let db = memory_store().await;
        db.insert_guild(&GuildConfig::new(7)).await.unwrap();

        let err = db.insert_guild(&GuildConfig::new(7)).await.unwrap_err();
        assert!(matches!(err, StoreError::Write(_)));
    }

    #[tokio::test]
    async fn update_prefix_persists() {
        let db = memory_store().await;
        db.insert_guild(&GuildConfig::new(7)).await.unwrap();
        db.update_prefix(7, "?").await.unwrap();

        let rows = db.guild_rows().await.unwrap();
        let loaded = GuildConfig::from_row(&rows[0]).unwrap();
        assert_eq!(loaded.prefix, "?");
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let db = memory_store().await;
        db.close().await;
        db.close().await;
    }
}
