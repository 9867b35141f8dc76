//! Bot core: lifecycle coordination between the guild store and the cache.
//!
//! The gateway adapter translates transport events into the four entry
//! points below. Their required ordering for one connection session is
//! starting, then started, then any number of guild-visibility calls, then
//! stopped.

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cache::GuildCache;
use crate::database::{DEFAULT_PREFIX, Database, GuildConfig, StoreError};

/// Coordinates the guild store and the guild cache across the transport
/// connection lifecycle, and serves prefix lookups to the command layer.
pub struct AstraBot {
    database_url: String,

    /// Open store handle. None before the starting transition and after the
    /// stopped transition.
    db: RwLock<Option<Database>>,

    /// One configuration entry per observed guild.
    guilds: GuildCache,

    /// Serializes the miss path of guild-visibility handling so two events
    /// for the same guild cannot both decide "absent" and both insert a
    /// default row. Coarse by design notes: visibility events are rare
    /// relative to message traffic.
    visibility_gate: Mutex<()>,
}

impl AstraBot {
    /// Create a bot instance with an empty cache and a closed store.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            db: RwLock::new(None),
            guilds: GuildCache::new(),
            visibility_gate: Mutex::new(()),
        }
    }

    /// Clone out the store handle. The guard is dropped before any await;
    /// pool handles are cheap `Arc` clones.
    fn db(&self) -> Result<Database, StoreError> {
        self.db.read().clone().ok_or(StoreError::Closed)
    }

    /// Starting transition: open the guild store.
    ///
    /// Runs before the transport connects. A failure here is fatal; there
    /// is no bot without storage.
    pub async fn on_starting(&self) -> Result<(), StoreError> {
        let db = Database::connect(&self.database_url).await?;
        *self.db.write() = Some(db);
        Ok(())
    }

    /// Started transition: bootstrap the cache from the store.
    ///
    /// Loads every stored row and unconditionally installs it in the cache.
    /// A row that fails entity mapping aborts startup; a partially loaded
    /// cache is worse than a crashed bootstrap.
    pub async fn on_started(&self) -> Result<(), StoreError> {
        let db = self.db()?;
        let rows = db.guild_rows().await?;

        for row in &rows {
            let guild = GuildConfig::from_row(row)?;
            self.guilds.insert(guild.guild_id, guild);
        }

        info!(guilds = rows.len(), "guild cache bootstrapped");
        Ok(())
    }

    /// Stopped transition: close the store and drop the cache contents.
    ///
    /// Always safe to call, even if startup failed partway; closing an
    /// already-closed store is a no-op. The cache is cleared so a reconnect
    /// never trusts entries from a previous session.
    pub async fn on_stopped(&self) {
        let db = self.db.write().take();
        if let Some(db) = db {
            db.close().await;
        }
        self.guilds.clear();
    }

    /// Guild-visibility handling: idempotent upsert-on-miss.
    ///
    /// Fired for every guild during the post-connect backfill burst and
    /// again whenever the bot joins a new guild; both cases behave the
    /// same. A cached guild is a no-op. An unseen guild gets a default row
    /// persisted first and cached second, so a failed write leaves no cache
    /// entry behind and the guild keeps resolving to the fallback prefix.
    ///
    /// # Errors
    /// [`StoreError::Write`] if the default insert fails. The error is
    /// scoped to this guild; callers log it and keep serving others.
    pub async fn on_guild_available(&self, guild_id: u64) -> Result<(), StoreError> {
        if self.guilds.contains(guild_id) {
            return Ok(());
        }

        let _gate = self.visibility_gate.lock().await;

        // Re-check under the gate: a concurrent event for the same guild
        // may have inserted while we waited.
        if self.guilds.contains(guild_id) {
            return Ok(());
        }

        let db = self.db()?;
        let guild = GuildConfig::default_with_insert(&db, guild_id).await?;

        debug!(guild_id, "created default guild configuration");
        self.guilds.insert(guild_id, guild);
        Ok(())
    }

    /// Resolve the accepted invocation prefixes for a guild.
    ///
    /// Hot path, invoked once per inbound message candidate: a single cache
    /// read, no store access, no failure mode. A guild the coordinator has
    /// not processed yet resolves to the fixed fallback prefix.
    pub fn resolve_prefix(&self, guild_id: u64) -> Vec<String> {
        match self.guilds.prefix_of(guild_id) {
            Some(prefix) => vec![prefix],
            None => vec![DEFAULT_PREFIX.to_string()],
        }
    }

    /// Change a guild's command prefix, store first, cache second.
    ///
    /// A guild with no row yet (visibility not processed, or its default
    /// insert failed earlier) gets a fresh row carrying the requested
    /// prefix. Exposed for the prefix-management command module.
    #[allow(dead_code)]
    pub async fn set_prefix(&self, guild_id: u64, prefix: &str) -> Result<(), StoreError> {
        let _gate = self.visibility_gate.lock().await;
        let db = self.db()?;

        match self.guilds.get(guild_id) {
            Some(mut guild) => {
                db.update_prefix(guild_id, prefix).await?;
                guild.prefix = prefix.to_string();
                self.guilds.insert(guild_id, guild);
            }
            None => {
                let mut guild = GuildConfig::new(guild_id);
                guild.prefix = prefix.to_string();
                db.insert_guild(&guild).await?;
                self.guilds.insert(guild_id, guild);
            }
        }

        Ok(())
    }
}
