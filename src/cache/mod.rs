//! In-memory guild configuration cache.
//!
//! One entry per observed guild, keyed by guild id. Membership only grows
//! while the bot is connected; the whole map is cleared at the stopped
//! transition so a reconnect never serves stale entries.

use dashmap::DashMap;

use crate::database::GuildConfig;

/// Concurrent map of guild id to configuration.
///
/// Owned by the bot instance rather than held as a global, so separate bot
/// instances (and tests) never share state. Reads never block on I/O and
/// never fail.
#[derive(Debug, Default)]
pub struct GuildCache {
    inner: DashMap<u64, GuildConfig>,
}

impl GuildCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a guild's configuration.
    pub fn get(&self, guild_id: u64) -> Option<GuildConfig> {
        self.inner.get(&guild_id).map(|entry| entry.value().clone())
    }

    /// Look up only a guild's command prefix.
    ///
    /// Serves the per-message hot path: clones the one string it needs
    /// inside the map guard instead of the whole configuration.
    pub fn prefix_of(&self, guild_id: u64) -> Option<String> {
        self.inner.get(&guild_id).map(|entry| entry.prefix.clone())
    }

    /// Insert a configuration, overwriting any prior value for the key.
    pub fn insert(&self, guild_id: u64, guild: GuildConfig) {
        self.inner.insert(guild_id, guild);
    }

    /// Whether the guild already has a cached configuration.
    pub fn contains(&self, guild_id: u64) -> bool {
        self.inner.contains_key(&guild_id)
    }

    /// Number of cached guilds.
    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the cache holds no entries.
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop every entry. Used only at the stopped transition.
    pub fn clear(&self) {
        self.inner.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_misses_on_empty_cache() {
        let cache = GuildCache::new();
        assert!(cache.get(1).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn insert_then_get_returns_the_entry() {
        let cache = GuildCache::new();
        cache.insert(7, GuildConfig::new(7));

        assert!(cache.contains(7));
        assert_eq!(cache.get(7).unwrap().guild_id, 7);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn prefix_of_reads_only_the_prefix() {
        let cache = GuildCache::new();
        assert!(cache.prefix_of(7).is_none());

        let mut guild = GuildConfig::new(7);
        guild.prefix = "!".to_string();
        cache.insert(7, guild);

        assert_eq!(cache.prefix_of(7).as_deref(), Some("!"));
    }

    #[test]
    fn insert_overwrites_prior_value() {
        let cache = GuildCache::new();
        cache.insert(7, GuildConfig::new(7));

        let mut updated = GuildConfig::new(7);
        updated.prefix = "!".to_string();
        cache.insert(7, updated);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(7).unwrap().prefix, "!");
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = GuildCache::new();
        cache.insert(7, GuildConfig::new(7));
        cache.insert(8, GuildConfig::new(8));
        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.get(7).is_none());
    }
}
