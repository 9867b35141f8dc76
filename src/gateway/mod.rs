//! Gateway adapter: translates Discord events into bot lifecycle calls.
//!
//! The gateway guarantees READY before the GUILD_CREATE backfill, and the
//! bot opens its store before the gateway connects at all, which gives the
//! coordinator the ordering it needs. Guild-available (backfill) and
//! guild-joined events both arrive as GUILD_CREATE and are handled
//! identically.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serenity::async_trait;
use serenity::gateway::ShardManager;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::guild::Guild;
use serenity::prelude::*;
use tracing::{debug, error, info};

use crate::bot::AstraBot;
use crate::config::Config;

struct ShardManagerKey;

impl TypeMapKey for ShardManagerKey {
    type Value = Arc<ShardManager>;
}

struct Handler {
    bot: Arc<AstraBot>,
    bootstrap_failed: Arc<AtomicBool>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, "gateway ready");

        if let Err(e) = self.bot.on_started().await {
            // A missing or partial cache is unacceptable; take the whole
            // bot down rather than serve with it.
            error!("guild cache bootstrap failed: {e}");
            self.bootstrap_failed.store(true, Ordering::SeqCst);

            let data = ctx.data.read().await;
            if let Some(manager) = data.get::<ShardManagerKey>() {
                manager.shutdown_all().await;
            }
        }
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, _is_new: Option<bool>) {
        if let Err(e) = self.bot.on_guild_available(guild.id.get()).await {
            // Scoped to this guild: it keeps resolving to the fallback
            // prefix until it becomes visible again.
            error!(guild_id = guild.id.get(), "guild setup failed: {e}");
        }
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        let Some(guild_id) = msg.guild_id else {
            return;
        };

        // Per-message prefix resolution for the command layer.
        let prefixes = self.bot.resolve_prefix(guild_id.get());
        if let Some(prefix) = prefixes.iter().find(|p| msg.content.starts_with(p.as_str())) {
            debug!(
                guild_id = guild_id.get(),
                prefix = %prefix,
                "recognized command invocation"
            );
        }
    }
}

/// Run one connection session: open the store, drive the gateway until it
/// exits (or ctrl-c), then close the store.
pub async fn run(bot: Arc<AstraBot>, config: &Config) -> anyhow::Result<()> {
    // Starting transition first; no bot without storage.
    bot.on_starting().await?;

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::MESSAGE_CONTENT;

    let bootstrap_failed = Arc::new(AtomicBool::new(false));
    let handler = Handler {
        bot: bot.clone(),
        bootstrap_failed: bootstrap_failed.clone(),
    };

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await?;

    client
        .data
        .write()
        .await
        .insert::<ShardManagerKey>(client.shard_manager.clone());

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            shard_manager.shutdown_all().await;
        }
    });

    let result = client.start().await;

    // Stopped transition always runs, even after a gateway error, so the
    // store is released exactly once.
    bot.on_stopped().await;

    result?;
    if bootstrap_failed.load(Ordering::SeqCst) {
        anyhow::bail!("guild cache bootstrap failed; see log for the cause");
    }
    Ok(())
}
