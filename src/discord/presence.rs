use async_trait::async_trait;
use poise::serenity_prelude::{self as serenity, ActivityData, GuildId, OnlineStatus};
use tracing::{debug, info};

use super::StatusSink;
use crate::Error;

/// Shows lines as the bot's "Watching" activity and, when a guild is
/// configured, as its nickname there.
pub struct DiscordPresence {
    ctx: serenity::Context,
    guild_id: Option<GuildId>,
    status: OnlineStatus,
}

impl DiscordPresence {
    pub fn new(ctx: serenity::Context, guild_id: Option<u64>, status: OnlineStatus) -> Self {
        Self {
            ctx,
            guild_id: guild_id.map(GuildId::new),
            status,
        }
    }
}

#[async_trait]
impl StatusSink for DiscordPresence {
    async fn set_status_line(&self, line: &str) -> Result<(), Error> {
        debug!(line, "Setting presence");
        self.ctx
            .set_presence(Some(ActivityData::watching(line)), self.status);
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn set_display_name(&self, name: &str) -> Result<(), Error> {
        let Some(guild_id) = self.guild_id else {
            return Ok(());
        };

        guild_id.edit_nickname(&self.ctx, Some(name)).await?;
        info!(guild_id = guild_id.get(), name, "Updated nickname");
        Ok(())
    }
}
