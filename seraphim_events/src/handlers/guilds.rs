use crate::{Data, Error};
use poise::serenity_prelude as serenity;

pub async fn guild_create(
    guild: &serenity::Guild,
    is_new: Option<bool>,
    data: &Data,
) -> Result<(), Error> {
    // existing guilds get their row lazily on first read.
    if is_new == Some(true) {
        tracing::info!("Joined {} ({}).", guild.name, guild.id);
        data.database.create_guild_config(guild.id).await?;
    }

    Ok(())
}

pub fn guild_delete(
    incomplete: &serenity::UnavailableGuild,
    full: Option<&serenity::Guild>,
    data: &Data,
) {
    // an outage, not a removal.
    if incomplete.unavailable {
        return;
    }

    match full {
        Some(guild) => tracing::info!("Left {} ({}).", guild.name, guild.id),
        None => tracing::info!("Left {}.", incomplete.id),
    }

    data.database.remove_guild_cache(incomplete.id);
}
