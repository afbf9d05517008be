use poise::serenity_prelude::{self as serenity, ChannelId, MessageId};
use seraphim_data::invalid;
use seraphim_starboard::{force_post, ForceOutcome};

use crate::{
    utils::converters::{parse_bool, parse_limit, valid_channel},
    Context, Error,
};

/// The base for messing around with the starboard. Check the subcommands for more info.
///
/// Requires Manage Server permissions or higher.
#[poise::command(
    prefix_command,
    aliases("sb"),
    subcommands("channel", "limit", "toggle", "blacklist"),
    required_permissions = "MANAGE_GUILD",
    guild_only,
    category = "Starboard"
)]
pub async fn starboard(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::help(ctx, Some("starboard"), Default::default()).await?;
    Ok(())
}

/// Gets the starboard channel (no argument) or sets it (with argument).
#[poise::command(prefix_command, required_permissions = "MANAGE_GUILD", guild_only)]
pub async fn channel(
    ctx: Context<'_>,
    #[description = "The channel starred messages get sent to"] channel: Option<
        serenity::GuildChannel,
    >,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Not in a guild.")?;
    let data = ctx.data();
    let mut config = data.database.get_guild_config(guild_id).await?;

    let Some(channel) = channel else {
        let mention = config
            .starboard_channel
            .map_or_else(|| String::from("None"), |c| format!("<#{c}>"));
        ctx.say(format!("Starboard channel: {mention}")).await?;
        return Ok(());
    };

    let channel = valid_channel(ctx, channel).await?;
    config.starboard_channel = Some(channel.id);
    data.database.update_guild_config(&config).await?;

    tracing::info!("Starboard channel for {guild_id} set to {}.", channel.id);
    ctx.say(format!("Set channel to <#{}>!", channel.id)).await?;

    Ok(())
}

/// Gets the amount of stars needed to get on the starboard (no argument) or sets it (with argument).
#[poise::command(prefix_command, required_permissions = "MANAGE_GUILD", guild_only)]
pub async fn limit(
    ctx: Context<'_>,
    #[description = "How many stars a message needs"] limit: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Not in a guild.")?;
    let data = ctx.data();
    let mut config = data.database.get_guild_config(guild_id).await?;

    let Some(limit) = limit else {
        let current = config
            .star_limit
            .map_or_else(|| String::from("None"), |l| l.to_string());
        ctx.say(format!("Star limit: {current}")).await?;
        return Ok(());
    };

    let limit = parse_limit(&limit)?;
    config.star_limit = Some(limit);
    data.database.update_guild_config(&config).await?;

    ctx.say(format!("Set limit to {limit}!")).await?;

    Ok(())
}

/// Shows whether the starboard is on (no argument) or turns it on or off (with argument).
///
/// To turn it on, both the star channel and the star limit must be set beforehand.
#[poise::command(prefix_command, required_permissions = "MANAGE_GUILD", guild_only)]
pub async fn toggle(
    ctx: Context<'_>,
    #[description = "Whether the starboard should be on"] toggle: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Not in a guild.")?;
    let data = ctx.data();
    let mut config = data.database.get_guild_config(guild_id).await?;

    let Some(toggle) = toggle else {
        ctx.say(format!("Star toggle: {}", config.star_toggle)).await?;
        return Ok(());
    };

    let toggle = parse_bool(&toggle)?;
    if toggle && !config.can_enable_starboard() {
        return Err(invalid(
            "Either you forgot to set the starboard channel or the star limit. Please try again.",
        ));
    }

    config.star_toggle = toggle;
    data.database.update_guild_config(&config).await?;

    tracing::info!("Starboard for {guild_id} toggled to {toggle}.");
    ctx.say(format!("Toggled starboard to {toggle} for this server!"))
        .await?;

    Ok(())
}

/// The base command for the star blacklist. See the subcommands for more info.
#[poise::command(
    prefix_command,
    aliases("bl"),
    subcommands("blacklist_list", "blacklist_add", "blacklist_remove"),
    required_permissions = "MANAGE_GUILD",
    check = "crate::utils::checks::starboard_enabled",
    guild_only
)]
pub async fn blacklist(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::help(ctx, Some("starboard blacklist"), Default::default()).await?;
    Ok(())
}

/// Only channels people post starrable messages in can be blacklisted.
fn can_blacklist(kind: serenity::ChannelType) -> bool {
    matches!(
        kind,
        serenity::ChannelType::Text
            | serenity::ChannelType::News
            | serenity::ChannelType::PublicThread
            | serenity::ChannelType::PrivateThread
            | serenity::ChannelType::NewsThread
    )
}

/// Only a 404 means the channel is gone, anything else might be temporary.
fn is_unknown_channel(error: &::serenity::Error) -> bool {
    matches!(
        error,
        ::serenity::Error::Http(::serenity::http::HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 404
    )
}

async fn channel_exists(ctx: Context<'_>, channel_id: ChannelId) -> bool {
    let cached = ctx.guild().is_some_and(|guild| {
        guild.channels.contains_key(&channel_id)
            || guild.threads.iter().any(|thread| thread.id == channel_id)
    });
    if cached {
        return true;
    }

    // archived threads aren't cached.
    match channel_id.to_channel(ctx).await {
        Ok(_) => true,
        Err(e) => !is_unknown_channel(&e),
    }
}

/// Lists the blacklisted channels. Stars on messages from these channels don't count.
#[poise::command(
    prefix_command,
    rename = "list",
    required_permissions = "MANAGE_GUILD",
    check = "crate::utils::checks::starboard_enabled",
    guild_only
)]
pub async fn blacklist_list(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Not in a guild.")?;
    let data = ctx.data();
    let mut config = data.database.get_guild_config(guild_id).await?;

    let mut existing = Vec::new();
    let mut deleted = Vec::new();
    for channel_id in config.star_blacklist.iter().copied() {
        if channel_exists(ctx, channel_id).await {
            existing.push(channel_id);
        } else {
            deleted.push(channel_id);
        }
    }

    if !deleted.is_empty() {
        for channel_id in &deleted {
            config.star_blacklist.remove(channel_id);
        }
        data.database.update_guild_config(&config).await?;
    }

    if existing.is_empty() {
        ctx.say("There's no blacklisted channels for this guild!")
            .await?;
        return Ok(());
    }

    let mentions = existing
        .iter()
        .map(|c| format!("<#{c}>"))
        .collect::<Vec<_>>()
        .join(", ");
    ctx.say(format!("Blacklisted channels: {mentions}")).await?;

    Ok(())
}

/// Adds the channel to the blacklist.
#[poise::command(
    prefix_command,
    rename = "add",
    required_permissions = "MANAGE_GUILD",
    check = "crate::utils::checks::starboard_enabled",
    guild_only
)]
pub async fn blacklist_add(
    ctx: Context<'_>,
    #[description = "The channel to ignore stars in"] channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Not in a guild.")?;
    let data = ctx.data();
    let mut config = data.database.get_guild_config(guild_id).await?;

    if channel.guild_id != guild_id {
        return Err(invalid("That channel isn't in this server!"));
    }

    if !can_blacklist(channel.kind) {
        return Err(invalid("Only text channels and threads can be blacklisted!"));
    }

    if !config.star_blacklist.insert(channel.id) {
        return Err(invalid("That channel's already in the blacklist!"));
    }

    data.database.update_guild_config(&config).await?;
    ctx.say(format!("Added <#{}> to the blacklist!", channel.id))
        .await?;

    Ok(())
}

/// Removes the channel from the blacklist.
#[poise::command(
    prefix_command,
    rename = "remove",
    required_permissions = "MANAGE_GUILD",
    check = "crate::utils::checks::starboard_enabled",
    guild_only
)]
pub async fn blacklist_remove(
    ctx: Context<'_>,
    #[description = "The channel to count stars in again"] channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Not in a guild.")?;
    let data = ctx.data();
    let mut config = data.database.get_guild_config(guild_id).await?;

    if !config.star_blacklist.remove(&channel.id) {
        return Err(invalid("That channel's not in the blacklist!"));
    }

    data.database.update_guild_config(&config).await?;
    ctx.say(format!("Removed <#{}> from the blacklist!", channel.id))
        .await?;

    Ok(())
}

fn parse_message_id(input: &str) -> Option<MessageId> {
    input
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(MessageId::new)
}

/// Forces a message onto the starboard, regardless of how many stars it has.
///
/// The message must be in the same channel you run this command in.
/// It can't be taken off the starboard afterwards unless it is deleted from there manually.
#[poise::command(
    prefix_command,
    required_permissions = "MANAGE_GUILD",
    guild_only,
    category = "Starboard"
)]
pub async fn force(
    ctx: Context<'_>,
    #[description = "The id of the message to force"] message_id: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Not in a guild.")?;
    let data = ctx.data();

    let config = data.database.get_guild_config(guild_id).await?;
    if !config.star_toggle {
        return Err(invalid("Starboard is not turned on for this server!"));
    }

    let Some(message_id) = parse_message_id(&message_id) else {
        return Err(invalid("Not a valid message id!"));
    };

    let Ok(message) = ctx.channel_id().message(ctx, message_id).await else {
        return Err(invalid(
            "Message not found! Is this a valid message ID and are you running this command in \
             the same channel as the message?",
        ));
    };

    match force_post(ctx.serenity_context(), data, &message).await? {
        ForceOutcome::Disabled => {
            ctx.say("Starboard is not turned on for this server!")
                .await?;
        }
        ForceOutcome::AlreadyPosted => {
            ctx.say("This message is already on the starboard!").await?;
        }
        ForceOutcome::Posted => {
            ctx.say("Done!").await?;
        }
    }

    Ok(())
}

#[must_use]
pub fn commands() -> [crate::Command; 2] {
    [starboard(), force()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_ids() {
        assert_eq!(parse_message_id("123456"), Some(MessageId::new(123456)));
        assert_eq!(parse_message_id(" 42 "), Some(MessageId::new(42)));
        assert_eq!(parse_message_id("0"), None);
        assert_eq!(parse_message_id("abc"), None);
        assert_eq!(parse_message_id("-5"), None);
    }

    #[test]
    fn blacklist_takes_text_channels_and_threads() {
        assert!(can_blacklist(serenity::ChannelType::Text));
        assert!(can_blacklist(serenity::ChannelType::News));
        assert!(can_blacklist(serenity::ChannelType::PublicThread));
        assert!(can_blacklist(serenity::ChannelType::PrivateThread));
        assert!(!can_blacklist(serenity::ChannelType::Voice));
        assert!(!can_blacklist(serenity::ChannelType::Category));
        assert!(!can_blacklist(serenity::ChannelType::Stage));
    }

    #[test]
    fn only_missing_channels_get_pruned() {
        assert!(!is_unknown_channel(&::serenity::Error::Other("gateway hiccup")));
    }
}
