use std::time::Instant;

use poise::serenity_prelude as serenity;
use seraphim_data::snipe::{SnipeKind, SnipedMessage};

use crate::{Context, Error};

fn snipe_embed(message: &SnipedMessage, colour: u32) -> serenity::CreateEmbed {
    let author = serenity::CreateEmbedAuthor::new(format!(
        "{} ({})",
        message.author_name, message.author_tag
    ))
    .icon_url(&message.avatar_url);

    let mut embed = serenity::CreateEmbed::new()
        .author(author)
        .colour(colour)
        .timestamp(message.created_at);

    if !message.content.is_empty() {
        embed = embed.description(&message.content);
    }

    embed
}

async fn send_snipe(ctx: Context<'_>, kind: SnipeKind) -> Result<(), Error> {
    let data = ctx.data();
    let (window, colour) = {
        let config = data.config.read();
        (config.snipe_window, config.embed_colour)
    };

    let sniped = data
        .snipes
        .recent(kind, ctx.channel_id(), window, Instant::now());

    let Some(sniped) = sniped else {
        ctx.say("There's nothing to snipe!").await?;
        return Ok(());
    };

    ctx.send(poise::CreateReply::default().embed(snipe_embed(&sniped, colour)))
        .await?;

    Ok(())
}

/// Gets the last deleted message from the channel this command was used in.
#[poise::command(prefix_command, guild_only, category = "General")]
pub async fn snipe(ctx: Context<'_>) -> Result<(), Error> {
    send_snipe(ctx, SnipeKind::Deleted).await
}

/// Gets the last edited message from the channel this command was used in.
#[poise::command(prefix_command, guild_only, category = "General")]
pub async fn editsnipe(ctx: Context<'_>) -> Result<(), Error> {
    send_snipe(ctx, SnipeKind::Edited).await
}

#[must_use]
pub fn commands() -> [crate::Command; 2] {
    [snipe(), editsnipe()]
}
