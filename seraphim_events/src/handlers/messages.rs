use crate::Data;
use poise::serenity_prelude::{self as serenity, ChannelId, GuildId, Message, MessageId};
use seraphim_data::snipe::{SnipeKind, SnipedMessage};

/// Snipes need the content, so this only works while the message is still cached.
pub fn message_delete(
    ctx: &serenity::Context,
    channel_id: ChannelId,
    message_id: MessageId,
    guild_id: Option<GuildId>,
    data: &Data,
) {
    if guild_id.is_none() {
        return;
    }

    let Some(message) = ctx
        .cache
        .message(channel_id, message_id)
        .map(|m| m.clone())
    else {
        return;
    };

    if message.author.bot {
        return;
    }

    let sniped = SnipedMessage::from_message(&message, message.content.clone());
    data.snipes.store(SnipeKind::Deleted, channel_id, sniped);
}

pub fn message_edit(
    old_if_available: Option<&Message>,
    new: Option<&Message>,
    event: &serenity::MessageUpdateEvent,
    data: &Data,
) {
    if event.guild_id.is_none() {
        return;
    }

    let Some(old) = old_if_available else {
        return;
    };

    if old.author.bot {
        return;
    }

    // embeds resolving also fire an update, only real edits count.
    let new_content = new
        .map(|m| m.content.as_str())
        .or(event.content.as_deref());
    if !new_content.is_some_and(|content| content != old.content) {
        return;
    }

    let sniped = SnipedMessage::from_message(old, old.content.clone());
    data.snipes.store(SnipeKind::Edited, event.channel_id, sniped);
}
