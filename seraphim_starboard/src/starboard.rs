use crate::{
    message::{starboard_message, Style},
    tally::{self, Outcome, Side, StarChange},
    Data, Error,
};
use poise::serenity_prelude as serenity;
use seraphim_data::database::StarboardEntry;
use std::sync::Arc;

fn is_star(emoji: &serenity::ReactionType, data: &Data) -> bool {
    match emoji {
        serenity::ReactionType::Unicode(name) => *name == data.config.read().star_emoji,
        _ => false,
    }
}

async fn reactor_is_bot(
    ctx: &serenity::Context,
    reaction: &serenity::Reaction,
    user_id: serenity::UserId,
) -> Result<bool, Error> {
    if let Some(member) = &reaction.member {
        return Ok(member.user.bot);
    }

    Ok(user_id.to_user(ctx).await?.bot)
}

pub async fn starboard_add_handler(
    ctx: &serenity::Context,
    reaction: &serenity::Reaction,
    data: &Arc<Data>,
) -> Result<(), Error> {
    handle_reaction(ctx, reaction, data, StarChange::Added).await
}

pub async fn starboard_remove_handler(
    ctx: &serenity::Context,
    reaction: &serenity::Reaction,
    data: &Arc<Data>,
) -> Result<(), Error> {
    handle_reaction(ctx, reaction, data, StarChange::Removed).await
}

async fn handle_reaction(
    ctx: &serenity::Context,
    reaction: &serenity::Reaction,
    data: &Arc<Data>,
    change: StarChange,
) -> Result<(), Error> {
    let (Some(guild_id), Some(user_id)) = (reaction.guild_id, reaction.user_id) else {
        return Ok(());
    };

    if !is_star(&reaction.emoji, data) {
        return Ok(());
    }

    let config = data.database.get_guild_config(guild_id).await?;
    let Some((starboard_channel, limit)) = config.active_starboard() else {
        return Ok(());
    };

    let existing = data.database.get_starboard_entry(reaction.message_id).await?;
    let side = tally::side_of(existing.as_ref(), reaction.message_id);
    if tally::ignored_channel(&config, reaction.channel_id, side) {
        return Ok(());
    }

    // removals can only touch an entry that already exists.
    if existing.is_none() && change == StarChange::Removed {
        return Ok(());
    }

    if change == StarChange::Added && reactor_is_bot(ctx, reaction, user_id).await? {
        return Ok(());
    }

    let mut source = None;
    if existing.is_none() {
        let message = reaction.message(ctx).await?;
        let entry = StarboardEntry::new(message.id, guild_id, message.channel_id, message.author.id);
        data.database.starboard.lock().insert_if_absent(entry);
        source = Some(message);
    }

    let (outcome, entry) = {
        let mut guard = data.database.starboard.lock();
        let origin = guard.origin_of(reaction.message_id);
        let posting = guard.is_posting(origin);

        let Some(entry) = guard.get_mut(origin) else {
            return Ok(());
        };

        let outcome = tally::apply(entry, side, change, user_id, limit, posting);
        let entry = entry.clone();

        if outcome == Outcome::Post {
            guard.begin_posting(origin);
        }

        (outcome, entry)
    };

    match outcome {
        Outcome::Nothing => {}
        Outcome::Tracked => data.database.save_starboard_entry(&entry).await?,
        Outcome::Refresh => {
            data.database.save_starboard_entry(&entry).await?;
            data.star_refresh.put(entry.message_id);
        }
        Outcome::Post => {
            tracing::info!(
                "Message {} in {guild_id} reached {} stars, posting to the starboard.",
                entry.message_id,
                entry.star_count()
            );
            post_entry(ctx, data, starboard_channel, &entry, source).await?;
        }
    }

    Ok(())
}

async fn send_copy(
    ctx: &serenity::Context,
    data: &Data,
    starboard_channel: serenity::ChannelId,
    entry: &StarboardEntry,
    source: Option<serenity::Message>,
) -> Result<serenity::Message, Error> {
    let message = match source {
        Some(message) => message,
        None => entry.channel_id.message(ctx, entry.message_id).await?,
    };

    let builder = starboard_message(&message, entry.star_count(), &Style::from_data(data));
    Ok(starboard_channel.send_message(ctx, builder).await?)
}

/// Sends `entry` to the starboard. The caller must hold the posting marker for it.
pub(crate) async fn post_entry(
    ctx: &serenity::Context,
    data: &Data,
    starboard_channel: serenity::ChannelId,
    entry: &StarboardEntry,
    source: Option<serenity::Message>,
) -> Result<(), Error> {
    let origin = entry.message_id;
    let sent = send_copy(ctx, data, starboard_channel, entry, source).await;

    let copy = sent.as_ref().ok().map(|copy| (starboard_channel, copy.id));
    let current = data.database.starboard.lock().finish_post(origin, copy);

    if let Some(current) = &current {
        data.database.save_starboard_entry(current).await?;
    }

    sent?;

    // stars that landed while the copy was being sent.
    if current.is_some_and(|current| current.star_count() != entry.star_count()) {
        data.star_refresh.put(origin);
    }

    Ok(())
}
