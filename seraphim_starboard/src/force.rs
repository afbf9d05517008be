use crate::{starboard::post_entry, Data, Error};
use poise::serenity_prelude as serenity;
use seraphim_data::database::StarboardEntry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForceOutcome {
    Disabled,
    AlreadyPosted,
    Posted,
}

/// Puts `message` on the starboard no matter how many stars it has.
pub async fn force_post(
    ctx: &serenity::Context,
    data: &Data,
    message: &serenity::Message,
) -> Result<ForceOutcome, Error> {
    let Some(guild_id) = message.guild_id else {
        return Ok(ForceOutcome::Disabled);
    };

    let config = data.database.get_guild_config(guild_id).await?;
    let Some((starboard_channel, _)) = config.active_starboard() else {
        return Ok(ForceOutcome::Disabled);
    };

    // loads a stored entry into the cache if there is one.
    data.database.get_starboard_entry(message.id).await?;

    let entry = {
        let mut guard = data.database.starboard.lock();
        let origin = guard.origin_of(message.id);

        guard.begin_forced_post(StarboardEntry::new(
            origin,
            guild_id,
            message.channel_id,
            message.author.id,
        ))
    };

    let Some(entry) = entry else {
        return Ok(ForceOutcome::AlreadyPosted);
    };

    tracing::info!("Forcing message {} onto the starboard in {guild_id}.", entry.message_id);

    let source = (entry.message_id == message.id).then(|| message.clone());
    post_entry(ctx, data, starboard_channel, &entry, source).await?;

    Ok(ForceOutcome::Posted)
}
