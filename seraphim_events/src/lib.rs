use poise::serenity_prelude::{self as serenity, FullEvent};
use std::sync::Arc;

pub(crate) use seraphim_data::{Data, Error};

pub mod handlers;
use handlers::{guilds, messages, misc, reactions};

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Arc<Data>, Error>,
    data: &Arc<Data>,
) -> Result<(), Error> {
    match event {
        FullEvent::MessageUpdate {
            old_if_available,
            new,
            event,
        } => {
            messages::message_edit(old_if_available.as_ref(), new.as_ref(), event, data);
        }
        FullEvent::MessageDelete {
            channel_id,
            deleted_message_id,
            guild_id,
        } => {
            messages::message_delete(ctx, *channel_id, *deleted_message_id, *guild_id, data);
        }
        FullEvent::ReactionAdd { add_reaction } => {
            reactions::reaction_add(ctx, add_reaction, data).await?;
        }
        FullEvent::ReactionRemove { removed_reaction } => {
            reactions::reaction_remove(ctx, removed_reaction, data).await?;
        }
        FullEvent::GuildCreate { guild, is_new } => {
            guilds::guild_create(guild, *is_new, data).await?;
        }
        FullEvent::GuildDelete { incomplete, full } => {
            guilds::guild_delete(incomplete, full.as_ref(), data);
        }
        FullEvent::Ready { data_about_bot } => {
            misc::ready(ctx, data_about_bot, data).await?;
        }

        _ => {}
    }
    Ok(())
}
