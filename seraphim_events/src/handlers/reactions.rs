use crate::{Data, Error};
use poise::serenity_prelude as serenity;
use std::sync::Arc;

use seraphim_starboard::{starboard_add_handler, starboard_remove_handler};

pub async fn reaction_add(
    ctx: &serenity::Context,
    reaction: &serenity::Reaction,
    data: &Arc<Data>,
) -> Result<(), Error> {
    starboard_add_handler(ctx, reaction, data).await
}

pub async fn reaction_remove(
    ctx: &serenity::Context,
    reaction: &serenity::Reaction,
    data: &Arc<Data>,
) -> Result<(), Error> {
    starboard_remove_handler(ctx, reaction, data).await
}
