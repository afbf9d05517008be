use crate::{Context, Error};
use seraphim_data::invalid;

/// Blocks starboard commands until the starboard has been switched on.
pub async fn starboard_enabled(ctx: Context<'_>) -> Result<bool, Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(false);
    };

    let config = ctx.data().database.get_guild_config(guild_id).await?;
    if config.star_toggle {
        Ok(true)
    } else {
        Err(invalid("Starboard is not turned on for this server!"))
    }
}

/// Runs before every command: no DMs, and no commands a moderator disabled for the author.
pub async fn command_check(ctx: Context<'_>) -> Result<bool, Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(false);
    };

    let name = ctx
        .parent_commands()
        .first()
        .map_or(&ctx.command().name, |root| &root.name);

    let config = ctx.data().database.get_guild_config(guild_id).await?;
    if config.is_disabled_for(ctx.author().id, name) {
        return Err(invalid(format!(
            "`{name}` has been disabled for you in this server."
        )));
    }

    Ok(true)
}
