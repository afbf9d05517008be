use poise::serenity_prelude as serenity;
use seraphim_data::{invalid, InvalidInput};

use crate::{Command, Context, Error};

const MAX_PREFIXES: usize = 10;
const MAX_PREFIX_LEN: usize = 15;

/// Commands that can never be disabled for anyone.
const PROTECTED: [&str; 3] = ["disable", "enable", "help"];

fn check_new_prefix(prefixes: &[String], prefix: &str) -> Result<(), InvalidInput> {
    if prefix.is_empty() {
        return Err(InvalidInput::new("A prefix can't be empty!"));
    }

    if prefix.chars().count() > MAX_PREFIX_LEN {
        return Err(InvalidInput::new(format!(
            "Prefixes can be at most {MAX_PREFIX_LEN} characters long!"
        )));
    }

    if prefixes.iter().any(|p| p == prefix) {
        return Err(InvalidInput::new("That prefix already exists!"));
    }

    if prefixes.len() >= MAX_PREFIXES {
        return Err(InvalidInput::new(format!(
            "This server already has {MAX_PREFIXES} prefixes!"
        )));
    }

    Ok(())
}

/// Lists this server's extra prefixes. The default prefix and mentions always work.
#[poise::command(
    prefix_command,
    subcommands("prefix_list", "prefix_add", "prefix_remove"),
    required_permissions = "MANAGE_GUILD",
    guild_only,
    category = "Settings"
)]
pub async fn prefix(ctx: Context<'_>) -> Result<(), Error> {
    list_prefixes(ctx).await
}

async fn list_prefixes(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Not in a guild.")?;
    let data = ctx.data();
    let config = data.database.get_guild_config(guild_id).await?;
    let default = data.config.read().prefix.clone();

    let mut lines = vec![format!("`{default}`"), String::from("@mention")];
    lines.extend(config.prefixes.iter().map(|p| format!("`{p}`")));

    ctx.say(format!("Prefixes for this server: {}", lines.join(", ")))
        .await?;
    Ok(())
}

/// Lists this server's prefixes.
#[poise::command(
    prefix_command,
    rename = "list",
    required_permissions = "MANAGE_GUILD",
    guild_only
)]
pub async fn prefix_list(ctx: Context<'_>) -> Result<(), Error> {
    list_prefixes(ctx).await
}

/// Adds a prefix for this server.
#[poise::command(
    prefix_command,
    rename = "add",
    required_permissions = "MANAGE_GUILD",
    guild_only
)]
pub async fn prefix_add(
    ctx: Context<'_>,
    #[description = "The prefix to add"]
    #[rest]
    prefix: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Not in a guild.")?;
    let data = ctx.data();
    let mut config = data.database.get_guild_config(guild_id).await?;

    let prefix = prefix.trim().to_owned();
    check_new_prefix(&config.prefixes, &prefix)?;

    config.prefixes.push(prefix.clone());
    data.database.update_guild_config(&config).await?;

    ctx.say(format!("Added `{prefix}` as a prefix!")).await?;
    Ok(())
}

/// Removes a prefix from this server.
#[poise::command(
    prefix_command,
    rename = "remove",
    required_permissions = "MANAGE_GUILD",
    guild_only
)]
pub async fn prefix_remove(
    ctx: Context<'_>,
    #[description = "The prefix to remove"]
    #[rest]
    prefix: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Not in a guild.")?;
    let data = ctx.data();
    let mut config = data.database.get_guild_config(guild_id).await?;

    let prefix = prefix.trim();
    let before = config.prefixes.len();
    config.prefixes.retain(|p| p != prefix);

    if config.prefixes.len() == before {
        return Err(invalid("That prefix doesn't exist!"));
    }

    data.database.update_guild_config(&config).await?;
    ctx.say(format!("Removed `{prefix}` from the prefixes!"))
        .await?;
    Ok(())
}

/// Finds the top level command `name` refers to, aliases included.
fn resolve_command<'a>(commands: &'a [Command], name: &str) -> Option<&'a Command> {
    let name = name.trim().to_lowercase();
    commands
        .iter()
        .find(|c| c.name == name || c.aliases.iter().any(|a| *a == name))
}

fn disable_target(commands: &[Command], name: &str) -> Result<String, InvalidInput> {
    let command = resolve_command(commands, name)
        .ok_or_else(|| InvalidInput::new(format!("There's no command called `{name}`!")))?;

    if PROTECTED.contains(&command.name.as_str()) || command.owners_only {
        return Err(InvalidInput::new(format!(
            "`{}` can't be disabled!",
            command.name
        )));
    }

    Ok(command.name.clone())
}

/// Stops a user from using a command in this server.
#[poise::command(
    prefix_command,
    required_permissions = "MANAGE_GUILD",
    guild_only,
    category = "Settings"
)]
pub async fn disable(
    ctx: Context<'_>,
    #[description = "Who to disable the command for"] user: serenity::User,
    #[description = "The command to disable"] command: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Not in a guild.")?;
    let name = disable_target(&ctx.framework().options().commands, &command)?;

    let changed = ctx
        .data()
        .database
        .set_command_disabled(guild_id, user.id, &name, true)
        .await?;

    if !changed {
        return Err(invalid(format!(
            "`{name}` is already disabled for {}!",
            user.name
        )));
    }

    ctx.say(format!("Disabled `{name}` for {}.", user.name))
        .await?;
    Ok(())
}

/// Lets a user use a command in this server again.
#[poise::command(
    prefix_command,
    required_permissions = "MANAGE_GUILD",
    guild_only,
    category = "Settings"
)]
pub async fn enable(
    ctx: Context<'_>,
    #[description = "Who to enable the command for"] user: serenity::User,
    #[description = "The command to enable"] command: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Not in a guild.")?;
    let name = disable_target(&ctx.framework().options().commands, &command)?;

    let changed = ctx
        .data()
        .database
        .set_command_disabled(guild_id, user.id, &name, false)
        .await?;

    if !changed {
        return Err(invalid(format!(
            "`{name}` isn't disabled for {}!",
            user.name
        )));
    }

    ctx.say(format!("Enabled `{name}` for {}.", user.name))
        .await?;
    Ok(())
}

#[must_use]
pub fn commands() -> [crate::Command; 3] {
    [prefix(), disable(), enable()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixes(list: &[&str]) -> Vec<String> {
        list.iter().map(|p| (*p).to_owned()).collect()
    }

    #[test]
    fn new_prefixes_are_validated() {
        let existing = prefixes(&["!", "s?"]);

        assert!(check_new_prefix(&existing, "?").is_ok());
        assert!(check_new_prefix(&existing, "!").is_err());
        assert!(check_new_prefix(&existing, "").is_err());
        assert!(check_new_prefix(&existing, &"x".repeat(16)).is_err());

        let full = prefixes(&["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"]);
        let err = check_new_prefix(&full, "a").unwrap_err();
        assert_eq!(err.to_string(), "This server already has 10 prefixes!");
    }

    #[test]
    fn commands_resolve_through_aliases() {
        let commands = crate::commands();

        assert_eq!(disable_target(&commands, "snipe").unwrap(), "snipe");
        assert_eq!(disable_target(&commands, "SB").unwrap(), "starboard");
        assert_eq!(
            disable_target(&commands, "image_convert").unwrap(),
            "img_convert"
        );
        assert!(disable_target(&commands, "nonexistent").is_err());
        assert!(disable_target(&commands, "disable").is_err());
        assert!(disable_target(&commands, "register").is_err());
    }
}
