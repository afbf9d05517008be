use std::{sync::atomic::Ordering, time::Instant};

use poise::serenity_prelude as serenity;

use crate::{Context, Error};

/// Renders seconds as the largest units that fit, e.g. `2d 3h 0m 5s`.
fn format_uptime(total: u64) -> String {
    let days = total / 86_400;
    let hours = total % 86_400 / 3_600;
    let minutes = total % 3_600 / 60;
    let seconds = total % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m {seconds}s")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// How long the bot has been running, and how often it had to reconnect.
#[poise::command(prefix_command, category = "General", user_cooldown = 3)]
pub async fn uptime(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let running = format_uptime(data.time_started.elapsed().as_secs());
    let reconnects = data.readies.load(Ordering::Relaxed).saturating_sub(1);

    ctx.say(format!(
        "I've been up for `{running}`, with {reconnects} reconnect(s)."
    ))
    .await?;

    Ok(())
}

/// Shows general help, or help for a specific command.
#[poise::command(prefix_command, track_edits, category = "General", user_cooldown = 3)]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[rest]
    command: Option<String>,
) -> Result<(), Error> {
    let prefix = ctx.data().config.read().prefix.clone();
    let footer = format!("Type {prefix}help <command> for more info on a command.");

    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            extra_text_at_bottom: &footer,
            ..Default::default()
        },
    )
    .await?;
    Ok(())
}

/// Checks the gateway heartbeat and how long a message takes to send.
#[poise::command(prefix_command, category = "General", user_cooldown = 10)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    let heartbeat = ctx.ping().await;

    let started = Instant::now();
    let handle = ctx.say("Pinging...").await?;
    let round_trip = started.elapsed();

    let colour = ctx.data().config.read().embed_colour;
    let embed = serenity::CreateEmbed::new()
        .title("Pong!")
        .colour(colour)
        .field("Heartbeat", format!("{}ms", heartbeat.as_millis()), true)
        .field("Message", format!("{}ms", round_trip.as_millis()), true);

    handle
        .edit(ctx, poise::CreateReply::default().content("").embed(embed))
        .await?;

    Ok(())
}

/// Registers or removes the slash commands.
#[poise::command(prefix_command, owners_only, hide_in_help)]
pub async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx).await?;
    Ok(())
}

#[must_use]
pub fn commands() -> [crate::Command; 4] {
    [uptime(), help(), ping(), register()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_drops_empty_leading_units() {
        assert_eq!(format_uptime(0), "0s");
        assert_eq!(format_uptime(59), "59s");
        assert_eq!(format_uptime(61), "1m 1s");
        assert_eq!(format_uptime(3_600), "1h 0m 0s");
        assert_eq!(format_uptime(90_061), "1d 1h 1m 1s");
    }
}
