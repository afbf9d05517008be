use poise::serenity_prelude::{self as serenity, ChannelId, Permissions, RoleId};

use crate::{
    utils::{
        converters::{channel_from_input, channel_id_from, parse_hex_colour, resolve_channel},
        wizard::Wizard,
    },
    Context, Error,
};

const TITLE_LIMIT: usize = 256;
const DESCRIPTION_LIMIT: usize = 4096;
const EMBED_TOTAL_LIMIT: usize = 6000;

/// What a repeated message is allowed to ping, mirroring what the invoker could ping themselves.
#[derive(Debug, PartialEq, Eq)]
enum MentionPolicy {
    Everything,
    Limited(Vec<RoleId>),
}

impl MentionPolicy {
    fn for_permissions(permissions: Permissions, mentionable_roles: Vec<RoleId>) -> Self {
        if permissions.administrator() || permissions.mention_everyone() {
            MentionPolicy::Everything
        } else {
            MentionPolicy::Limited(mentionable_roles)
        }
    }

    fn allowed_mentions(self) -> serenity::CreateAllowedMentions {
        let mentions = serenity::CreateAllowedMentions::new().all_users(true);

        match self {
            MentionPolicy::Everything => mentions.everyone(true).all_roles(true),
            MentionPolicy::Limited(roles) => mentions.everyone(false).roles(roles),
        }
    }
}

async fn mention_policy(ctx: Context<'_>) -> Result<MentionPolicy, Error> {
    let member = ctx.author_member().await.ok_or("Could not fetch the author.")?;

    let guild = ctx.guild().ok_or("Guild is not cached.")?;
    let mentionable = guild
        .roles
        .values()
        .filter(|role| role.mentionable)
        .map(|role| role.id)
        .collect();

    Ok(MentionPolicy::for_permissions(
        guild.member_permissions(&member),
        mentionable,
    ))
}

/// Splits an optional leading channel mention from the text to repeat.
fn split_target(message: &str) -> (Option<ChannelId>, &str) {
    let message = message.trim_start();
    let (first, rest) = message.split_once(char::is_whitespace).unwrap_or((message, ""));

    if first.starts_with("<#") {
        if let Some(channel_id) = channel_id_from(first) {
            return (Some(channel_id), rest.trim_start());
        }
    }

    (None, message)
}

/// Repeats what you say, optionally in another channel. Attachments are sent along too.
#[poise::command(
    prefix_command,
    required_permissions = "MANAGE_GUILD",
    guild_only,
    category = "General"
)]
pub async fn say(
    ctx: Context<'_>,
    #[description = "An optional #channel followed by what to say"]
    #[rest]
    message: String,
) -> Result<(), Error> {
    let (target, text) = split_target(&message);

    let target = match target {
        Some(channel_id) => Some(resolve_channel(ctx, channel_id).await?),
        None => None,
    };

    let mut builder = serenity::CreateMessage::new()
        .allowed_mentions(mention_policy(ctx).await?.allowed_mentions());

    if !text.is_empty() {
        builder = builder.content(text);
    }

    if let poise::Context::Prefix(prefix) = ctx {
        for attachment in &prefix.msg.attachments {
            builder = builder.add_file(serenity::CreateAttachment::bytes(
                attachment.download().await?,
                attachment.filename.clone(),
            ));
        }
    }

    match target {
        Some(channel) => {
            channel.id.send_message(ctx, builder).await?;
            ctx.say(format!("Done! Check out <#{}>!", channel.id))
                .await?;
        }
        None => {
            ctx.channel_id().send_message(ctx, builder).await?;
        }
    }

    Ok(())
}

/// Checks an embed against discord's embed limits.
fn embed_fits(title: &str, description: &str) -> Result<(), String> {
    let title_len = title.chars().count();
    let description_len = description.chars().count();

    if title_len > TITLE_LIMIT {
        return Err(format!("The title can be at most {TITLE_LIMIT} characters long."));
    }

    if description_len > DESCRIPTION_LIMIT {
        return Err(format!(
            "The description can be at most {DESCRIPTION_LIMIT} characters long."
        ));
    }

    if title_len + description_len > EMBED_TOTAL_LIMIT {
        return Err(format!(
            "The embed can be at most {EMBED_TOTAL_LIMIT} characters long."
        ));
    }

    Ok(())
}

/// Sends an embed built through a little wizard.
#[poise::command(
    prefix_command,
    required_permissions = "MANAGE_GUILD",
    guild_only,
    category = "General"
)]
pub async fn embed_say(ctx: Context<'_>) -> Result<(), Error> {
    let timeout = ctx.data().config.read().say_wizard_timeout;
    let mut wizard = Wizard::new(ctx, "Embed Say", timeout);

    let Some(reply) = wizard
        .ask(
            "1. Which channel do you want to send this message to? If you just want to send it in \
             this channel, just say \"skip\".",
        )
        .await?
    else {
        return Ok(());
    };

    let mut target = None;
    if !reply.content.trim().eq_ignore_ascii_case("skip") {
        match channel_from_input(ctx, &reply.content).await {
            Ok(channel) => target = Some(channel),
            Err(e) => return wizard.invalid(e).await,
        }
    }

    let Some(reply) = wizard
        .ask(
            "2. What colour, in hex (ex. #000000), would you like the embed to have? \
             Case-insensitive, does not require '#'.\nIf you just want the default colour, say \
             \"skip\".",
        )
        .await?
    else {
        return Ok(());
    };

    let mut colour = None;
    if !reply.content.trim().eq_ignore_ascii_case("skip") {
        match parse_hex_colour(&reply.content) {
            Ok(parsed) => colour = Some(parsed),
            Err(e) => return wizard.invalid(e).await,
        }
    }

    let Some(title) = wizard
        .ask("3. What will be the title of the embed? Markdown works with titles.")
        .await?
    else {
        return Ok(());
    };

    let Some(description) = wizard
        .ask("4. What will be the content of the embed? Markdown works with content.")
        .await?
    else {
        return Ok(());
    };

    if let Err(reason) = embed_fits(&title.content, &description.content) {
        return wizard.invalid(reason).await;
    }

    let mut embed = serenity::CreateEmbed::new()
        .title(&title.content)
        .description(&description.content);
    if let Some(colour) = colour {
        embed = embed.colour(colour);
    }

    let channel_id = target.as_ref().map_or(ctx.channel_id(), |c| c.id);
    channel_id
        .send_message(ctx, serenity::CreateMessage::new().embed(embed))
        .await?;

    match target {
        Some(channel) => {
            wizard
                .finish(&format!("Done! Check out <#{}>!", channel.id))
                .await
        }
        None => wizard.finish("Setup complete.").await,
    }
}

#[must_use]
pub fn commands() -> [crate::Command; 2] {
    [say(), embed_say()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_channel_is_split_off() {
        assert_eq!(
            split_target("<#123> hello there"),
            (Some(ChannelId::new(123)), "hello there")
        );
        assert_eq!(split_target("hello <#123>"), (None, "hello <#123>"));
        assert_eq!(split_target("<#123>"), (Some(ChannelId::new(123)), ""));
        // raw ids are just text here.
        assert_eq!(split_target("123 hi"), (None, "123 hi"));
    }

    #[test]
    fn mention_policy_follows_permissions() {
        let roles = vec![RoleId::new(5)];

        assert_eq!(
            MentionPolicy::for_permissions(Permissions::ADMINISTRATOR, roles.clone()),
            MentionPolicy::Everything
        );
        assert_eq!(
            MentionPolicy::for_permissions(Permissions::MENTION_EVERYONE, roles.clone()),
            MentionPolicy::Everything
        );
        assert_eq!(
            MentionPolicy::for_permissions(Permissions::SEND_MESSAGES, roles.clone()),
            MentionPolicy::Limited(roles)
        );
    }

    #[test]
    fn embed_limits() {
        assert!(embed_fits("title", "description").is_ok());
        assert!(embed_fits(&"t".repeat(257), "").is_err());
        assert!(embed_fits("", &"d".repeat(4097)).is_err());
        assert!(embed_fits(&"t".repeat(256), &"d".repeat(4096)).is_ok());
    }
}
