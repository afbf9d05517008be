use std::{fmt, str::FromStr, sync::LazyLock};

use poise::serenity_prelude::{self as serenity, ChannelId, GuildChannel, Permissions};
use seraphim_data::InvalidInput;

use crate::{Context, Error};

static HEX_REGEX: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^(?:[0-9a-fA-F]{3}){1,2}$").unwrap());

pub fn parse_bool(input: &str) -> Result<bool, InvalidInput> {
    match input.to_lowercase().as_str() {
        "yes" | "y" | "true" | "t" | "1" | "enable" | "on" => Ok(true),
        "no" | "n" | "false" | "f" | "0" | "disable" | "off" => Ok(false),
        _ => Err(InvalidInput::new(format!(
            "`{input}` is not a valid true/false value."
        ))),
    }
}

/// A star limit has to be a whole number above zero that fits the database column.
pub fn parse_limit(input: &str) -> Result<u32, InvalidInput> {
    input
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|limit| *limit > 0)
        .map(i32::unsigned_abs)
        .ok_or_else(|| InvalidInput::new("That doesn't seem like a valid number to me..."))
}

/// Parses `#rrggbb`, `rrggbb` or the three digit shorthand.
pub fn parse_hex_colour(input: &str) -> Result<u32, InvalidInput> {
    let hex = input.trim().trim_start_matches('#');
    if !HEX_REGEX.is_match(hex) {
        return Err(InvalidInput::new(format!(
            "`{input}` is not a valid hex colour."
        )));
    }

    let full = if hex.len() == 3 {
        hex.chars().flat_map(|c| [c, c]).collect()
    } else {
        hex.to_owned()
    };

    u32::from_str_radix(&full, 16)
        .map_err(|_| InvalidInput::new(format!("`{input}` is not a valid hex colour.")))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageType {
    Gif,
    Jpeg,
    Png,
    Webp,
}

impl ImageType {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            ImageType::Gif => "gif",
            ImageType::Jpeg => "jpeg",
            ImageType::Png => "png",
            ImageType::Webp => "webp",
        }
    }

    #[must_use]
    pub fn from_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Gif => Some(ImageType::Gif),
            image::ImageFormat::Jpeg => Some(ImageType::Jpeg),
            image::ImageFormat::Png => Some(ImageType::Png),
            image::ImageFormat::WebP => Some(ImageType::Webp),
            _ => None,
        }
    }

    #[must_use]
    pub fn format(self) -> image::ImageFormat {
        match self {
            ImageType::Gif => image::ImageFormat::Gif,
            ImageType::Jpeg => image::ImageFormat::Jpeg,
            ImageType::Png => image::ImageFormat::Png,
            ImageType::Webp => image::ImageFormat::WebP,
        }
    }

    /// Formats that can hold more than one frame.
    #[must_use]
    pub fn can_animate(self) -> bool {
        matches!(self, ImageType::Gif | ImageType::Webp)
    }
}

impl FromStr for ImageType {
    type Err = InvalidInput;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "gif" => Ok(ImageType::Gif),
            "jpg" | "jpeg" => Ok(ImageType::Jpeg),
            "png" => Ok(ImageType::Png),
            "webp" => Ok(ImageType::Webp),
            _ => Err(InvalidInput::new(format!(
                "`{s}` is not a valid image type! It must be gif, jpg, png or webp."
            ))),
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Makes sure the bot can read, send and embed in a channel it is going to post in.
pub fn check_channel_permissions(name: &str, permissions: Permissions) -> Result<(), InvalidInput> {
    let reason = if !permissions.view_channel() {
        "Cannot read messages in"
    } else if !permissions.read_message_history() {
        "Cannot read message history in"
    } else if !permissions.send_messages() {
        "Cannot send messages in"
    } else if !permissions.embed_links() {
        "Cannot send embeds in"
    } else {
        return Ok(());
    };

    Err(InvalidInput::new(format!("{reason} {name}.")))
}

pub async fn bot_permissions_in(
    ctx: Context<'_>,
    channel: &GuildChannel,
) -> Result<Permissions, Error> {
    let bot_id = ctx.cache().current_user().id;
    let member = channel.guild_id.member(ctx, bot_id).await?;

    let guild = ctx.guild().ok_or("Guild is not cached.")?;
    Ok(guild.user_permissions_in(channel, &member))
}

/// A channel of the invoking guild the bot is able to post into.
pub async fn valid_channel(ctx: Context<'_>, channel: GuildChannel) -> Result<GuildChannel, Error> {
    if Some(channel.guild_id) != ctx.guild_id() {
        return Err(InvalidInput::new("That channel isn't in this server!").into());
    }

    let permissions = bot_permissions_in(ctx, &channel).await?;
    check_channel_permissions(&channel.name, permissions)?;

    Ok(channel)
}

/// Reads a channel mention or raw id.
#[must_use]
pub fn channel_id_from(input: &str) -> Option<ChannelId> {
    let input = input.trim();
    ::serenity::utils::parse_channel_mention(input).or_else(|| {
        input
            .parse::<u64>()
            .ok()
            .filter(|id| *id != 0)
            .map(ChannelId::new)
    })
}

pub async fn resolve_channel(ctx: Context<'_>, channel_id: ChannelId) -> Result<GuildChannel, Error> {
    let channel = match channel_id.to_channel(ctx).await {
        Ok(serenity::Channel::Guild(channel)) => channel,
        _ => {
            return Err(InvalidInput::new(format!("Channel <#{channel_id}> not found.")).into());
        }
    };

    valid_channel(ctx, channel).await
}

/// Resolves a mention or id typed by the user into a channel of this guild.
pub async fn channel_from_input(ctx: Context<'_>, input: &str) -> Result<GuildChannel, Error> {
    let channel_id = channel_id_from(input)
        .ok_or_else(|| InvalidInput::new(format!("Channel `{}` not found.", input.trim())))?;

    resolve_channel(ctx, channel_id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bools() {
        assert!(parse_bool("TRUE").unwrap());
        assert!(parse_bool("on").unwrap());
        assert!(!parse_bool("no").unwrap());
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn limits_must_be_positive() {
        assert_eq!(parse_limit("3").unwrap(), 3);
        assert_eq!(parse_limit(" 12 ").unwrap(), 12);

        let err = parse_limit("0").unwrap_err();
        assert_eq!(err.to_string(), "That doesn't seem like a valid number to me...");
        assert!(parse_limit("-2").is_err());
        assert!(parse_limit("three").is_err());
        assert!(parse_limit("2.5").is_err());

        assert_eq!(parse_limit("2147483647").unwrap(), 2_147_483_647);
        assert!(parse_limit("2147483648").is_err());
        assert!(parse_limit("4294967295").is_err());
    }

    #[test]
    fn hex_colours() {
        assert_eq!(parse_hex_colour("#4378FC").unwrap(), 0x4378FC);
        assert_eq!(parse_hex_colour("4378fc").unwrap(), 0x4378FC);
        assert_eq!(parse_hex_colour("#fff").unwrap(), 0xFFFFFF);
        assert_eq!(parse_hex_colour("a1b").unwrap(), 0xAA11BB);

        assert!(parse_hex_colour("#12345").is_err());
        assert!(parse_hex_colour("ggg").is_err());
        assert!(parse_hex_colour("").is_err());
    }

    #[test]
    fn image_types() {
        assert_eq!("jpg".parse::<ImageType>().unwrap(), ImageType::Jpeg);
        assert_eq!("JPEG".parse::<ImageType>().unwrap(), ImageType::Jpeg);
        assert_eq!(".png".parse::<ImageType>().unwrap(), ImageType::Png);
        assert_eq!("webp".parse::<ImageType>().unwrap().extension(), "webp");
        assert!("bmp".parse::<ImageType>().is_err());

        assert!(ImageType::Gif.can_animate());
        assert!(!ImageType::Jpeg.can_animate());
        assert_eq!(
            ImageType::from_format(image::ImageFormat::WebP),
            Some(ImageType::Webp)
        );
        assert_eq!(ImageType::from_format(image::ImageFormat::Bmp), None);
    }

    #[test]
    fn channel_permissions() {
        let all = Permissions::VIEW_CHANNEL
            | Permissions::READ_MESSAGE_HISTORY
            | Permissions::SEND_MESSAGES
            | Permissions::EMBED_LINKS;
        assert!(check_channel_permissions("starboard", all).is_ok());

        let err = check_channel_permissions("starboard", Permissions::empty()).unwrap_err();
        assert_eq!(err.to_string(), "Cannot read messages in starboard.");

        let err =
            check_channel_permissions("starboard", all - Permissions::EMBED_LINKS).unwrap_err();
        assert_eq!(err.to_string(), "Cannot send embeds in starboard.");

        let err = check_channel_permissions("starboard", all - Permissions::READ_MESSAGE_HISTORY)
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot read message history in starboard.");
    }

    #[test]
    fn channel_ids() {
        assert_eq!(channel_id_from("<#1234>"), Some(ChannelId::new(1234)));
        assert_eq!(channel_id_from("1234"), Some(ChannelId::new(1234)));
        assert_eq!(channel_id_from("general"), None);
        assert_eq!(channel_id_from("0"), None);
    }
}
