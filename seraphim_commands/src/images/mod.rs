//! Compressing and converting images.

mod args;
mod fetch;
pub mod process;

use poise::serenity_prelude as serenity;
use seraphim_data::{invalid, InvalidInput};

use crate::{utils::converters::ImageType, Context, Error};
use args::ImageArgs;
use process::{natural_size, percent_saved, process, Options};

const COMPRESS_FLAGS: &[&str] = &["shrink", "format", "quality"];
const CONVERT_FLAGS: &[&str] = &["shrink", "quality"];

async fn run(
    ctx: Context<'_>,
    url: Option<String>,
    target: Option<ImageType>,
    options: Options,
    report_sizes: bool,
) -> Result<(), Error> {
    let url = fetch::image_url(ctx, url)?;
    let _typing = ctx.defer_or_broadcast().await?;

    let data = ctx.data();
    let limit = data.config.read().image_size_limit;
    let bytes = fetch::fetch_image(&data.reqwest, &url, limit).await?;

    let source = image::guess_format(&bytes)
        .ok()
        .and_then(ImageType::from_format)
        .ok_or_else(|| {
            InvalidInput::new("Invalid file type! The image must be a gif, jpg, png or webp.")
        })?;
    let target = target.unwrap_or(source);

    let original_len = bytes.len();
    let output = tokio::task::spawn_blocking(move || process(&bytes, source, target, options))
        .await?
        .map_err(|e| invalid(e.to_string()))?;
    let output_len = output.len();

    let mut reply = poise::CreateReply::default()
        .attachment(serenity::CreateAttachment::bytes(
            output,
            format!("image.{}", target.extension()),
        ))
        .reply(true);

    if report_sizes {
        reply = reply.content(format!(
            "Original Size: {}\nReduced Size: {}\nSize Saved: {:.2}%",
            natural_size(original_len as u64),
            natural_size(output_len as u64),
            percent_saved(original_len, output_len)
        ));
    }

    ctx.send(reply).await?;
    Ok(())
}

/// Compresses down the image given.
///
/// It must be a GIF, JPG, PNG or WEBP image under 8 MiB. The image can be a url, an attachment
/// or an image in the message you reply to.
///
/// Flags:
/// `--shrink <true/false>` shrinks the image if it's bigger than 1920px (on by default)
/// `--format <format>` converts the image to gif, jpg, png or webp (same format by default)
/// `--quality <0-100>` only for JPG output, 70 by default (WEBP output is always lossless)
#[poise::command(prefix_command, guild_only, category = "Image", user_cooldown = 5)]
pub async fn compress(
    ctx: Context<'_>,
    #[description = "An optional url followed by flags"]
    #[rest]
    args: Option<String>,
) -> Result<(), Error> {
    let args = ImageArgs::parse(args.as_deref().unwrap_or_default(), COMPRESS_FLAGS)?;
    if let Some(extra) = args.positional.first() {
        return Err(invalid(format!("Unexpected argument `{extra}`.")));
    }

    let options = Options {
        shrink: args.shrink.unwrap_or(true),
        quality: args.quality.unwrap_or(70),
    };

    run(ctx, args.url, args.format, options, true).await
}

/// Converts the given image into the specified image type.
///
/// Both the image and the type must be GIF, JP(E)G, PNG or WEBP, and the image must be under
/// 8 MiB. Animated images can only be converted to GIF, or to WEBP as a still of the first frame.
///
/// Flags:
/// `--shrink <true/false>` shrinks the image if it's bigger than 1920px (off by default)
/// `--quality <0-100>` only for JPG output, 80 by default (WEBP output is always lossless)
#[poise::command(
    prefix_command,
    aliases("image_convert"),
    guild_only,
    category = "Image",
    user_cooldown = 5
)]
pub async fn img_convert(
    ctx: Context<'_>,
    #[description = "An optional url, the image type, then flags"]
    #[rest]
    args: Option<String>,
) -> Result<(), Error> {
    let args = ImageArgs::parse(args.as_deref().unwrap_or_default(), CONVERT_FLAGS)?;

    let target = match args.positional.as_slice() {
        [] => return Err(invalid("You need to give an image type to convert to!")),
        [image_type] => image_type.parse::<ImageType>()?,
        [_, extra, ..] => return Err(invalid(format!("Unexpected argument `{extra}`."))),
    };

    let options = Options {
        shrink: args.shrink.unwrap_or(false),
        quality: args.quality.unwrap_or(80),
    };

    run(ctx, args.url, Some(target), options, false).await
}

#[must_use]
pub fn commands() -> [crate::Command; 2] {
    [compress(), img_convert()]
}
