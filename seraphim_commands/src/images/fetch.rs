use poise::serenity_prelude as serenity;
use seraphim_data::{invalid, InvalidInput};

use crate::{images::process::natural_size, Context, Error};

fn first_image_url(message: &serenity::Message) -> Option<String> {
    if let Some(attachment) = message.attachments.first() {
        return Some(attachment.url.clone());
    }

    message.embeds.iter().find_map(|embed| {
        embed
            .image
            .as_ref()
            .map(|image| image.url.clone())
            .or_else(|| embed.thumbnail.as_ref().map(|thumb| thumb.url.clone()))
    })
}

/// The image to work on: an explicit url, this message's attachments, or the replied message's.
pub fn image_url(ctx: Context<'_>, url: Option<String>) -> Result<String, InvalidInput> {
    if let Some(url) = url {
        return Ok(url);
    }

    if let poise::Context::Prefix(prefix) = ctx {
        if let Some(url) = first_image_url(prefix.msg) {
            return Ok(url);
        }

        if let Some(url) = prefix
            .msg
            .referenced_message
            .as_deref()
            .and_then(first_image_url)
        {
            return Ok(url);
        }
    }

    Err(InvalidInput::new(
        "No image found! Give me a url, attach an image or reply to a message with one.",
    ))
}

fn too_big(limit: u64) -> Error {
    invalid(format!(
        "The image is over {}! Please give a smaller image.",
        natural_size(limit)
    ))
}

/// Downloads `url`, refusing anything over `limit` bytes.
pub async fn fetch_image(client: &reqwest::Client, url: &str, limit: u64) -> Result<Vec<u8>, Error> {
    let Ok(mut response) = client.get(url).send().await else {
        return Err(invalid("Could not download that image!"));
    };

    if !response.status().is_success() {
        return Err(invalid(format!(
            "Could not download that image! (status {})",
            response.status()
        )));
    }

    if response.content_length().is_some_and(|len| len > limit) {
        return Err(too_big(limit));
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        bytes.extend_from_slice(&chunk);
        if bytes.len() as u64 > limit {
            return Err(too_big(limit));
        }
    }

    Ok(bytes)
}
