use poise::serenity_prelude as serenity;
use std::sync::LazyLock;

const DESCRIPTION_LIMIT: usize = 4096;

/// This is a regex that will extract the file extension, requires query params to be removed.
pub static LINK_REGEX: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\.([a-zA-Z0-9]+)$").unwrap());

/// What the starboard copy looks like apart from the message itself.
pub(crate) struct Style {
    pub emoji: String,
    pub colour: u32,
}

impl Style {
    pub(crate) fn from_data(data: &crate::Data) -> Self {
        let config = data.config.read();
        Style {
            emoji: config.star_emoji.clone(),
            colour: config.embed_colour,
        }
    }
}

pub(crate) fn star_header(emoji: &str, count: usize, channel_id: serenity::ChannelId) -> String {
    format!("{emoji} **{count}** | <#{channel_id}>")
}

fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

fn is_image(url: &str) -> bool {
    LINK_REGEX
        .captures(url)
        .and_then(|captures| captures.get(1))
        .is_some_and(|ext| {
            matches!(
                ext.as_str().to_ascii_lowercase().as_str(),
                "jpeg" | "jpg" | "png" | "webp" | "gif"
            )
        })
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_owned();
    }

    let mut cut: String = text.chars().take(limit - 3).collect();
    cut.push_str("...");
    cut
}

/// Text shown in the copy, falling back to the first embed's description for bot messages.
fn display_content(message: &serenity::Message) -> String {
    if !message.content.is_empty() {
        return truncate(&message.content, DESCRIPTION_LIMIT);
    }

    message
        .embeds
        .first()
        .and_then(|embed| embed.description.as_deref())
        .map(|description| truncate(description, DESCRIPTION_LIMIT))
        .unwrap_or_default()
}

fn starboard_embed(message: &serenity::Message, style: &Style) -> serenity::CreateEmbed {
    let author = serenity::CreateEmbedAuthor::new(message.author.display_name())
        .icon_url(message.author.face());

    let mut embed = serenity::CreateEmbed::new()
        .author(author)
        .colour(style.colour)
        .timestamp(message.timestamp)
        .footer(serenity::CreateEmbedFooter::new(format!("ID: {}", message.id)));

    let content = display_content(message);
    if !content.is_empty() {
        embed = embed.description(content);
    }

    let urls: Vec<&str> = message
        .attachments
        .iter()
        .map(|a| strip_query(&a.url))
        .collect();

    if let Some(image) = message
        .attachments
        .iter()
        .find(|a| is_image(strip_query(&a.url)))
    {
        embed = embed.image(&image.url);
    }

    if !urls.is_empty() {
        embed = embed.field("Attachments", truncate(&urls.join("\n"), 1024), false);
    }

    embed.field(
        "Original",
        format!("[Jump!]({})", message.link()),
        false,
    )
}

/// The first send of a message to the starboard.
pub(crate) fn starboard_message(
    message: &serenity::Message,
    count: usize,
    style: &Style,
) -> serenity::CreateMessage {
    serenity::CreateMessage::new()
        .content(star_header(&style.emoji, count, message.channel_id))
        .embed(starboard_embed(message, style))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_format() {
        let header = star_header("⭐", 4, serenity::ChannelId::new(123));
        assert_eq!(header, "⭐ **4** | <#123>");
    }

    #[test]
    fn image_detection_ignores_query() {
        let url = "https://cdn.discordapp.com/attachments/1/2/cat.PNG?ex=abc&is=def";
        assert!(is_image(strip_query(url)));
        assert!(!is_image(strip_query("https://cdn.discordapp.com/a/b/notes.txt?x=1")));
        assert!(!is_image("https://example.com/noextension"));
    }

    #[test]
    fn long_text_is_cut() {
        let text = "a".repeat(5000);
        let cut = truncate(&text, DESCRIPTION_LIMIT);

        assert_eq!(cut.chars().count(), DESCRIPTION_LIMIT);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate("short", DESCRIPTION_LIMIT), "short");
    }
}
