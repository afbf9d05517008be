use poise::serenity_prelude::{self as serenity, UserId};

use crate::structs::{Data, Error};

const CHUNK_LEN: usize = 1950;
const CHUNK_LINES: usize = 20;

/// Splits a string into parts of at most `len` characters.
#[must_use]
pub fn string_split(string: &str, len: usize) -> Vec<String> {
    let chars: Vec<char> = string.chars().collect();
    chars
        .chunks(len.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Formats an error report into code blocks that each fit in a discord message.
#[must_use]
pub fn error_chunks(error: &str, jump_url: Option<&str>) -> Vec<String> {
    let lines: Vec<String> = error
        .lines()
        .flat_map(|line| {
            if line.chars().count() > CHUNK_LEN {
                string_split(line, CHUNK_LEN)
            } else {
                vec![line.to_owned()]
            }
        })
        .collect();

    let mut chunks = Vec::new();
    if let Some(url) = jump_url {
        chunks.push(format!("Error on: {url}"));
    }

    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0;
    for line in &lines {
        let line_len = line.chars().count() + 1;
        if !current.is_empty() && (current.len() == CHUNK_LINES || current_len + line_len > CHUNK_LEN)
        {
            chunks.push(format!("```rs\n{}\n```", current.join("\n")));
            current.clear();
            current_len = 0;
        }
        current.push(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(format!("```rs\n{}\n```", current.join("\n")));
    }

    chunks
}

pub async fn msg_to_owner(
    http: &serenity::Http,
    owner: UserId,
    chunks: &[String],
) -> Result<(), Error> {
    let channel = owner.create_dm_channel(http).await?;
    for chunk in chunks {
        channel.id.say(http, chunk).await?;
    }

    Ok(())
}

impl Data {
    /// Logs an error and forwards it to the bot owner, if one is known.
    pub async fn report_error(&self, http: &serenity::Http, error: &str, jump_url: Option<&str>) {
        tracing::error!("{error}");

        let Some(owner) = self.owner_id else {
            tracing::warn!("No owner to report the error to.");
            return;
        };

        let chunks = error_chunks(error, jump_url);
        if let Err(e) = msg_to_owner(http, owner, &chunks).await {
            tracing::warn!("Failed to send error report to {owner}: {e}");
        }
    }

    /// Sends plain text to the owner, split to fit.
    pub async fn notify_owner(&self, http: &serenity::Http, content: &str) -> Result<(), Error> {
        if let Some(owner) = self.owner_id {
            msg_to_owner(http, owner, &string_split(content, CHUNK_LEN)).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_respects_char_boundaries() {
        let parts = string_split("⭐⭐⭐⭐⭐", 2);
        assert_eq!(parts, vec!["⭐⭐", "⭐⭐", "⭐"]);
        assert!(string_split("", 10).is_empty());
    }

    #[test]
    fn chunks_wrap_in_code_blocks() {
        let chunks = error_chunks("first\nsecond", Some("https://discord.com/channels/1/2/3"));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "Error on: https://discord.com/channels/1/2/3");
        assert_eq!(chunks[1], "```rs\nfirst\nsecond\n```");
    }

    #[test]
    fn chunks_hold_at_most_twenty_lines() {
        let error = (0..45).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let chunks = error_chunks(&error, None);

        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].starts_with("```rs\n0\n"));
        assert!(chunks[2].starts_with("```rs\n40\n"));
    }

    #[test]
    fn chunks_fit_in_a_message() {
        let error = "x".repeat(5000);
        let chunks = error_chunks(&error, None);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 2000));
    }
}
