use dashmap::DashMap;
use std::time::{Duration, Instant};

use poise::serenity_prelude::{ChannelId, Message, Timestamp};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnipeKind {
    Deleted,
    Edited,
}

#[derive(Clone, Debug)]
pub struct SnipedMessage {
    pub content: String,
    pub author_name: String,
    pub author_tag: String,
    pub avatar_url: String,
    pub created_at: Timestamp,
    pub captured_at: Instant,
}

impl SnipedMessage {
    /// `content` is passed separately so edits can store the text from before the edit.
    #[must_use]
    pub fn from_message(message: &Message, content: String) -> Self {
        let display_name = message
            .member
            .as_ref()
            .and_then(|m| m.nick.clone())
            .unwrap_or_else(|| message.author.display_name().to_owned());

        SnipedMessage {
            content,
            author_name: display_name,
            author_tag: message.author.tag(),
            avatar_url: message.author.face(),
            created_at: message.timestamp,
            captured_at: Instant::now(),
        }
    }
}

/// Last deleted and last edited message per channel.
#[derive(Default)]
pub struct SnipeCache {
    deleted: DashMap<ChannelId, SnipedMessage>,
    edited: DashMap<ChannelId, SnipedMessage>,
}

impl SnipeCache {
    fn map(&self, kind: SnipeKind) -> &DashMap<ChannelId, SnipedMessage> {
        match kind {
            SnipeKind::Deleted => &self.deleted,
            SnipeKind::Edited => &self.edited,
        }
    }

    pub fn store(&self, kind: SnipeKind, channel_id: ChannelId, message: SnipedMessage) {
        self.map(kind).insert(channel_id, message);
    }

    /// Returns the stored message if it was captured within `window` of `now`.
    ///
    /// Expired messages are dropped here rather than on a timer.
    pub fn recent(
        &self,
        kind: SnipeKind,
        channel_id: ChannelId,
        window: Duration,
        now: Instant,
    ) -> Option<SnipedMessage> {
        let map = self.map(kind);

        {
            let stored = map.get(&channel_id)?;
            if now.saturating_duration_since(stored.captured_at) <= window {
                return Some(stored.clone());
            }
        }

        map.remove(&channel_id);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sniped(content: &str, captured_at: Instant) -> SnipedMessage {
        SnipedMessage {
            content: content.to_owned(),
            author_name: String::from("Sonic"),
            author_tag: String::from("sonic49"),
            avatar_url: String::from("https://cdn.discordapp.com/embed/avatars/0.png"),
            created_at: Timestamp::now(),
            captured_at,
        }
    }

    #[test]
    fn recent_within_window() {
        let cache = SnipeCache::default();
        let channel = ChannelId::new(1);
        let now = Instant::now();

        cache.store(SnipeKind::Deleted, channel, sniped("hi", now));

        let found = cache.recent(
            SnipeKind::Deleted,
            channel,
            Duration::from_secs(60),
            now + Duration::from_secs(30),
        );
        assert_eq!(found.map(|m| m.content), Some(String::from("hi")));
    }

    #[test]
    fn expired_is_removed() {
        let cache = SnipeCache::default();
        let channel = ChannelId::new(1);
        let now = Instant::now();

        cache.store(SnipeKind::Deleted, channel, sniped("hi", now));

        let later = now + Duration::from_secs(61);
        assert!(cache
            .recent(SnipeKind::Deleted, channel, Duration::from_secs(60), later)
            .is_none());
        // gone for good, even with a wider window.
        assert!(cache
            .recent(SnipeKind::Deleted, channel, Duration::from_secs(3600), later)
            .is_none());
    }

    #[test]
    fn kinds_are_separate() {
        let cache = SnipeCache::default();
        let channel = ChannelId::new(1);
        let now = Instant::now();

        cache.store(SnipeKind::Edited, channel, sniped("before", now));

        assert!(cache
            .recent(SnipeKind::Deleted, channel, Duration::from_secs(60), now)
            .is_none());
        assert!(cache
            .recent(SnipeKind::Edited, channel, Duration::from_secs(60), now)
            .is_some());
    }

    #[test]
    fn newer_overwrites() {
        let cache = SnipeCache::default();
        let channel = ChannelId::new(1);
        let now = Instant::now();

        cache.store(SnipeKind::Deleted, channel, sniped("first", now));
        cache.store(SnipeKind::Deleted, channel, sniped("second", now));

        let found = cache.recent(SnipeKind::Deleted, channel, Duration::from_secs(60), now);
        assert_eq!(found.map(|m| m.content), Some(String::from("second")));
    }
}
