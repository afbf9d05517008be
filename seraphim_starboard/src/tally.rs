//! Star counting for a single message.
//!
//! An entry goes from untracked, to tracked below the limit, to posted. Stars placed on the
//! bot's copy in the starboard channel count toward the source message, and a user who starred
//! both is only counted once.

use poise::serenity_prelude::{ChannelId, MessageId, UserId};
use seraphim_data::database::{GuildConfig, StarboardEntry};

/// Which message the reaction was placed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Source,
    Mirror,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StarChange {
    Added,
    Removed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing about the entry changed.
    Nothing,
    /// The tally changed but nothing needs to be sent.
    Tracked,
    /// The limit was reached, send the entry to the starboard.
    Post,
    /// The entry is already on the starboard and shows a stale count.
    Refresh,
}

#[must_use]
pub fn side_of(entry: Option<&StarboardEntry>, message_id: MessageId) -> Side {
    match entry {
        Some(entry) if entry.message_id != message_id => Side::Mirror,
        _ => Side::Source,
    }
}

/// Reactions in blacklisted channels never count, and neither do ones on regular messages
/// inside the starboard channel itself.
#[must_use]
pub fn ignored_channel(config: &GuildConfig, channel_id: ChannelId, side: Side) -> bool {
    if config.is_blacklisted(channel_id) {
        return true;
    }

    side == Side::Source && config.starboard_channel == Some(channel_id)
}

/// Applies a star change to `entry` and decides what has to happen next.
///
/// `posting` is whether a send for this entry is already in flight.
pub fn apply(
    entry: &mut StarboardEntry,
    side: Side,
    change: StarChange,
    reactor: UserId,
    limit: u32,
    posting: bool,
) -> Outcome {
    if reactor == entry.author_id {
        return Outcome::Nothing;
    }

    let before = entry.star_count();

    let reactors = match side {
        Side::Source => &mut entry.reactors,
        Side::Mirror => &mut entry.mirror_reactors,
    };

    let changed = match change {
        StarChange::Added => reactors.insert(reactor),
        StarChange::Removed => reactors.remove(&reactor),
    };

    if !changed {
        return Outcome::Nothing;
    }

    let after = entry.star_count();

    if entry.is_posted() {
        return if before == after {
            Outcome::Tracked
        } else {
            Outcome::Refresh
        };
    }

    if change == StarChange::Added && !posting && after >= limit as usize {
        return Outcome::Post;
    }

    Outcome::Tracked
}

#[cfg(test)]
mod tests {
    use super::*;
    use poise::serenity_prelude::GuildId;

    const AUTHOR: UserId = UserId::new(1);
    const SOURCE: MessageId = MessageId::new(100);
    const MIRROR: MessageId = MessageId::new(200);

    fn entry() -> StarboardEntry {
        StarboardEntry::new(SOURCE, GuildId::new(10), ChannelId::new(20), AUTHOR)
    }

    fn posted() -> StarboardEntry {
        let mut entry = entry();
        entry.passed_star_limit = true;
        entry.starboard_channel_id = Some(ChannelId::new(30));
        entry.starboard_message_id = Some(MIRROR);
        entry
    }

    fn add(entry: &mut StarboardEntry, user: u64, limit: u32) -> Outcome {
        apply(
            entry,
            Side::Source,
            StarChange::Added,
            UserId::new(user),
            limit,
            false,
        )
    }

    #[test]
    fn posts_once_at_limit() {
        let mut entry = entry();

        assert_eq!(add(&mut entry, 2, 3), Outcome::Tracked);
        assert_eq!(add(&mut entry, 3, 3), Outcome::Tracked);
        assert_eq!(add(&mut entry, 4, 3), Outcome::Post);
        assert_eq!(entry.star_count(), 3);
    }

    #[test]
    fn repeat_reactions_do_not_count() {
        let mut entry = entry();

        assert_eq!(add(&mut entry, 2, 2), Outcome::Tracked);
        assert_eq!(add(&mut entry, 2, 2), Outcome::Nothing);
        assert_eq!(entry.star_count(), 1);
    }

    #[test]
    fn self_stars_are_ignored() {
        let mut entry = entry();

        assert_eq!(add(&mut entry, 1, 1), Outcome::Nothing);
        assert_eq!(entry.star_count(), 0);
    }

    #[test]
    fn no_double_post_while_posting() {
        let mut entry = entry();
        add(&mut entry, 2, 2);

        let outcome = apply(
            &mut entry,
            Side::Source,
            StarChange::Added,
            UserId::new(3),
            2,
            true,
        );
        assert_eq!(outcome, Outcome::Tracked);
    }

    #[test]
    fn posted_entries_refresh() {
        let mut entry = posted();
        entry.reactors.extend([UserId::new(2), UserId::new(3)]);

        assert_eq!(add(&mut entry, 4, 3), Outcome::Refresh);

        let removed = apply(
            &mut entry,
            Side::Source,
            StarChange::Removed,
            UserId::new(2),
            3,
            false,
        );
        assert_eq!(removed, Outcome::Refresh);
        assert_eq!(entry.star_count(), 2);
        // never taken back off the board.
        assert!(entry.is_posted());
    }

    #[test]
    fn removal_below_limit_only_tracks() {
        let mut entry = entry();
        add(&mut entry, 2, 5);

        let outcome = apply(
            &mut entry,
            Side::Source,
            StarChange::Removed,
            UserId::new(2),
            5,
            false,
        );
        assert_eq!(outcome, Outcome::Tracked);
        assert_eq!(entry.star_count(), 0);

        let missing = apply(
            &mut entry,
            Side::Source,
            StarChange::Removed,
            UserId::new(9),
            5,
            false,
        );
        assert_eq!(missing, Outcome::Nothing);
    }

    #[test]
    fn mirror_stars_union_with_source() {
        let mut entry = posted();
        entry.reactors.insert(UserId::new(2));

        // already counted through the source message.
        let same_user = apply(
            &mut entry,
            Side::Mirror,
            StarChange::Added,
            UserId::new(2),
            1,
            false,
        );
        assert_eq!(same_user, Outcome::Tracked);
        assert_eq!(entry.star_count(), 1);

        let new_user = apply(
            &mut entry,
            Side::Mirror,
            StarChange::Added,
            UserId::new(3),
            1,
            false,
        );
        assert_eq!(new_user, Outcome::Refresh);
        assert_eq!(entry.star_count(), 2);

        // removing the source star keeps the mirror one.
        let removed = apply(
            &mut entry,
            Side::Source,
            StarChange::Removed,
            UserId::new(2),
            1,
            false,
        );
        assert_eq!(removed, Outcome::Tracked);
        assert_eq!(entry.star_count(), 2);
    }

    #[test]
    fn author_cannot_star_the_copy() {
        let mut entry = posted();
        let outcome = apply(&mut entry, Side::Mirror, StarChange::Added, AUTHOR, 1, false);
        assert_eq!(outcome, Outcome::Nothing);
    }

    #[test]
    fn side_detection() {
        let entry = posted();
        assert_eq!(side_of(Some(&entry), SOURCE), Side::Source);
        assert_eq!(side_of(Some(&entry), MIRROR), Side::Mirror);
        assert_eq!(side_of(None, SOURCE), Side::Source);
    }

    #[test]
    fn channel_filtering() {
        let mut config = GuildConfig::new(GuildId::new(10));
        let starboard = ChannelId::new(30);
        let general = ChannelId::new(20);
        let memes = ChannelId::new(21);

        config.starboard_channel = Some(starboard);
        config.star_blacklist.insert(memes);

        assert!(!ignored_channel(&config, general, Side::Source));
        assert!(ignored_channel(&config, memes, Side::Source));
        assert!(ignored_channel(&config, starboard, Side::Source));
        assert!(!ignored_channel(&config, starboard, Side::Mirror));
    }
}
