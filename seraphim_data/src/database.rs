use dashmap::DashMap;
use parking_lot::Mutex;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{
    collections::{HashMap, HashSet},
    env,
};

use poise::serenity_prelude::{ChannelId, GuildId, MessageId, UserId};

use crate::structs::Error;

pub async fn init_data() -> Result<PgPool, Error> {
    let database_url =
        env::var("DATABASE_URL").map_err(|_| "No database url found in environment variables!")?;

    let database = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    sqlx::migrate!("../migrations").run(&database).await?;

    Ok(database)
}

// Discord snowflakes fit in 63 bits, postgres has no unsigned integers.
#[allow(clippy::cast_sign_loss)]
fn snowflake(raw: i64) -> u64 {
    raw as u64
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuildConfig {
    pub guild_id: GuildId,
    pub starboard_channel: Option<ChannelId>,
    pub star_limit: Option<u32>,
    pub star_toggle: bool,
    pub star_blacklist: HashSet<ChannelId>,
    pub prefixes: Vec<String>,
    pub disabled_commands: HashMap<UserId, HashSet<String>>,
}

impl GuildConfig {
    #[must_use]
    pub fn new(guild_id: GuildId) -> Self {
        GuildConfig {
            guild_id,
            starboard_channel: None,
            star_limit: None,
            star_toggle: false,
            star_blacklist: HashSet::new(),
            prefixes: Vec::new(),
            disabled_commands: HashMap::new(),
        }
    }

    /// The starboard can only be switched on once it knows where to post and when.
    #[must_use]
    pub fn can_enable_starboard(&self) -> bool {
        self.starboard_channel.is_some() && self.star_limit.is_some()
    }

    /// Channel and limit, if the starboard is switched on and fully configured.
    #[must_use]
    pub fn active_starboard(&self) -> Option<(ChannelId, u32)> {
        if !self.star_toggle {
            return None;
        }

        Some((self.starboard_channel?, self.star_limit?))
    }

    #[must_use]
    pub fn is_blacklisted(&self, channel_id: ChannelId) -> bool {
        self.star_blacklist.contains(&channel_id)
    }

    #[must_use]
    pub fn is_disabled_for(&self, user_id: UserId, command: &str) -> bool {
        self.disabled_commands
            .get(&user_id)
            .is_some_and(|commands| commands.contains(command))
    }
}

#[derive(sqlx::FromRow)]
struct GuildConfigRow {
    guild_id: i64,
    starboard_id: Option<i64>,
    star_limit: Option<i32>,
    star_toggle: bool,
    star_blacklist: Vec<i64>,
    prefixes: Vec<String>,
}

impl GuildConfigRow {
    fn into_config(self) -> GuildConfig {
        GuildConfig {
            guild_id: GuildId::new(snowflake(self.guild_id)),
            starboard_channel: self.starboard_id.map(|id| ChannelId::new(snowflake(id))),
            star_limit: self.star_limit.and_then(|limit| u32::try_from(limit).ok()),
            star_toggle: self.star_toggle,
            star_blacklist: self
                .star_blacklist
                .into_iter()
                .map(|id| ChannelId::new(snowflake(id)))
                .collect(),
            prefixes: self.prefixes,
            disabled_commands: HashMap::new(),
        }
    }
}

/// A message that has been starred at least once, or forced onto the starboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StarboardEntry {
    pub message_id: MessageId,
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    /// Users who starred the source message.
    pub reactors: HashSet<UserId>,
    /// Users who starred the bot's copy in the starboard channel.
    pub mirror_reactors: HashSet<UserId>,
    pub passed_star_limit: bool,
    pub forced: bool,
    pub starboard_channel_id: Option<ChannelId>,
    pub starboard_message_id: Option<MessageId>,
}

impl StarboardEntry {
    #[must_use]
    pub fn new(
        message_id: MessageId,
        guild_id: GuildId,
        channel_id: ChannelId,
        author_id: UserId,
    ) -> Self {
        StarboardEntry {
            message_id,
            guild_id,
            channel_id,
            author_id,
            reactors: HashSet::new(),
            mirror_reactors: HashSet::new(),
            passed_star_limit: false,
            forced: false,
            starboard_channel_id: None,
            starboard_message_id: None,
        }
    }

    /// Unique users across the source message and its copy.
    #[must_use]
    pub fn star_count(&self) -> usize {
        self.reactors.union(&self.mirror_reactors).count()
    }

    #[must_use]
    pub fn is_posted(&self) -> bool {
        self.starboard_message_id.is_some()
    }
}

#[derive(sqlx::FromRow)]
struct StarboardRow {
    message_id: i64,
    guild_id: i64,
    channel_id: i64,
    author_id: i64,
    reactors: Vec<i64>,
    mirror_reactors: Vec<i64>,
    passed_star_limit: bool,
    forced: bool,
    starboard_channel_id: Option<i64>,
    starboard_message_id: Option<i64>,
}

impl StarboardRow {
    fn into_entry(self) -> StarboardEntry {
        let users = |ids: Vec<i64>| {
            ids.into_iter()
                .map(|id| UserId::new(snowflake(id)))
                .collect::<HashSet<_>>()
        };

        StarboardEntry {
            message_id: MessageId::new(snowflake(self.message_id)),
            guild_id: GuildId::new(snowflake(self.guild_id)),
            channel_id: ChannelId::new(snowflake(self.channel_id)),
            author_id: UserId::new(snowflake(self.author_id)),
            reactors: users(self.reactors),
            mirror_reactors: users(self.mirror_reactors),
            passed_star_limit: self.passed_star_limit,
            forced: self.forced,
            starboard_channel_id: self
                .starboard_channel_id
                .map(|id| ChannelId::new(snowflake(id))),
            starboard_message_id: self
                .starboard_message_id
                .map(|id| MessageId::new(snowflake(id))),
        }
    }
}

/// In-memory view of the starboard table.
#[derive(Default, Debug)]
pub struct StarboardCache {
    entries: HashMap<MessageId, StarboardEntry>,
    /// Starboard copy id -> source message id.
    mirrors: HashMap<MessageId, MessageId>,
    /// Source messages currently being sent to the starboard.
    posting: HashSet<MessageId>,
}

impl StarboardCache {
    /// Resolves a starboard copy to its source message, anything else maps to itself.
    #[must_use]
    pub fn origin_of(&self, message_id: MessageId) -> MessageId {
        self.mirrors.get(&message_id).copied().unwrap_or(message_id)
    }

    #[must_use]
    pub fn get(&self, message_id: MessageId) -> Option<&StarboardEntry> {
        self.entries.get(&self.origin_of(message_id))
    }

    pub fn get_mut(&mut self, message_id: MessageId) -> Option<&mut StarboardEntry> {
        let origin = self.origin_of(message_id);
        self.entries.get_mut(&origin)
    }

    /// Caches `entry` unless its message is already cached, returning whichever is kept.
    pub fn insert_if_absent(&mut self, entry: StarboardEntry) -> &mut StarboardEntry {
        if let Some(mirror) = entry.starboard_message_id {
            self.mirrors.insert(mirror, entry.message_id);
        }

        self.entries.entry(entry.message_id).or_insert(entry)
    }

    pub fn set_mirror(&mut self, origin: MessageId, channel_id: ChannelId, mirror: MessageId) {
        if let Some(entry) = self.entries.get_mut(&origin) {
            entry.starboard_channel_id = Some(channel_id);
            entry.starboard_message_id = Some(mirror);
            entry.passed_star_limit = true;
        }
        self.mirrors.insert(mirror, origin);
    }

    /// Returns false if the message is already being posted.
    pub fn begin_posting(&mut self, origin: MessageId) -> bool {
        self.posting.insert(origin)
    }

    pub fn finish_posting(&mut self, origin: MessageId) {
        self.posting.remove(&origin);
    }

    #[must_use]
    pub fn is_posting(&self, origin: MessageId) -> bool {
        self.posting.contains(&origin)
    }

    /// Marks `entry` as forced and takes its posting marker.
    ///
    /// Returns `None` when the message is already on the starboard or on its way there.
    pub fn begin_forced_post(&mut self, entry: StarboardEntry) -> Option<StarboardEntry> {
        let origin = entry.message_id;
        if self.posting.contains(&origin) {
            return None;
        }

        let cached = self.insert_if_absent(entry);
        if cached.is_posted() {
            return None;
        }

        cached.forced = true;
        let cached = cached.clone();
        self.posting.insert(origin);

        Some(cached)
    }

    /// Releases the posting marker, recording where the copy went if it was sent.
    ///
    /// Returns the entry as it is now, stars added during the send included.
    pub fn finish_post(
        &mut self,
        origin: MessageId,
        copy: Option<(ChannelId, MessageId)>,
    ) -> Option<StarboardEntry> {
        self.finish_posting(origin);
        if let Some((channel_id, mirror)) = copy {
            self.set_mirror(origin, channel_id, mirror);
        }

        self.entries.get(&origin).cloned()
    }
}

pub struct Database {
    pub db: PgPool,
    guilds: DashMap<GuildId, GuildConfig>,
    pub starboard: Mutex<StarboardCache>,
}

impl Database {
    #[must_use]
    pub fn new(db: PgPool) -> Self {
        Database {
            db,
            guilds: DashMap::new(),
            starboard: Mutex::new(StarboardCache::default()),
        }
    }

    /// Inserts the default row for a guild if it doesn't have one yet.
    pub async fn create_guild_config(&self, guild_id: GuildId) -> Result<(), Error> {
        sqlx::query("INSERT INTO guild_config (guild_id) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(i64::from(guild_id))
            .execute(&self.db)
            .await?;

        Ok(())
    }

    pub async fn get_guild_config(&self, guild_id: GuildId) -> Result<GuildConfig, Error> {
        let cached = self.guilds.get(&guild_id).map(|c| c.clone());
        if let Some(config) = cached {
            return Ok(config);
        }

        let row = sqlx::query_as::<_, GuildConfigRow>(
            "SELECT guild_id, starboard_id, star_limit, star_toggle, star_blacklist, prefixes FROM \
             guild_config WHERE guild_id = $1",
        )
        .bind(i64::from(guild_id))
        .fetch_optional(&self.db)
        .await?;

        let mut config = if let Some(row) = row {
            row.into_config()
        } else {
            self.create_guild_config(guild_id).await?;
            GuildConfig::new(guild_id)
        };

        let disables: Vec<(i64, String)> = sqlx::query_as(
            "SELECT user_id, command FROM user_command_disables WHERE guild_id = $1",
        )
        .bind(i64::from(guild_id))
        .fetch_all(&self.db)
        .await?;

        for (user_id, command) in disables {
            config
                .disabled_commands
                .entry(UserId::new(snowflake(user_id)))
                .or_default()
                .insert(command);
        }

        self.guilds.insert(guild_id, config.clone());
        Ok(config)
    }

    /// Writes every column of `config` except the per-user disables.
    pub async fn update_guild_config(&self, config: &GuildConfig) -> Result<(), Error> {
        let blacklist: Vec<i64> = config.star_blacklist.iter().map(|c| i64::from(*c)).collect();

        sqlx::query(
            "INSERT INTO guild_config (guild_id, starboard_id, star_limit, star_toggle, \
             star_blacklist, prefixes) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (guild_id) DO UPDATE
            SET starboard_id = $2, star_limit = $3, star_toggle = $4, star_blacklist = $5, \
             prefixes = $6",
        )
        .bind(i64::from(config.guild_id))
        .bind(config.starboard_channel.map(i64::from))
        .bind(
            config
                .star_limit
                .map(|limit| i32::try_from(limit).unwrap_or(i32::MAX)),
        )
        .bind(config.star_toggle)
        .bind(blacklist)
        .bind(config.prefixes.clone())
        .execute(&self.db)
        .await?;

        self.guilds.insert(config.guild_id, config.clone());
        Ok(())
    }

    /// Returns whether anything changed.
    pub async fn set_command_disabled(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        command: &str,
        disabled: bool,
    ) -> Result<bool, Error> {
        // makes sure the guild row exists and is cached.
        self.get_guild_config(guild_id).await?;

        let query = if disabled {
            sqlx::query(
                "INSERT INTO user_command_disables (guild_id, user_id, command) VALUES ($1, $2, \
                 $3) ON CONFLICT DO NOTHING",
            )
        } else {
            sqlx::query(
                "DELETE FROM user_command_disables WHERE guild_id = $1 AND user_id = $2 AND \
                 command = $3",
            )
        };

        let result = query
            .bind(i64::from(guild_id))
            .bind(i64::from(user_id))
            .bind(command)
            .execute(&self.db)
            .await?;

        if let Some(mut config) = self.guilds.get_mut(&guild_id) {
            let commands = config.disabled_commands.entry(user_id).or_default();
            if disabled {
                commands.insert(command.to_owned());
            } else {
                commands.remove(command);
            }
        }

        Ok(result.rows_affected() > 0)
    }

    pub fn remove_guild_cache(&self, guild_id: GuildId) {
        self.guilds.remove(&guild_id);
    }

    /// Finds an entry by its source message id or by its starboard copy's id.
    pub async fn get_starboard_entry(
        &self,
        message_id: MessageId,
    ) -> Result<Option<StarboardEntry>, Error> {
        let cached = self.starboard.lock().get(message_id).cloned();
        if cached.is_some() {
            return Ok(cached);
        }

        let row = sqlx::query_as::<_, StarboardRow>(
            "SELECT message_id, guild_id, channel_id, author_id, reactors, mirror_reactors, \
             passed_star_limit, forced, starboard_channel_id, starboard_message_id FROM starboard \
             WHERE message_id = $1 OR starboard_message_id = $1",
        )
        .bind(i64::from(message_id))
        .fetch_optional(&self.db)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        // another event may have cached it while we were waiting, theirs wins.
        let entry = self.starboard.lock().insert_if_absent(row.into_entry()).clone();
        Ok(Some(entry))
    }

    pub async fn save_starboard_entry(&self, entry: &StarboardEntry) -> Result<(), Error> {
        let reactors: Vec<i64> = entry.reactors.iter().map(|u| i64::from(*u)).collect();
        let mirror_reactors: Vec<i64> =
            entry.mirror_reactors.iter().map(|u| i64::from(*u)).collect();

        sqlx::query(
            "INSERT INTO starboard (message_id, guild_id, channel_id, author_id, reactors, \
             mirror_reactors, passed_star_limit, forced, starboard_channel_id, \
             starboard_message_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (message_id) DO UPDATE
            SET reactors = $5, mirror_reactors = $6, passed_star_limit = $7, forced = $8, \
             starboard_channel_id = $9, starboard_message_id = $10",
        )
        .bind(i64::from(entry.message_id))
        .bind(i64::from(entry.guild_id))
        .bind(i64::from(entry.channel_id))
        .bind(i64::from(entry.author_id))
        .bind(reactors)
        .bind(mirror_reactors)
        .bind(entry.passed_star_limit)
        .bind(entry.forced)
        .bind(entry.starboard_channel_id.map(i64::from))
        .bind(entry.starboard_message_id.map(i64::from))
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(message: u64) -> StarboardEntry {
        StarboardEntry::new(
            MessageId::new(message),
            GuildId::new(1),
            ChannelId::new(2),
            UserId::new(3),
        )
    }

    #[test]
    fn starboard_needs_channel_and_limit() {
        let mut config = GuildConfig::new(GuildId::new(1));
        assert!(!config.can_enable_starboard());

        config.starboard_channel = Some(ChannelId::new(10));
        assert!(!config.can_enable_starboard());

        config.star_limit = Some(3);
        assert!(config.can_enable_starboard());
        assert_eq!(config.active_starboard(), None);

        config.star_toggle = true;
        assert_eq!(config.active_starboard(), Some((ChannelId::new(10), 3)));
    }

    #[test]
    fn disabled_commands_are_per_user() {
        let mut config = GuildConfig::new(GuildId::new(1));
        config
            .disabled_commands
            .entry(UserId::new(5))
            .or_default()
            .insert(String::from("snipe"));

        assert!(config.is_disabled_for(UserId::new(5), "snipe"));
        assert!(!config.is_disabled_for(UserId::new(5), "editsnipe"));
        assert!(!config.is_disabled_for(UserId::new(6), "snipe"));
    }

    #[test]
    fn star_count_is_unique_across_copy() {
        let mut entry = entry(100);
        entry.reactors.extend([UserId::new(7), UserId::new(8)]);
        entry.mirror_reactors.extend([UserId::new(8), UserId::new(9)]);

        assert_eq!(entry.star_count(), 3);
    }

    #[test]
    fn forcing_takes_the_posting_marker() {
        let mut cache = StarboardCache::default();

        let forced = cache.begin_forced_post(entry(100)).unwrap();
        assert!(forced.forced);
        assert!(cache.is_posting(MessageId::new(100)));
        assert!(cache.get(MessageId::new(100)).unwrap().forced);

        // a second force while the first is still sending.
        assert_eq!(cache.begin_forced_post(entry(100)), None);
    }

    #[test]
    fn forcing_a_posted_entry_does_nothing() {
        let mut cache = StarboardCache::default();
        cache.insert_if_absent(entry(100));
        cache.set_mirror(MessageId::new(100), ChannelId::new(50), MessageId::new(200));

        assert_eq!(cache.begin_forced_post(entry(100)), None);
        assert!(!cache.is_posting(MessageId::new(100)));
        assert!(!cache.get(MessageId::new(100)).unwrap().forced);
    }

    #[test]
    fn forcing_waits_for_a_threshold_post() {
        let mut cache = StarboardCache::default();
        cache.insert_if_absent(entry(100));
        assert!(cache.begin_posting(MessageId::new(100)));

        assert_eq!(cache.begin_forced_post(entry(100)), None);
    }

    #[test]
    fn finishing_a_post_sees_stars_added_meanwhile() {
        let mut cache = StarboardCache::default();
        let sent = cache.begin_forced_post(entry(100)).unwrap();

        cache
            .get_mut(MessageId::new(100))
            .unwrap()
            .reactors
            .insert(UserId::new(9));

        let current = cache
            .finish_post(
                MessageId::new(100),
                Some((ChannelId::new(50), MessageId::new(200))),
            )
            .unwrap();

        assert!(!cache.is_posting(MessageId::new(100)));
        assert_eq!(current.starboard_message_id, Some(MessageId::new(200)));
        assert_ne!(current.star_count(), sent.star_count());
        assert_eq!(cache.origin_of(MessageId::new(200)), MessageId::new(100));
    }

    #[test]
    fn failed_sends_release_the_marker() {
        let mut cache = StarboardCache::default();
        cache.begin_forced_post(entry(100)).unwrap();

        let current = cache.finish_post(MessageId::new(100), None).unwrap();

        assert!(!current.is_posted());
        assert!(!cache.is_posting(MessageId::new(100)));
        assert!(cache.begin_forced_post(entry(100)).is_some());
    }

    #[test]
    fn cache_resolves_mirror_ids() {
        let mut cache = StarboardCache::default();
        cache.insert_if_absent(entry(100));
        cache.set_mirror(MessageId::new(100), ChannelId::new(50), MessageId::new(200));

        assert_eq!(cache.origin_of(MessageId::new(200)), MessageId::new(100));
        let cached = cache.get(MessageId::new(200)).unwrap();
        assert_eq!(cached.message_id, MessageId::new(100));
        assert!(cached.passed_star_limit);
        assert!(cached.is_posted());
    }

    #[test]
    fn cache_keeps_first_insert() {
        let mut cache = StarboardCache::default();
        let mut first = entry(100);
        first.reactors.insert(UserId::new(7));
        cache.insert_if_absent(first);

        let kept = cache.insert_if_absent(entry(100));
        assert_eq!(kept.reactors.len(), 1);
    }

    #[test]
    fn posting_marker_is_exclusive() {
        let mut cache = StarboardCache::default();
        let origin = MessageId::new(100);

        assert!(cache.begin_posting(origin));
        assert!(!cache.begin_posting(origin));
        assert!(cache.is_posting(origin));

        cache.finish_posting(origin);
        assert!(!cache.is_posting(origin));
    }
}
