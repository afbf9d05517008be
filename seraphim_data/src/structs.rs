use parking_lot::RwLock;

use poise::serenity_prelude::{MessageId, UserId};

use std::sync::{
    atomic::{AtomicBool, AtomicUsize},
    Arc,
};

use crate::{database::Database, queue::SetQueue, snipe::SnipeCache};

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Arc<Data>, Error>;
pub type Command = poise::Command<Arc<Data>, Error>;

pub struct Data {
    pub has_started: AtomicBool,
    /// How many `Ready` events have been seen, reconnects included.
    pub readies: AtomicUsize,
    pub database: Database,
    pub time_started: std::time::Instant,
    pub reqwest: reqwest::Client,
    pub config: RwLock<seraphim_config::SeraphimConfig>,
    pub owner_id: Option<UserId>,
    pub snipes: SnipeCache,
    /// Source message ids whose starboard copy needs its count redrawn.
    pub star_refresh: SetQueue<MessageId>,
}

impl Data {
    pub async fn new(owner_id: Option<UserId>) -> Result<Arc<Self>, Error> {
        let db_pool = crate::database::init_data().await?;

        let config = seraphim_config::SeraphimConfig::load_config();
        let owner_id = config.owner_id.or(owner_id);

        Ok(Arc::new(Data {
            has_started: AtomicBool::new(false),
            readies: AtomicUsize::new(0),
            database: Database::new(db_pool),
            time_started: std::time::Instant::now(),
            reqwest: reqwest::Client::new(),
            config: RwLock::new(config),
            owner_id,
            snipes: SnipeCache::default(),
            star_refresh: SetQueue::new(),
        }))
    }
}

/// A failure caused by what the user typed, shown back to them instead of being reported.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct InvalidInput(pub String);

impl InvalidInput {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Shorthand for bailing out of a command with a user-facing message.
pub fn invalid(reason: impl Into<String>) -> Error {
    Box::new(InvalidInput::new(reason))
}
