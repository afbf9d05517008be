use std::time::Duration;

use serde::{Deserialize, Serialize};

use poise::serenity_prelude::UserId;

pub mod duration;
mod serialize;
use serialize::duration_str;

pub use duration::{parse_duration, DurationParseError};

const CONFIG_PATH: &str = "config/config.json";

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SeraphimConfig {
    /// Prefix that works everywhere, on top of mentions and per-guild prefixes.
    pub prefix: String,
    /// Overrides the application owner as the recipient of error reports.
    pub owner_id: Option<UserId>,
    pub log_file: Option<String>,
    #[serde(with = "duration_str")]
    pub snipe_window: Duration,
    #[serde(with = "duration_str")]
    pub say_wizard_timeout: Duration,
    pub image_size_limit: u64,
    pub embed_colour: u32,
    pub star_emoji: String,
}

impl SeraphimConfig {
    pub fn new() -> Self {
        SeraphimConfig {
            prefix: String::from("s!"),
            owner_id: None,
            log_file: None,
            snipe_window: Duration::from_secs(60),
            say_wizard_timeout: Duration::from_secs(600),
            // 8 MiB
            image_size_limit: 8_388_608,
            embed_colour: 0x4378FC,
            star_emoji: String::from("⭐"),
        }
    }

    pub fn load_config() -> Self {
        match std::fs::read_to_string(CONFIG_PATH) {
            Ok(config_file) => Self::from_json(&config_file),
            Err(e) => {
                tracing::warn!("Failed to read {CONFIG_PATH} ({e}). Using default configuration.");
                Self::default()
            }
        }
    }

    fn from_json(raw: &str) -> Self {
        match serde_json::from_str::<SeraphimConfig>(raw) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    "Failed to parse {CONFIG_PATH}. Using default configuration. Parse error \
                     details: {err}"
                );
                Self::default()
            }
        }
    }
}

impl Default for SeraphimConfig {
    fn default() -> Self {
        Self::new()
    }
}
