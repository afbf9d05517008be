#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod error;

use poise::serenity_prelude as serenity;
use std::{env::var, sync::Arc, time::Duration};

use seraphim_config::SeraphimConfig;
use seraphim_data::{Data, Error};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging(log_file: Option<&str>) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,serenity=warn"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let appender = tracing_appender::rolling::never(".", path);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// Matches the longest of the guild's own prefixes, if any.
async fn guild_prefix<'a>(
    _ctx: &'a serenity::Context,
    msg: &'a serenity::Message,
    data: &'a Arc<Data>,
) -> Result<Option<(&'a str, &'a str)>, Error> {
    let Some(guild_id) = msg.guild_id else {
        return Ok(None);
    };

    let config = data.database.get_guild_config(guild_id).await?;
    let matched = config
        .prefixes
        .iter()
        .filter(|prefix| msg.content.starts_with(prefix.as_str()))
        .map(String::len)
        .max();

    Ok(matched.map(|len| msg.content.split_at(len)))
}

async fn owner_of(http: &serenity::Http) -> Option<serenity::UserId> {
    match http.get_current_application_info().await {
        Ok(info) => info.owner.map(|owner| owner.id),
        Err(e) => {
            tracing::warn!("Could not fetch the application owner: {e}");
            None
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = SeraphimConfig::load_config();
    let _guard = init_logging(config.log_file.as_deref());

    let options = poise::FrameworkOptions {
        commands: seraphim_commands::commands(),
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: Some(config.prefix.clone()),
            mention_as_prefix: true,
            stripped_dynamic_prefix: Some(|ctx, msg, data| Box::pin(guild_prefix(ctx, msg, data))),
            edit_tracker: Some(std::sync::Arc::new(poise::EditTracker::for_timespan(Duration::from_secs(600)))),
            ..Default::default()
        },
        command_check: Some(|ctx| {
            Box::pin(seraphim_commands::utils::checks::command_check(ctx))
        }),
        on_error: |error| Box::pin(error::handler(error)),
        pre_command: |ctx| {
            Box::pin(async move {
                tracing::info!(
                    "{} ran `{}`",
                    ctx.author().tag(),
                    ctx.command().qualified_name
                );
            })
        },
        event_handler: |ctx, event, framework, data| {
            Box::pin(seraphim_events::event_handler(ctx, event, framework, data))
        },
        owners: config.owner_id.into_iter().collect(),
        skip_checks_for_owners: false,
        ..Default::default()
    };

    let framework = poise::Framework::builder()
        .options(options)
        .setup(|ctx, _ready, _framework| {
            Box::pin(async move {
                let owner = owner_of(&ctx.http).await;
                Data::new(owner).await
            })
        })
        .build();

    let token = var("SERAPHIM_TOKEN").expect("Missing `SERAPHIM_TOKEN` env var.");
    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let mut cache_settings = serenity::cache::Settings::default();
    cache_settings.max_messages = 500;

    let client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .cache_settings(cache_settings)
        .await;

    match client {
        Ok(mut client) => {
            if let Err(e) = client.start().await {
                tracing::error!("Client stopped: {e}");
            }
        }
        Err(e) => tracing::error!("Failed to build the client: {e}"),
    }
}
