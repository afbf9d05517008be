use crate::{Data, Error};
use poise::serenity_prelude::{self as serenity, ActivityData, OnlineStatus, Ready};

use std::sync::atomic::Ordering;
use std::sync::Arc;

use seraphim_starboard::spawn_refresh_worker;

pub async fn ready(ctx: &serenity::Context, ready: &Ready, data: &Arc<Data>) -> Result<(), Error> {
    if !data.has_started.swap(true, Ordering::SeqCst) {
        finalize_start(ctx.clone(), data);
    }

    let time = chrono::Utc::now().format("%x %X UTC");
    let connect_msg = if data.readies.fetch_add(1, Ordering::SeqCst) == 0 {
        tracing::info!("Logged in as {}", ready.user.tag());
        format!("Logged in at `{time}`!")
    } else {
        tracing::info!("Reconnected as {}", ready.user.tag());
        format!("Reconnected at `{time}`!")
    };

    ctx.set_presence(
        Some(ActivityData::watching("for stars!")),
        OnlineStatus::Online,
    );

    if let Err(e) = data.notify_owner(&ctx.http, &connect_msg).await {
        tracing::warn!("Could not tell the owner about the connection: {e}");
    }

    Ok(())
}

fn finalize_start(ctx: serenity::Context, data: &Arc<Data>) {
    spawn_refresh_worker(ctx, data.clone());
}
