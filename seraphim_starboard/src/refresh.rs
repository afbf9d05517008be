use crate::{
    message::{star_header, Style},
    Data, Error,
};
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Redraws starboard copies whose count changed, one edit per queued message.
pub fn spawn_refresh_worker(ctx: serenity::Context, data: Arc<Data>) {
    tokio::spawn(async move {
        loop {
            let origin = data.star_refresh.get().await;
            // anything that changes from here on queues another edit.
            data.star_refresh.remove_from_copy(&origin);

            if let Err(e) = refresh_entry(&ctx, &data, origin).await {
                tracing::warn!("Failed to refresh starboard entry for {origin}: {e}");
            }
        }
    });
}

async fn refresh_entry(
    ctx: &serenity::Context,
    data: &Data,
    origin: serenity::MessageId,
) -> Result<(), Error> {
    let Some(entry) = data.database.get_starboard_entry(origin).await? else {
        return Ok(());
    };

    let (Some(channel_id), Some(mirror_id)) =
        (entry.starboard_channel_id, entry.starboard_message_id)
    else {
        return Ok(());
    };

    let style = Style::from_data(data);
    let content = star_header(&style.emoji, entry.star_count(), entry.channel_id);

    channel_id
        .edit_message(ctx, mirror_id, serenity::EditMessage::new().content(content))
        .await?;

    Ok(())
}
