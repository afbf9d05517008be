use std::sync::Arc;

use seraphim_data::{Data, Error, InvalidInput};

const INTERNAL_ERROR: &str = "An internal error has occured. The bot owner has been notified.";

fn jump_url(ctx: seraphim_data::Context<'_>) -> Option<String> {
    match ctx {
        poise::Context::Prefix(prefix) => Some(prefix.msg.link()),
        poise::Context::Application(_) => None,
    }
}

/// Invalid input is shown as is, anything else is reported to the owner.
fn user_message(error: &Error) -> Option<String> {
    error
        .downcast_ref::<InvalidInput>()
        .map(ToString::to_string)
}

/// Replies to the invoker, reporting the error first when it wasn't their fault.
async fn respond(ctx: seraphim_data::Context<'_>, error: &Error, context: &str) {
    if let Some(message) = user_message(error) {
        let _ = ctx.say(message).await;
        return;
    }

    let report = format!(
        "{context} `{}`: {error:?}",
        ctx.command().qualified_name
    );
    ctx.data()
        .report_error(ctx.http(), &report, jump_url(ctx).as_deref())
        .await;

    let _ = ctx.say(INTERNAL_ERROR).await;
}

pub async fn handler(error: poise::FrameworkError<'_, Arc<Data>, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            respond(ctx, &error, "Error in command").await;
        }
        poise::FrameworkError::CommandCheckFailed {
            error: Some(error),
            ctx,
            ..
        } => {
            respond(ctx, &error, "Check failed for").await;
        }
        poise::FrameworkError::EventHandler {
            error,
            ctx,
            event,
            framework,
            ..
        } => {
            let report = format!(
                "Error in event handler for {}: {error:?}",
                event.snake_case_name()
            );
            framework
                .user_data
                .report_error(&ctx.http, &report, None)
                .await;
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                tracing::error!("Error while handling error: {e}");
            }
        }
    }
}
