//! Asks the invoker a series of questions by editing a single embed.

use std::time::Duration;

use poise::serenity_prelude as serenity;

use crate::{Context, Error};

const FOOTER: &str = "If you wish to stop this setup at any time, just type in 'exit'.";

pub struct Wizard<'a> {
    ctx: Context<'a>,
    title: String,
    colour: u32,
    timeout: Duration,
    handle: Option<poise::ReplyHandle<'a>>,
}

impl<'a> Wizard<'a> {
    pub fn new(ctx: Context<'a>, title: impl Into<String>, timeout: Duration) -> Self {
        let colour = ctx.data().config.read().embed_colour;

        Wizard {
            ctx,
            title: title.into(),
            colour,
            timeout,
            handle: None,
        }
    }

    fn embed(&self, description: &str, footer: bool) -> serenity::CreateEmbed {
        let bot = self.ctx.cache().current_user().clone();

        let mut embed = serenity::CreateEmbed::new()
            .title(&self.title)
            .colour(self.colour)
            .author(serenity::CreateEmbedAuthor::new(&bot.name).icon_url(bot.face()))
            .description(description);

        if footer {
            embed = embed.footer(serenity::CreateEmbedFooter::new(FOOTER));
        }

        embed
    }

    async fn show(&mut self, description: &str, footer: bool) -> Result<(), Error> {
        let reply = poise::CreateReply::default().embed(self.embed(description, footer));

        if let Some(handle) = &self.handle {
            handle.edit(self.ctx, reply).await?;
            return Ok(());
        }

        self.handle = Some(self.ctx.send(reply.reply(true)).await?);
        Ok(())
    }

    /// Shows `question` and waits for the invoker's next message in this channel.
    ///
    /// Returns `None` once the wizard has been closed because of a timeout or an "exit".
    pub async fn ask(&mut self, question: &str) -> Result<Option<serenity::Message>, Error> {
        self.show(question, true).await?;

        let reply = serenity::MessageCollector::new(self.ctx.serenity_context())
            .author_id(self.ctx.author().id)
            .channel_id(self.ctx.channel_id())
            .timeout(self.timeout)
            .await;

        let Some(reply) = reply else {
            self.show("Failed to reply. Exiting...", false).await?;
            return Ok(None);
        };

        if reply.content.trim().eq_ignore_ascii_case("exit") {
            self.show("Exiting...", false).await?;
            return Ok(None);
        }

        Ok(Some(reply))
    }

    /// Closes the wizard after an answer could not be used.
    pub async fn invalid(&mut self, error: impl std::fmt::Display) -> Result<(), Error> {
        self.show(&format!("Invalid input. Exiting...\n\nError: {error}"), false)
            .await
    }

    pub async fn finish(&mut self, text: &str) -> Result<(), Error> {
        self.show(text, false).await
    }
}
