//! Just a bunch of easter eggs, hidden from help.

use crate::{Context, Error};

/// So there's a song called Seraphim... yeah...
#[poise::command(
    prefix_command,
    aliases("theme_song", "theme-song"),
    hide_in_help,
    category = "Easter Egg"
)]
pub async fn themesong(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say("https://www.youtube.com/watch?v=4wWYVzwtHGg").await?;
    Ok(())
}

#[poise::command(prefix_command, hide_in_help, category = "Easter Egg")]
pub async fn sonic(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say("...ok I guess...").await?;
    Ok(())
}

#[poise::command(prefix_command, hide_in_help, category = "Easter Egg")]
pub async fn sonic49(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say("Yes, that's my owner, thanks very much for using this pointless command.")
        .await?;
    Ok(())
}

// Tomato soup, plant-based, CC BY 2.0 on Wikimedia Commons.
#[poise::command(prefix_command, hide_in_help, category = "Easter Egg")]
pub async fn soup(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say(
        "https://upload.wikimedia.org/wikipedia/commons/thumb/8/8c/\
         Tomato_soup%2C_plant-based_%2844040252791%29.jpg/\
         1280px-Tomato_soup%2C_plant-based_%2844040252791%29.jpg",
    )
    .await?;
    Ok(())
}

#[must_use]
pub fn commands() -> [crate::Command; 4] {
    [themesong(), sonic(), sonic49(), soup()]
}
