use seraphim_data::{Command, Context, Error};

pub mod easter_eggs;
pub mod images;
pub mod meta;
pub mod say;
pub mod settings;
pub mod snipe;
pub mod starboard;

pub mod utils;

pub fn commands() -> Vec<Command> {
    meta::commands()
        .into_iter()
        .chain(starboard::commands())
        .chain(settings::commands())
        .chain(say::commands())
        .chain(snipe::commands())
        .chain(images::commands())
        .chain(easter_eggs::commands())
        .collect()
}
