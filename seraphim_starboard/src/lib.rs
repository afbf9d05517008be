mod force;
mod message;
mod refresh;
pub mod starboard;
pub mod tally;

pub use force::{force_post, ForceOutcome};
pub use refresh::spawn_refresh_worker;
pub use starboard::{starboard_add_handler, starboard_remove_handler};

pub(crate) use seraphim_data::{Data, Error};
