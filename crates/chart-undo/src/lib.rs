mod commands;
mod history;

pub use commands::{Command, Commands, EditCommand};
pub use history::SnapshotHistory;
