//! Event sources feeding the preview session: the watched document file and
//! the command line.

mod commands;
mod watch;

pub use commands::{CommandLineSource, parse_command};
pub use watch::FileWatchSource;
