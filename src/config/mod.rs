#[cfg(feature = "cli")]
pub mod cli;
pub mod settings;

#[cfg(feature = "cli")]
pub use cli::{Cli, Command, SqlCommand};
pub use settings::{LogFormat, Settings};
