pub mod cli;
pub mod config;
pub mod types;

pub use cli::{Cli, Command};
pub use config::Config;
