pub mod commands;
pub mod config;

pub use commands::Cli;
pub use commands::Command;
