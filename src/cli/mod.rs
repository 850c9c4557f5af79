pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::Cli;
pub use handlers::dispatch;
