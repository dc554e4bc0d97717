// bot/mod.rs

// Exported functions
pub use self::dispatcher::run_dispatcher;

// Exported structs and types
pub use self::api::{DiagnosticSink, LogSink, MarketData};
pub use self::config::{Config, ConfigError};
pub use self::dispatcher::{BotError, Command, HandlerResult};
pub use self::yahoo::YahooClient;

// Declare submodules
mod api;
mod config;
mod dispatcher;
mod format;
mod handler;
mod processor;
mod yahoo;
