use std::sync::Arc;

use cipherscape::bot::{run_dispatcher, Config, LogSink, YahooClient};

#[tokio::main]
pub async fn main() {
    dotenv::dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting CipherScape bot...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            log::error!("{err}");
            return;
        }
    };

    let market = match YahooClient::from_config(&config) {
        Ok(client) => Arc::new(client),
        Err(err) => {
            log::error!("Failed to build market data client: {err}");
            return;
        }
    };

    let bot = teloxide::Bot::new(config.token);

    log::info!("CipherScape bot started successfully!");

    run_dispatcher(bot, market, Arc::new(LogSink)).await;
}
