use std::sync::Arc;

use teloxide::{prelude::*, types::UserId, utils::command::BotCommands, RequestError};

use super::{
    api::{DiagnosticSink, MarketData},
    handler::{action_command, action_text, invalid_state},
};

/* Dispatcher wires Telegram updates to the handler endpoints.
 * Known slash-commands go to the command endpoint, other text to the text endpoint.
 * Anything else, including unknown commands, is dropped without a reply.
 */

/* Types */
pub type HandlerResult = Result<(), BotError>;

#[derive(thiserror::Error, Debug)]
pub enum BotError {
    #[error("Request error: {0}")]
    RequestError(RequestError),
}

impl From<RequestError> for BotError {
    fn from(request_error: RequestError) -> BotError {
        BotError::RequestError(request_error)
    }
}

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "Welcome message.")]
    Start,
    #[command(description = "Show this help message.")]
    Help,
    #[command(description = "Current stock price, e.g. /stock AAPL.")]
    Stock(String),
    #[command(description = "Company information, e.g. /info AAPL.")]
    Info(String),
    #[command(description = "Day's high/low and volume, e.g. /day AAPL.")]
    Day(String),
}

// Free text that is not a slash-command.
fn is_plain_text(msg: Message) -> bool {
    msg.text().is_some_and(|text| !text.starts_with('/'))
}

// Updates are queued per sender, so users sharing a group chat never wait on each other.
fn distribution_key(update: &Update) -> Option<UserId> {
    update.user().map(|user| user.id)
}

/* Main Dispatch function */
pub async fn run_dispatcher(
    bot: Bot,
    market: Arc<dyn MarketData>,
    sink: Arc<dyn DiagnosticSink>,
) {
    if let Err(err) = bot.set_my_commands(Command::bot_commands()).await {
        log::warn!("Dispatcher - Failed to register bot commands: {err}");
    }

    let command_handler = teloxide::filter_command::<Command, _>().endpoint(action_command);

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(dptree::filter(is_plain_text).endpoint(action_text))
        .branch(dptree::endpoint(invalid_state));

    Dispatcher::builder(bot, message_handler)
        .dependencies(dptree::deps![market, sink])
        .distribution_function(distribution_key)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
