use std::sync::Arc;

use teloxide::prelude::*;

use crate::bot::{
    api::{DiagnosticSink, MarketData},
    dispatcher::{Command, HandlerResult},
    processor::{process_command, process_text},
};

use super::utils::{send_bot_message, sender_label};

/* Slash-command endpoint.
 * Every known command produces exactly one reply, including usage hints.
 */
pub async fn action_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    market: Arc<dyn MarketData>,
    sink: Arc<dyn DiagnosticSink>,
) -> HandlerResult {
    log::debug!(
        "Command - User {} in chat {} sent {:?}",
        sender_label(&msg),
        msg.chat.id,
        cmd
    );

    let reply = process_command(cmd, market.as_ref(), sink.as_ref()).await;
    send_bot_message(&bot, &msg, reply).await?;
    Ok(())
}

/* Free-text endpoint.
 * A bare ticker is looked up as if sent with /stock, anything else gets a pointer to /help.
 */
pub async fn action_text(
    bot: Bot,
    msg: Message,
    market: Arc<dyn MarketData>,
    sink: Arc<dyn DiagnosticSink>,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    log::debug!(
        "Text - User {} in chat {} sent {:?}",
        sender_label(&msg),
        msg.chat.id,
        text
    );

    let reply = process_text(text, market.as_ref(), sink.as_ref()).await;
    send_bot_message(&bot, &msg, reply).await?;
    Ok(())
}

/* Invalid state.
 * Invoked for messages that are neither known commands nor plain text.
 * Simply does not respond. Reduces spam.
 */
pub async fn invalid_state(_bot: Bot, msg: Message) -> HandlerResult {
    if msg.from().is_some() {
        log::trace!("Ignored - Unhandled message in chat {}", msg.chat.id);
    }
    Ok(())
}
