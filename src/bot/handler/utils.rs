use teloxide::{prelude::*, RequestError};

/* Common utilites for handlers. */

// Sends a plain-text reply into the chat the message came from.
pub async fn send_bot_message(
    bot: &Bot,
    msg: &Message,
    text: String,
) -> Result<Message, RequestError> {
    bot.send_message(msg.chat.id, text).await
}

// Describes who sent a message, for logs.
pub fn sender_label(msg: &Message) -> String {
    match msg.from() {
        Some(user) => match &user.username {
            Some(username) => format!("@{username}"),
            None => user.id.to_string(),
        },
        None => "unknown".to_string(),
    }
}
