//! Translate teloxide updates into core messages and hand them to `CurrencyBot`.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use fxb_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    messaging::types,
};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(incoming) = text_message(&msg) else {
        return Ok(());
    };

    // Failures are logged; the dispatcher keeps running.
    if let Err(e) = state.bot.handle_text(&incoming).await {
        tracing::warn!(chat_id = msg.chat.id.0, error = %e, "message handling failed");
    }
    Ok(())
}

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let incoming = types::CallbackQuery {
        callback_id: q.id.clone(),
        user_id: UserId(q.from.id.0 as i64),
        data: q.data.clone().unwrap_or_default(),
        message: q.message.as_ref().map(message_ref),
    };

    if let Err(e) = state.bot.handle_callback(&incoming).await {
        tracing::warn!(data = %incoming.data, error = %e, "callback handling failed");
    }
    Ok(())
}

fn text_message(msg: &Message) -> Option<types::TextMessage> {
    let text = msg.text()?;
    let from = msg.from();
    Some(types::TextMessage {
        message: message_ref(msg),
        user_id: from.map(|u| UserId(u.id.0 as i64)),
        username: from.and_then(|u| u.username.clone()),
        text: text.to_string(),
    })
}

fn message_ref(msg: &Message) -> MessageRef {
    MessageRef {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
    }
}
