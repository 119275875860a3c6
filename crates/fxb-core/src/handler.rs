//! Messenger-agnostic update handling: text messages and button callbacks.

use std::sync::Arc;

use crate::{
    convert::{Converter, Outcome},
    domain::UserId,
    formatting::{escape_html, rate_limited_text, render_replies, RATES_UNAVAILABLE_TEXT},
    messaging::{
        port::MessagingPort,
        types::{CallbackQuery, InlineKeyboard, TextMessage, DELETE_CALLBACK},
    },
    security::AccessList,
    Result,
};

pub struct CurrencyBot {
    converter: Arc<Converter>,
    messenger: Arc<dyn MessagingPort>,
    access: AccessList,
}

impl CurrencyBot {
    pub fn new(
        converter: Arc<Converter>,
        messenger: Arc<dyn MessagingPort>,
        access: AccessList,
    ) -> Self {
        Self {
            converter,
            messenger,
            access,
        }
    }

    pub async fn handle_text(&self, msg: &TextMessage) -> Result<()> {
        if msg.text.starts_with('/') {
            return Ok(());
        }
        let chat_id = msg.message.chat_id;
        if !self.access.is_allowed(chat_id, msg.user_id) {
            tracing::debug!(chat_id = chat_id.0, "message from chat outside the allow-list");
            return Ok(());
        }

        // Anonymous senders are limited per chat.
        let identity = msg.user_id.unwrap_or(UserId(chat_id.0));

        match self.converter.process(identity, &msg.text).await {
            Outcome::NoMatch => {}
            Outcome::RateLimited { retry_after_secs } => {
                let text = escape_html(&rate_limited_text(retry_after_secs));
                self.messenger.reply_html(msg.message, &text, None).await?;
            }
            Outcome::RatesUnavailable => {
                self.messenger
                    .reply_html(msg.message, RATES_UNAVAILABLE_TEXT, None)
                    .await?;
            }
            Outcome::Converted(conversions) => {
                tracing::info!(
                    chat_id = chat_id.0,
                    user = msg.username.as_deref().unwrap_or("unknown"),
                    pairs = conversions.len(),
                    "conversion reply"
                );
                let html = render_replies(&conversions);
                self.messenger
                    .reply_html(msg.message, &html, Some(InlineKeyboard::delete_button()))
                    .await?;
            }
        }
        Ok(())
    }

    pub async fn handle_callback(&self, q: &CallbackQuery) -> Result<()> {
        // Always answer so the client stops its loading indicator.
        if let Err(e) = self.messenger.answer_callback_query(&q.callback_id, None).await {
            tracing::warn!(error = %e, "answer_callback_query failed");
        }

        if q.data != DELETE_CALLBACK {
            tracing::debug!(data = %q.data, "ignoring unknown callback");
            return Ok(());
        }
        let Some(target) = q.message else {
            return Ok(());
        };
        self.messenger.delete_message(target).await
    }
}
