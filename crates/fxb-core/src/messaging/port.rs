use async_trait::async_trait;

use crate::{
    domain::MessageRef,
    messaging::types::InlineKeyboard,
    Result,
};

/// Outgoing side of a messenger.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Reply to `to` with link previews disabled, optionally attaching buttons.
    async fn reply_html(
        &self,
        to: MessageRef,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef>;

    async fn delete_message(&self, msg: MessageRef) -> Result<()>;

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}
