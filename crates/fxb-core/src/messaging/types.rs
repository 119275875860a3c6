use crate::domain::{MessageRef, UserId};

/// Callback data carried by the delete button.
pub const DELETE_CALLBACK: &str = "delete";

/// Incoming text message.
#[derive(Clone, Debug)]
pub struct TextMessage {
    pub message: MessageRef,
    /// Absent for channel posts and anonymous admins.
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub text: String,
}

#[derive(Clone, Debug)]
pub struct CallbackQuery {
    pub callback_id: String,
    pub user_id: UserId,
    pub data: String,
    /// The bot message the button was attached to, when still accessible.
    pub message: Option<MessageRef>,
}

/// Inline keyboard, one row of buttons.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub buttons: Vec<InlineButton>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineKeyboard {
    pub fn new(buttons: Vec<InlineButton>) -> Self {
        Self { buttons }
    }

    /// Single "🗑 Delete" button attached to conversion replies.
    pub fn delete_button() -> Self {
        Self::new(vec![InlineButton {
            label: "🗑 Delete".to_string(),
            callback_data: DELETE_CALLBACK.to_string(),
        }])
    }
}
