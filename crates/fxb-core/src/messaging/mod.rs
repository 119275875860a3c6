//! Messenger abstractions; Telegram implements them in `fxb-telegram`.

pub mod port;
pub mod types;
