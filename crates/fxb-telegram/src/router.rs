use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use fxb_core::{
    config::Config, convert::Converter, handler::CurrencyBot, messaging::port::MessagingPort,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<CurrencyBot>,
}

pub async fn run_polling(cfg: Arc<Config>, converter: Arc<Converter>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => tracing::info!(username = %me.username(), "bot started"),
        Err(e) => tracing::warn!(error = %e, "get_me failed; continuing"),
    }
    tracing::info!(
        currencies = cfg.supported_currencies.len(),
        allowed_chats = cfg.allowed_chat_ids.len(),
        allowed_users = cfg.allowed_user_ids.len(),
        rate_limit = cfg.rate_limit_enabled,
        "configuration loaded"
    );

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let state = Arc::new(AppState {
        bot: Arc::new(CurrencyBot::new(converter, messenger, cfg.access_list())),
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    tracing::info!("dispatcher stopped");
    Ok(())
}
