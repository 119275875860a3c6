use std::sync::Arc;

use fxb_currencyapi::CurrencyApiClient;

use fxb_core::{
    aliases::AliasRegistry,
    config::Config,
    convert::Converter,
    extract::Extractor,
    rates::{RateCache, RateSource},
};

#[tokio::main]
async fn main() -> Result<(), fxb_core::Error> {
    fxb_core::logging::init("fxb")?;

    let cfg = Arc::new(Config::load()?);

    let source: Arc<dyn RateSource> = Arc::new(CurrencyApiClient::new(
        cfg.api_url.clone(),
        cfg.api_token.clone(),
        cfg.api_timeout,
    )?);
    let cache = Arc::new(RateCache::load(source, cfg.rate_cache_config()));
    let extractor = Arc::new(Extractor::new(AliasRegistry::builtin(cfg.alias_match)));
    tracing::info!(
        cache_file = %cfg.cache_file.display(),
        alias_match = ?extractor.aliases().policy(),
        "starting currency bot"
    );
    let converter = Arc::new(Converter::new(extractor, cache, cfg.rate_limiter()));

    fxb_telegram::router::run_polling(cfg, converter)
        .await
        .map_err(|e| fxb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
