use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    aliases::AliasMatch,
    domain::CurrencyCode,
    errors::Error,
    rates::RateCacheConfig,
    security::{AccessList, RateLimiter},
    Result,
};

pub const DEFAULT_API_URL: &str = "https://api.currencyapi.com/v3/latest";

/// Typed configuration, read from the environment (and an optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub allowed_chat_ids: Vec<i64>,
    pub allowed_user_ids: Vec<i64>,

    // Rate source
    pub api_url: String,
    pub api_token: String,
    pub api_timeout: Duration,

    // Conversion
    pub supported_currencies: Vec<CurrencyCode>,
    pub alias_match: AliasMatch,

    // Cache
    pub cache_file: PathBuf,
    pub cache_ttl: Duration,

    // Rate limiting
    pub rate_limit_enabled: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_window: Duration,
}

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (process env in `load`, a map in tests).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get: Lookup = &get;

        // Required
        let telegram_bot_token = env_str(get, "TELEGRAM_BOT_TOKEN")
            .or_else(|| env_str(get, "TOKEN_BOT"))
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;

        let allowed_chat_ids = parse_csv_i64(env_str(get, "ALLOWED_CHAT_IDS"));
        let allowed_user_ids = parse_csv_i64(env_str(get, "ALLOWED_USER_IDS"));

        // Rate source
        let api_url = env_str(get, "API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_token = env_str(get, "TOKEN_API").unwrap_or_default();
        if api_token.is_empty() {
            tracing::warn!("TOKEN_API is not set; rate requests will likely be rejected");
        }
        let api_timeout = Duration::from_millis(env_u64(get, "API_TIMEOUT_MS")?.unwrap_or(10_000));

        // Conversion
        let supported_currencies = parse_currencies(env_str(get, "SUPPORTED_CURRENCIES"))?;
        let alias_match = match env_str(get, "ALIAS_MATCH") {
            Some(s) => s.parse::<AliasMatch>()?,
            None => AliasMatch::default(),
        };

        // Cache
        let cache_file =
            PathBuf::from(env_str(get, "CACHE_FILE").unwrap_or("rates_cache.json".to_string()));
        let cache_ttl = Duration::from_secs(env_u64(get, "CACHE_TTL")?.unwrap_or(3600));

        // Rate limiting
        let rate_limit_enabled = env_bool(get, "RATE_LIMIT_ENABLED").unwrap_or(true);
        let rate_limit_requests = env_u32(get, "RATE_LIMIT_REQUESTS")?.unwrap_or(5);
        let rate_limit_window = Duration::from_secs(env_u64(get, "RATE_LIMIT_WINDOW")?.unwrap_or(60));

        if rate_limit_enabled && (rate_limit_requests == 0 || rate_limit_window.is_zero()) {
            return Err(Error::Config(
                "RATE_LIMIT_REQUESTS and RATE_LIMIT_WINDOW must be positive".to_string(),
            ));
        }

        Ok(Self {
            telegram_bot_token,
            allowed_chat_ids,
            allowed_user_ids,
            api_url,
            api_token,
            api_timeout,
            supported_currencies,
            alias_match,
            cache_file,
            cache_ttl,
            rate_limit_enabled,
            rate_limit_requests,
            rate_limit_window,
        })
    }

    pub fn access_list(&self) -> AccessList {
        AccessList {
            allowed_chats: self.allowed_chat_ids.clone(),
            allowed_users: self.allowed_user_ids.clone(),
        }
    }

    pub fn rate_cache_config(&self) -> RateCacheConfig {
        RateCacheConfig {
            ttl: self.cache_ttl,
            currencies: self.supported_currencies.clone(),
            cache_file: Some(self.cache_file.clone()),
        }
    }

    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(
            self.rate_limit_enabled,
            self.rate_limit_requests,
            self.rate_limit_window,
        )
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, unquote(v.trim()));
    }
}

fn unquote(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return &val[1..val.len() - 1];
    }
    val
}

/// Trimmed value; blank counts as unset.
fn env_str(get: Lookup, key: &str) -> Option<String> {
    get(key).map(|s| s.trim().to_string()).and_then(non_empty)
}

fn env_bool(get: Lookup, key: &str) -> Option<bool> {
    env_str(get, key).map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn env_u64(get: Lookup, key: &str) -> Result<Option<u64>> {
    env_str(get, key)
        .map(|s| {
            s.parse::<u64>()
                .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got {s:?}")))
        })
        .transpose()
}

fn env_u32(get: Lookup, key: &str) -> Result<Option<u32>> {
    env_str(get, key)
        .map(|s| {
            s.parse::<u32>()
                .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got {s:?}")))
        })
        .transpose()
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

/// CSV of ISO codes, deduplicated in order; unset means every supported code.
fn parse_currencies(v: Option<String>) -> Result<Vec<CurrencyCode>> {
    let Some(v) = v else {
        return Ok(CurrencyCode::ALL.to_vec());
    };

    let mut out = Vec::new();
    for part in v.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let code = part
            .parse::<CurrencyCode>()
            .map_err(|_| Error::Config(format!("SUPPORTED_CURRENCIES: unknown code {part:?}")))?;
        if !out.contains(&code) {
            out.push(code);
        }
    }
    if out.is_empty() {
        return Ok(CurrencyCode::ALL.to_vec());
    }
    Ok(out)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
