use crate::domain::CurrencyCode;

/// Core error type.
///
/// Adapter crates map their transport-specific errors into this type so the
/// conversion pipeline can tell "skip this pair" apart from configuration or
/// I/O problems.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    #[error("rate source unavailable for {base}: {reason}")]
    RateSourceUnavailable { base: CurrencyCode, reason: String },

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
