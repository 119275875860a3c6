//! Core of the currency conversion bot: amount extraction, exchange rates,
//! rate limiting and reply rendering.
//!
//! Framework-agnostic. The rate API and Telegram live behind ports (traits)
//! implemented in adapter crates.

pub mod aliases;
pub mod config;
pub mod convert;
pub mod domain;
pub mod errors;
pub mod extract;
pub mod formatting;
pub mod handler;
pub mod logging;
pub mod messaging;
pub mod numerals;
pub mod rates;
pub mod security;

pub use errors::{Error, Result};
