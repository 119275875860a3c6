use std::{fmt, str::FromStr};

use crate::errors::Error;

/// Telegram user id (numeric). Also the identity the rate limiter keys on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Closed set of currencies the bot understands.
///
/// Variants are declared in alphabetical order so the derived `Ord` matches
/// the ordering of the ISO codes (replies are sorted by code).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CurrencyCode {
    Czk,
    Eur,
    Gbp,
    Jpy,
    Kzt,
    Rub,
    Uah,
    Usd,
}

impl CurrencyCode {
    pub const ALL: [CurrencyCode; 8] = [
        CurrencyCode::Czk,
        CurrencyCode::Eur,
        CurrencyCode::Gbp,
        CurrencyCode::Jpy,
        CurrencyCode::Kzt,
        CurrencyCode::Rub,
        CurrencyCode::Uah,
        CurrencyCode::Usd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CurrencyCode::Czk => "CZK",
            CurrencyCode::Eur => "EUR",
            CurrencyCode::Gbp => "GBP",
            CurrencyCode::Jpy => "JPY",
            CurrencyCode::Kzt => "KZT",
            CurrencyCode::Rub => "RUB",
            CurrencyCode::Uah => "UAH",
            CurrencyCode::Usd => "USD",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        CurrencyCode::ALL
            .into_iter()
            .find(|c| c.as_str() == upper)
            .ok_or_else(|| Error::UnknownCurrency(s.to_string()))
    }
}

/// An amount found in a message, already resolved to a currency.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmountCurrencyPair {
    pub amount: f64,
    pub code: CurrencyCode,
}

impl AmountCurrencyPair {
    pub fn new(amount: f64, code: CurrencyCode) -> Self {
        Self { amount, code }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_order_matches_iso_string_order() {
        let mut by_str = CurrencyCode::ALL.to_vec();
        by_str.sort_by_key(|c| c.as_str());
        assert_eq!(by_str, CurrencyCode::ALL.to_vec());

        let mut by_ord = CurrencyCode::ALL.to_vec();
        by_ord.reverse();
        by_ord.sort();
        assert_eq!(by_ord, by_str);
    }

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!("usd".parse::<CurrencyCode>().unwrap(), CurrencyCode::Usd);
        assert_eq!(" KZT ".parse::<CurrencyCode>().unwrap(), CurrencyCode::Kzt);
        assert!(matches!(
            "XYZ".parse::<CurrencyCode>(),
            Err(Error::UnknownCurrency(_))
        ));
    }
}
