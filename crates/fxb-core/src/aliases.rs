//! Currency alias registry (English + Russian words, abbreviations, symbols).
//!
//! Lookup is prefix based: a token resolves to an alias when it equals the
//! alias or starts with it, so inflected forms ("рублей", "dollars") and
//! glued punctuation still resolve. With [`AliasMatch::FirstPrefix`] the
//! table order decides ties, so keep same-prefix aliases of different codes
//! out of the table or order them on purpose.

use std::str::FromStr;

use crate::{domain::CurrencyCode, errors::Error};

use CurrencyCode::*;

/// Built-in alias table, in registration order.
pub const DEFAULT_ALIASES: &[(&str, CurrencyCode)] = &[
    ("usd", Usd),
    ("dollar", Usd),
    ("dollars", Usd),
    ("$", Usd),
    ("bucks", Usd),
    ("us$", Usd),
    ("us dollar", Usd),
    ("usdollar", Usd),
    ("американский доллар", Usd),
    ("доллар", Usd),
    ("доллары", Usd),
    ("бакс", Usd),
    ("баксы", Usd),
    ("eur", Eur),
    ("euro", Eur),
    ("euros", Eur),
    ("€", Eur),
    ("eur$", Eur),
    ("european currency", Eur),
    ("евро", Eur),
    ("еврики", Eur),
    ("еврик", Eur),
    ("евриков", Eur),
    ("gbp", Gbp),
    ("pound", Gbp),
    ("pounds", Gbp),
    ("£", Gbp),
    ("quid", Gbp),
    ("sterling", Gbp),
    ("british pound", Gbp),
    ("британский фунт", Gbp),
    ("фунт", Gbp),
    ("фунты", Gbp),
    ("jpy", Jpy),
    ("yen", Jpy),
    ("¥", Jpy),
    ("japan yen", Jpy),
    ("japanese yen", Jpy),
    ("иена", Jpy),
    ("японская иена", Jpy),
    ("японские иены", Jpy),
    ("czk", Czk),
    ("koruna", Czk),
    ("korunas", Czk),
    ("kč", Czk),
    ("czech crown", Czk),
    ("czech koruna", Czk),
    ("крона", Czk),
    ("чешская крона", Czk),
    ("крон", Czk),
    ("uah", Uah),
    ("грн", Uah),
    ("₴", Uah),
    ("hryvnia", Uah),
    ("hryvnias", Uah),
    ("ukrainian hryvnia", Uah),
    ("украинская гривна", Uah),
    ("гривна", Uah),
    ("гривны", Uah),
    ("гривен", Uah),
    ("rub", Rub),
    ("₽", Rub),
    ("ruble", Rub),
    ("rubles", Rub),
    ("russian ruble", Rub),
    ("russian rubles", Rub),
    ("российский рубль", Rub),
    ("рубль", Rub),
    ("руб", Rub),
    ("рубли", Rub),
    ("рублей", Rub),
    ("срубли", Rub),
    ("срублей", Rub),
    ("срубля", Rub),
    ("kzt", Kzt),
    ("₸", Kzt),
    ("tenge", Kzt),
    ("тенге", Kzt),
    ("казахстанский тенге", Kzt),
    ("казахстанские тенге", Kzt),
    ("казахстанских тенге", Kzt),
];

/// Display glyph for a currency (flag + symbol).
pub fn emoji(code: CurrencyCode) -> &'static str {
    match code {
        Usd => "🇺🇸 $",
        Eur => "🇪🇺 €",
        Gbp => "🇬🇧 £",
        Jpy => "🇯🇵 ¥",
        Czk => "🇨🇿 Kč",
        Uah => "🇺🇦 ₴",
        Rub => "🇷🇺 ₽",
        Kzt => "🇰🇿 ₸",
    }
}

/// How a token is matched against registered aliases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AliasMatch {
    /// First alias (in registration order) that is a prefix of the token.
    #[default]
    FirstPrefix,
    /// Longest alias that is a prefix of the token; registration order breaks ties.
    LongestPrefix,
    /// Token must equal the alias.
    Exact,
}

impl FromStr for AliasMatch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first-prefix" | "first" | "prefix" => Ok(Self::FirstPrefix),
            "longest-prefix" | "longest" => Ok(Self::LongestPrefix),
            "exact" => Ok(Self::Exact),
            other => Err(Error::Config(format!("unknown alias match policy: {other}"))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AliasRegistry {
    entries: Vec<(String, CurrencyCode)>,
    policy: AliasMatch,
}

impl Default for AliasRegistry {
    fn default() -> Self {
        Self::builtin(AliasMatch::default())
    }
}

impl AliasRegistry {
    pub fn builtin(policy: AliasMatch) -> Self {
        Self::new(DEFAULT_ALIASES.iter().copied(), policy)
    }

    /// Build a registry from `(alias, code)` pairs; aliases are lower-cased
    /// and keep the iteration order of `entries`.
    pub fn new<'a>(
        entries: impl IntoIterator<Item = (&'a str, CurrencyCode)>,
        policy: AliasMatch,
    ) -> Self {
        let entries = entries
            .into_iter()
            .map(|(alias, code)| (alias.to_lowercase(), code))
            .filter(|(alias, _)| !alias.is_empty())
            .collect();
        Self { entries, policy }
    }

    pub fn policy(&self) -> AliasMatch {
        self.policy
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, CurrencyCode)> {
        self.entries.iter().map(|(a, c)| (a.as_str(), *c))
    }

    /// Resolve a raw currency token. Case-insensitive.
    pub fn lookup(&self, token: &str) -> Option<CurrencyCode> {
        let token = token.trim().to_lowercase();
        if token.is_empty() {
            return None;
        }

        match self.policy {
            AliasMatch::Exact => self
                .entries
                .iter()
                .find(|(alias, _)| *alias == token)
                .map(|(_, code)| *code),
            AliasMatch::FirstPrefix => self
                .entries
                .iter()
                .find(|(alias, _)| token.starts_with(alias.as_str()))
                .map(|(_, code)| *code),
            AliasMatch::LongestPrefix => {
                let mut best: Option<(usize, CurrencyCode)> = None;
                for (alias, code) in &self.entries {
                    if !token.starts_with(alias.as_str()) {
                        continue;
                    }
                    let len = alias.chars().count();
                    if best.map_or(true, |(best_len, _)| len > best_len) {
                        best = Some((len, *code));
                    }
                }
                best.map(|(_, code)| code)
            }
        }
    }
}
