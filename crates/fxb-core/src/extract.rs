//! Amount + currency extraction.
//!
//! The engine runs a fixed cascade of independent strategies over the raw
//! text and returns the result of the first one that resolves at least one
//! pair. Results of different strategies are never merged.

use regex::{Captures, Regex};

use crate::{
    aliases::AliasRegistry,
    domain::AmountCurrencyPair,
    numerals::{self, MULTIPLIERS, NUMBER_WORDS},
};

/// Currency token: Latin/Cyrillic letters plus the supported currency symbols.
const CURRENCY_TOKEN: &str = r"([a-zа-яёč€$¥£₽₴₸]+)";
const NUMBER: &str = r"([0-9]+(?:\.[0-9]+)?)";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// "100k usd", "1.5 млн рублей"
    NumberMultiplierCurrency,
    /// "два ляма рублей"
    WordNumberMultiplierCurrency,
    /// "миллион евро"
    MultiplierCurrency,
    /// "two hundred dollars"
    WordNumberCurrency,
    /// "100 usd", "50.5€"
    NumberCurrency,
}

impl Strategy {
    /// Priority order of the cascade.
    pub const ORDER: [Strategy; 5] = [
        Strategy::NumberMultiplierCurrency,
        Strategy::WordNumberMultiplierCurrency,
        Strategy::MultiplierCurrency,
        Strategy::WordNumberCurrency,
        Strategy::NumberCurrency,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    UnknownCurrency,
    UnknownMultiplier,
    UnparseableNumber,
}

/// A match that could not be turned into a pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dropped {
    pub strategy: Strategy,
    pub token: String,
    pub reason: DropReason,
}

/// Per-match outcome of one strategy.
pub type TokenOutcome = Result<AmountCurrencyPair, Dropped>;

/// Full result of running the cascade.
#[derive(Clone, Debug, Default)]
pub struct Extraction {
    /// Strategy that produced `pairs`, `None` if nothing matched.
    pub strategy: Option<Strategy>,
    pub pairs: Vec<AmountCurrencyPair>,
    /// Drops from every strategy that was tried, winner included.
    pub dropped: Vec<Dropped>,
}

struct Patterns {
    number_multiplier_currency: Regex,
    word_number_multiplier_currency: Regex,
    multiplier_currency: Regex,
    word_number_currency: Regex,
    number_currency: Regex,
}

impl Patterns {
    fn compile() -> Self {
        let all_multipliers = alternation(MULTIPLIERS.iter().map(|(w, _)| *w));
        // Bare abbreviations ("k", "м") are too ambiguous without a digit in front.
        let word_multipliers = alternation(
            MULTIPLIERS
                .iter()
                .map(|(w, _)| *w)
                .filter(|w| w.chars().count() > 1),
        );
        let number_word = alternation(NUMBER_WORDS.iter().map(|(w, _)| *w));
        let connectors = alternation(numerals::CONNECTORS.iter().copied());
        let number_phrase =
            format!(r"(?:{number_word})(?:\s+(?:(?:{connectors})\s+)?(?:{number_word}))*");

        let build = |pattern: String| Regex::new(&format!("(?i){pattern}")).expect("valid regex");

        Self {
            number_multiplier_currency: build(format!(
                r"{NUMBER}\s*((?:{all_multipliers})(?:illion|llion|л(?:ио)?н(?:ов)?)?)[.\s]*{CURRENCY_TOKEN}"
            )),
            word_number_multiplier_currency: build(format!(
                r"\b({number_phrase})\s+({word_multipliers})\s+{CURRENCY_TOKEN}"
            )),
            multiplier_currency: build(format!(r"\b({word_multipliers})\s+{CURRENCY_TOKEN}")),
            word_number_currency: build(format!(r"\b({number_phrase})\s+{CURRENCY_TOKEN}")),
            number_currency: build(format!(r"{NUMBER}[.\s]*{CURRENCY_TOKEN}")),
        }
    }
}

/// Regex alternation of `words`, longest first so shorter words never shadow longer ones.
fn alternation<'a>(words: impl Iterator<Item = &'a str>) -> String {
    let mut words: Vec<&str> = words.collect();
    words.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    words
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|")
}

pub struct Extractor {
    aliases: AliasRegistry,
    patterns: Patterns,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(AliasRegistry::default())
    }
}

impl Extractor {
    pub fn new(aliases: AliasRegistry) -> Self {
        Self {
            aliases,
            patterns: Patterns::compile(),
        }
    }

    pub fn aliases(&self) -> &AliasRegistry {
        &self.aliases
    }

    /// Pairs found by the first successful strategy, in text order.
    pub fn extract(&self, text: &str) -> Vec<AmountCurrencyPair> {
        self.extract_detailed(text).pairs
    }

    pub fn extract_detailed(&self, text: &str) -> Extraction {
        let mut out = Extraction::default();

        for strategy in Strategy::ORDER {
            let mut pairs = Vec::new();
            for outcome in self.run_strategy(strategy, text) {
                match outcome {
                    Ok(pair) => pairs.push(pair),
                    Err(dropped) => out.dropped.push(dropped),
                }
            }
            if !pairs.is_empty() {
                out.strategy = Some(strategy);
                out.pairs = pairs;
                break;
            }
        }

        tracing::debug!(
            strategy = ?out.strategy,
            pairs = out.pairs.len(),
            dropped = out.dropped.len(),
            "extraction finished"
        );
        out
    }

    /// Run a single strategy and report every match, resolved or not.
    pub fn run_strategy(&self, strategy: Strategy, text: &str) -> Vec<TokenOutcome> {
        let p = &self.patterns;
        match strategy {
            Strategy::NumberMultiplierCurrency => p
                .number_multiplier_currency
                .captures_iter(text)
                .map(|c| self.number_multiplier_currency(&c))
                .collect(),
            Strategy::WordNumberMultiplierCurrency => p
                .word_number_multiplier_currency
                .captures_iter(text)
                .map(|c| self.word_number_multiplier_currency(&c))
                .collect(),
            Strategy::MultiplierCurrency => p
                .multiplier_currency
                .captures_iter(text)
                .map(|c| self.multiplier_currency(&c))
                .collect(),
            Strategy::WordNumberCurrency => p
                .word_number_currency
                .captures_iter(text)
                .map(|c| self.word_number_currency(&c))
                .collect(),
            Strategy::NumberCurrency => p
                .number_currency
                .captures_iter(text)
                .map(|c| self.number_currency(&c))
                .collect(),
        }
    }

    fn number_multiplier_currency(&self, c: &Captures<'_>) -> TokenOutcome {
        let strategy = Strategy::NumberMultiplierCurrency;
        let number = parse_number(strategy, &c[1])?;
        let multiplier = multiplier(strategy, &c[2])?;
        self.resolve(strategy, number * multiplier, &c[3])
    }

    fn word_number_multiplier_currency(&self, c: &Captures<'_>) -> TokenOutcome {
        let strategy = Strategy::WordNumberMultiplierCurrency;
        let number = resolve_words(strategy, &c[1])?;
        let multiplier = multiplier(strategy, &c[2])?;
        self.resolve(strategy, number * multiplier, &c[3])
    }

    fn multiplier_currency(&self, c: &Captures<'_>) -> TokenOutcome {
        let strategy = Strategy::MultiplierCurrency;
        let amount = multiplier(strategy, &c[1])?;
        self.resolve(strategy, amount, &c[2])
    }

    fn word_number_currency(&self, c: &Captures<'_>) -> TokenOutcome {
        let strategy = Strategy::WordNumberCurrency;
        let amount = resolve_words(strategy, &c[1])?;
        self.resolve(strategy, amount, &c[2])
    }

    fn number_currency(&self, c: &Captures<'_>) -> TokenOutcome {
        let strategy = Strategy::NumberCurrency;
        let amount = parse_number(strategy, &c[1])?;
        self.resolve(strategy, amount, &c[2])
    }

    fn resolve(&self, strategy: Strategy, amount: f64, token: &str) -> TokenOutcome {
        match self.aliases.lookup(token) {
            Some(code) => Ok(AmountCurrencyPair::new(amount, code)),
            None => Err(dropped(strategy, token, DropReason::UnknownCurrency)),
        }
    }
}

fn dropped(strategy: Strategy, token: &str, reason: DropReason) -> Dropped {
    Dropped {
        strategy,
        token: token.to_string(),
        reason,
    }
}

fn parse_number(strategy: Strategy, raw: &str) -> Result<f64, Dropped> {
    raw.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| dropped(strategy, raw, DropReason::UnparseableNumber))
}

fn multiplier(strategy: Strategy, raw: &str) -> Result<f64, Dropped> {
    numerals::multiplier_value(raw)
        .map(|v| v as f64)
        .ok_or_else(|| dropped(strategy, raw, DropReason::UnknownMultiplier))
}

fn resolve_words(strategy: Strategy, raw: &str) -> Result<f64, Dropped> {
    numerals::resolve(raw)
        .map(|v| v as f64)
        .map_err(|_| dropped(strategy, raw, DropReason::UnparseableNumber))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aliases::AliasMatch;
    use crate::domain::CurrencyCode::{self, *};

    fn pairs(text: &str) -> Vec<(f64, CurrencyCode)> {
        Extractor::default()
            .extract(text)
            .into_iter()
            .map(|p| (p.amount, p.code))
            .collect()
    }

    #[test]
    fn number_and_currency() {
        assert_eq!(pairs("100 usd"), vec![(100.0, Usd)]);
        assert_eq!(pairs("50.5€"), vec![(50.5, Eur)]);
        assert_eq!(pairs("costs 20 EUR or 1500 рублей"), vec![(20.0, Eur), (1500.0, Rub)]);
        assert_eq!(pairs("100 kč"), vec![(100.0, Czk)]);
        assert_eq!(pairs("7.5 ₴"), vec![(7.5, Uah)]);
        assert_eq!(pairs("3000₸"), vec![(3000.0, Kzt)]);
    }

    #[test]
    fn number_multiplier_currency() {
        assert_eq!(pairs("2 k USD"), vec![(2_000.0, Usd)]);
        assert_eq!(pairs("1.5m eur"), vec![(1_500_000.0, Eur)]);
        assert_eq!(pairs("5 тысяч рублей"), vec![(5_000.0, Rub)]);
        assert_eq!(pairs("3 миллиона долларов"), vec![(3_000_000.0, Usd)]);
        assert_eq!(pairs("10 млн. руб"), vec![(10_000_000.0, Rub)]);
    }

    #[test]
    fn multiplier_wins_over_bare_number() {
        let ex = Extractor::default();
        let result = ex.extract_detailed("100k usd");
        assert_eq!(result.strategy, Some(Strategy::NumberMultiplierCurrency));
        assert_eq!(result.pairs, vec![AmountCurrencyPair::new(100_000.0, Usd)]);
    }

    #[test]
    fn word_number_multiplier_currency() {
        assert_eq!(pairs("два ляма рублей"), vec![(2_000_000.0, Rub)]);
        assert_eq!(pairs("две тысячи долларов"), vec![(2_000.0, Usd)]);
        assert_eq!(pairs("two hundred thousand dollars"), vec![(200_000.0, Usd)]);
    }

    #[test]
    fn bare_multiplier_currency() {
        assert_eq!(pairs("миллион евро"), vec![(1_000_000.0, Eur)]);
        let ex = Extractor::default();
        let result = ex.extract_detailed("тысяча долларов");
        assert_eq!(result.strategy, Some(Strategy::MultiplierCurrency));
        assert_eq!(result.pairs, vec![AmountCurrencyPair::new(1_000.0, Usd)]);
    }

    #[test]
    fn word_number_currency() {
        assert_eq!(pairs("two hundred dollars"), vec![(200.0, Usd)]);
        assert_eq!(pairs("двести рублей"), vec![(200.0, Rub)]);
        assert_eq!(pairs("две тысячи пятьсот долларов"), vec![(2_500.0, Usd)]);
        assert_eq!(pairs("ten tenge"), vec![(10.0, Kzt)]);
    }

    #[test]
    fn word_numbers_need_a_word_boundary() {
        // "сто" inside "просто" is not a number.
        assert!(pairs("просто рублей").is_empty());
    }

    #[test]
    fn abbreviation_alone_is_not_a_multiplier() {
        // "к рублю" means "to the ruble", not "a thousand rubles".
        assert!(pairs("курс доллара к рублю").is_empty());
    }

    #[test]
    fn garbage_yields_nothing() {
        assert!(pairs("hello world").is_empty());
        assert!(pairs("").is_empty());
        assert!(pairs("100 apples").is_empty());
    }

    #[test]
    fn unresolved_tokens_are_counted() {
        let ex = Extractor::default();
        let result = ex.extract_detailed("100 apples and 5 usd");
        assert_eq!(result.strategy, Some(Strategy::NumberCurrency));
        assert_eq!(result.pairs, vec![AmountCurrencyPair::new(5.0, Usd)]);
        assert_eq!(
            result.dropped,
            vec![Dropped {
                strategy: Strategy::NumberCurrency,
                token: "apples".to_string(),
                reason: DropReason::UnknownCurrency,
            }]
        );
    }

    #[test]
    fn losing_strategy_drops_are_reported() {
        // "5 kzt" first reads as "5 k" + "zt" and is dropped before the plain match wins.
        let ex = Extractor::default();
        let result = ex.extract_detailed("5 kzt");
        assert_eq!(result.pairs, vec![AmountCurrencyPair::new(5.0, Kzt)]);
        assert!(result
            .dropped
            .iter()
            .any(|d| d.strategy == Strategy::NumberMultiplierCurrency && d.token == "zt"));
    }

    #[test]
    fn every_single_token_alias_resolves() {
        let ex = Extractor::default();
        for (alias, code) in ex.aliases().aliases() {
            if alias.contains(' ') {
                continue;
            }
            let got = ex.extract(&format!("100 {alias}"));
            assert_eq!(
                got,
                vec![AmountCurrencyPair::new(100.0, code)],
                "alias {alias:?}"
            );
        }
    }

    #[test]
    fn exact_policy_flows_through_extraction() {
        let ex = Extractor::new(AliasRegistry::builtin(AliasMatch::Exact));
        assert_eq!(
            ex.extract("100 usd"),
            vec![AmountCurrencyPair::new(100.0, Usd)]
        );
        assert!(ex.extract("100 рублях").is_empty());
        assert_eq!(
            Extractor::default().extract("100 рублях"),
            vec![AmountCurrencyPair::new(100.0, Rub)]
        );
    }
}
