//! Spelled-out numbers and multiplier words (English + Russian).

/// How a number word contributes to the running value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumberWord {
    /// Added to the accumulator (ones, teens, tens, fused hundreds like "двести").
    Unit(u64),
    /// Multiplies the accumulator ("hundred", "сто").
    Hundred,
    /// Multiplies the accumulator and flushes it into the total.
    Thousand,
}

use NumberWord::*;

pub const NUMBER_WORDS: &[(&str, NumberWord)] = &[
    ("zero", Unit(0)),
    ("один", Unit(1)),
    ("одна", Unit(1)),
    ("one", Unit(1)),
    ("два", Unit(2)),
    ("две", Unit(2)),
    ("two", Unit(2)),
    ("три", Unit(3)),
    ("three", Unit(3)),
    ("четыре", Unit(4)),
    ("four", Unit(4)),
    ("пять", Unit(5)),
    ("five", Unit(5)),
    ("шесть", Unit(6)),
    ("six", Unit(6)),
    ("семь", Unit(7)),
    ("seven", Unit(7)),
    ("восемь", Unit(8)),
    ("eight", Unit(8)),
    ("девять", Unit(9)),
    ("nine", Unit(9)),
    ("десять", Unit(10)),
    ("ten", Unit(10)),
    ("одиннадцать", Unit(11)),
    ("eleven", Unit(11)),
    ("двенадцать", Unit(12)),
    ("twelve", Unit(12)),
    ("тринадцать", Unit(13)),
    ("thirteen", Unit(13)),
    ("четырнадцать", Unit(14)),
    ("fourteen", Unit(14)),
    ("пятнадцать", Unit(15)),
    ("fifteen", Unit(15)),
    ("шестнадцать", Unit(16)),
    ("sixteen", Unit(16)),
    ("семнадцать", Unit(17)),
    ("seventeen", Unit(17)),
    ("восемнадцать", Unit(18)),
    ("eighteen", Unit(18)),
    ("девятнадцать", Unit(19)),
    ("nineteen", Unit(19)),
    ("двадцать", Unit(20)),
    ("twenty", Unit(20)),
    ("тридцать", Unit(30)),
    ("thirty", Unit(30)),
    ("сорок", Unit(40)),
    ("forty", Unit(40)),
    ("пятьдесят", Unit(50)),
    ("fifty", Unit(50)),
    ("шестьдесят", Unit(60)),
    ("sixty", Unit(60)),
    ("семьдесят", Unit(70)),
    ("seventy", Unit(70)),
    ("восемьдесят", Unit(80)),
    ("eighty", Unit(80)),
    ("девяносто", Unit(90)),
    ("ninety", Unit(90)),
    ("сто", Hundred),
    ("hundred", Hundred),
    ("двести", Unit(200)),
    ("триста", Unit(300)),
    ("четыреста", Unit(400)),
    ("пятьсот", Unit(500)),
    ("шестьсот", Unit(600)),
    ("семьсот", Unit(700)),
    ("восемьсот", Unit(800)),
    ("девятьсот", Unit(900)),
    ("тысяча", Thousand),
    ("thousand", Thousand),
    ("тысячи", Thousand),
    ("тысяч", Thousand),
];

/// Words skipped between number words ("one hundred and five").
pub const CONNECTORS: &[&str] = &["and", "и"];

/// Multiplier tokens. Single-letter abbreviations only count right after a digit.
pub const MULTIPLIERS: &[(&str, u64)] = &[
    ("k", 1_000),
    ("к", 1_000),
    ("thousand", 1_000),
    ("thousands", 1_000),
    ("тыс", 1_000),
    ("тысяч", 1_000),
    ("тысяча", 1_000),
    ("тысячи", 1_000),
    ("m", 1_000_000),
    ("м", 1_000_000),
    ("mil", 1_000_000),
    ("mln", 1_000_000),
    ("million", 1_000_000),
    ("millions", 1_000_000),
    ("млн", 1_000_000),
    ("миллион", 1_000_000),
    ("миллиона", 1_000_000),
    ("миллионов", 1_000_000),
    ("лям", 1_000_000),
    ("ляма", 1_000_000),
    ("лямов", 1_000_000),
    ("лимон", 1_000_000),
    ("лимона", 1_000_000),
    ("лимонов", 1_000_000),
];

/// Spelling tails tolerated after a multiplier stem ("mllion", "млион").
const MULTIPLIER_TAILS: &[&str] = &["illion", "llion", "лион", "лн"];
const INFLECTIONS: &[&str] = &["ов", "а", "и", "s"];

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("no number words in {0:?}")]
pub struct Unparseable(pub String);

pub fn number_word(word: &str) -> Option<NumberWord> {
    let word = word.to_lowercase();
    NUMBER_WORDS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, v)| *v)
}

/// Resolve a phrase of number words ("two thousand five hundred") to its value.
///
/// Unknown words and connectors are skipped; the phrase only fails when it
/// contains no number word at all.
pub fn resolve(phrase: &str) -> Result<u64, Unparseable> {
    let mut total: u64 = 0;
    let mut current: u64 = 0;
    let mut recognized = false;

    for word in phrase.split_whitespace() {
        let lower = word.to_lowercase();
        if CONNECTORS.contains(&lower.as_str()) {
            continue;
        }
        let Some(kind) = number_word(&lower) else {
            continue;
        };
        recognized = true;

        match kind {
            Unit(n) => current = current.saturating_add(n),
            Hundred => current = current.max(1).saturating_mul(100),
            Thousand => {
                total = total.saturating_add(current.max(1).saturating_mul(1_000));
                current = 0;
            }
        }
    }

    if !recognized {
        return Err(Unparseable(phrase.to_string()));
    }
    Ok(total.saturating_add(current))
}

/// Value of a multiplier token, tolerating spelling tails and inflections.
pub fn multiplier_value(token: &str) -> Option<u64> {
    let token = token.to_lowercase();
    if let Some(v) = lookup_multiplier(&token) {
        return Some(v);
    }

    let mut stem = token.as_str();
    for tail in MULTIPLIER_TAILS {
        if let Some((head, _)) = stem.split_once(tail) {
            stem = head;
        }
    }
    if let Some(v) = lookup_multiplier(stem) {
        return Some(v);
    }

    INFLECTIONS
        .iter()
        .filter_map(|suffix| stem.strip_suffix(suffix))
        .find_map(lookup_multiplier)
}

fn lookup_multiplier(token: &str) -> Option<u64> {
    MULTIPLIERS
        .iter()
        .find(|(w, _)| *w == token)
        .map(|(_, v)| *v)
}
