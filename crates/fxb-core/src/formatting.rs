//! Telegram HTML rendering for conversion replies.

use crate::{aliases::emoji, convert::Conversion};

pub const RATES_UNAVAILABLE_TEXT: &str = "Could not fetch exchange rates.";
const NO_TARGETS_HTML: &str = "<i>No supported target currencies returned.</i>";

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// `1234.5` → `1,234.5`, `2000000.0` → `2,000,000`.
///
/// Rounded to two decimals; trailing zeros and a bare dot are dropped.
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let frac = frac_part.trim_end_matches('0');
    let mut out = String::new();
    // "-0" would read oddly once rounding has eaten every digit.
    if value.is_sign_negative() && (int_part != "0" || !frac.is_empty()) {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Header line plus one line per target currency, in code order.
pub fn render_conversion_html(conv: &Conversion) -> String {
    let header = format!(
        "<b>{} {}</b>:",
        escape_html(&format_amount(conv.amount)),
        escape_html(conv.base.as_str())
    );

    let lines: Vec<String> = conv
        .conversions
        .iter()
        .filter(|(code, value)| **code != conv.base && value.is_finite())
        .map(|(code, value)| {
            format!(
                "{} <b>{}</b> <code>{}</code>",
                escape_html(emoji(*code)),
                format_amount(*value),
                escape_html(code.as_str())
            )
        })
        .collect();

    let body = if lines.is_empty() {
        NO_TARGETS_HTML.to_string()
    } else {
        lines.join("\n")
    };
    format!("{header}\n{body}")
}

/// All conversions of one message, separated by a blank line.
pub fn render_replies(conversions: &[Conversion]) -> String {
    conversions
        .iter()
        .map(render_conversion_html)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn rate_limited_text(retry_after_secs: u64) -> String {
    format!("⏳ Too many requests. Please try again in {retry_after_secs} s.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CurrencyCode::*;
    use std::collections::BTreeMap;

    #[test]
    fn amounts_are_grouped_and_trimmed() {
        assert_eq!(format_amount(1234.5), "1,234.5");
        assert_eq!(format_amount(2_000_000.0), "2,000,000");
        assert_eq!(format_amount(100.0), "100");
        assert_eq!(format_amount(999.999), "1,000");
        assert_eq!(format_amount(12.3456), "12.35");
        assert_eq!(format_amount(-1500.25), "-1,500.25");
        assert_eq!(format_amount(0.001), "0");
        assert_eq!(format_amount(123_456.0), "123,456");
    }

    #[test]
    fn escapes_html_specials() {
        assert_eq!(escape_html("<b>&\"x\"</b>"), "&lt;b&gt;&amp;&quot;x&quot;&lt;/b&gt;");
    }

    #[test]
    fn renders_header_and_sorted_lines() {
        let conv = Conversion {
            amount: 100.0,
            base: Usd,
            conversions: BTreeMap::from([(Rub, 9_250.5), (Eur, 92.0), (Usd, 100.0)]),
        };
        assert_eq!(
            render_conversion_html(&conv),
            "<b>100 USD</b>:\n\
             🇪🇺 € <b>92</b> <code>EUR</code>\n\
             🇷🇺 ₽ <b>9,250.5</b> <code>RUB</code>"
        );
    }

    #[test]
    fn empty_or_non_finite_targets_fall_back() {
        let conv = Conversion {
            amount: 5.0,
            base: Eur,
            conversions: BTreeMap::from([(Usd, f64::NAN), (Gbp, f64::INFINITY)]),
        };
        assert_eq!(
            render_conversion_html(&conv),
            "<b>5 EUR</b>:\n<i>No supported target currencies returned.</i>"
        );
    }

    #[test]
    fn replies_are_joined_with_blank_line() {
        let a = Conversion {
            amount: 1.0,
            base: Usd,
            conversions: BTreeMap::new(),
        };
        let b = Conversion {
            amount: 2.0,
            base: Eur,
            conversions: BTreeMap::new(),
        };
        let out = render_replies(&[a, b]);
        assert_eq!(out.matches("\n\n").count(), 1);
        assert!(out.starts_with("<b>1 USD</b>:"));
        assert!(out.contains("\n\n<b>2 EUR</b>:"));
    }

    #[test]
    fn rate_limited_text_names_seconds() {
        assert!(rate_limited_text(42).contains("42 s"));
    }
}
