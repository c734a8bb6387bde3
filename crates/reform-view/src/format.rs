//! Locale-aware number formatting for reports.
//!
//! Display only: nothing in the models consumes these strings.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Rendered in place of non-finite values.
pub const NOT_A_NUMBER: &str = "—";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "zh-Hant")]
    ZhHant,
    #[serde(rename = "en")]
    En,
    #[serde(rename = "de")]
    De,
}

impl Locale {
    fn separators(&self) -> (char, char) {
        match self {
            Locale::ZhHant | Locale::En => (',', '.'),
            Locale::De => ('.', ','),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("unsupported locale: {0}")]
pub struct LocaleError(pub String);

impl FromStr for Locale {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "zh-Hant" | "zh-TW" | "zh" => Ok(Locale::ZhHant),
            "en" | "en-US" => Ok(Locale::En),
            "de" | "de-DE" => Ok(Locale::De),
            other => Err(LocaleError(other.to_string())),
        }
    }
}

/// Format with exactly `digits` fraction digits and grouped thousands.
pub fn format_number(value: f64, digits: u32, locale: Locale) -> String {
    if !value.is_finite() {
        return NOT_A_NUMBER.to_string();
    }
    let plain = match Decimal::from_f64_retain(value) {
        Some(d) => {
            let mut d = d.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero);
            d.rescale(digits);
            if d.is_zero() {
                d.set_sign_positive(true);
            }
            d.to_string()
        }
        // beyond decimal range; std rounding is good enough there
        None => format!("{:.*}", digits as usize, value),
    };
    let (group_sep, decimal_sep) = locale.separators();
    let (negative, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, plain.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut out = String::with_capacity(plain.len() + int_part.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    out.push_str(&group_digits(int_part, group_sep));
    if let Some(frac) = frac_part {
        out.push(decimal_sep);
        out.push_str(frac);
    }
    out
}

/// `ratio` as a percentage, e.g. `0.35` → `35.0%`.
pub fn format_percent(ratio: f64, digits: u32, locale: Locale) -> String {
    if !ratio.is_finite() {
        return NOT_A_NUMBER.to_string();
    }
    format!("{}%", format_number(ratio * 100.0, digits, locale))
}

fn group_digits(digits: &str, sep: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_number(1234567.891, 2, Locale::ZhHant), "1,234,567.89");
        assert_eq!(format_number(999.0, 2, Locale::En), "999.00");
        assert_eq!(format_number(1000.0, 0, Locale::En), "1,000");
    }

    #[test]
    fn pads_and_rounds_half_away_from_zero() {
        assert_eq!(format_number(866.6666666, 2, Locale::ZhHant), "866.67");
        assert_eq!(format_number(0.125, 2, Locale::En), "0.13");
        assert_eq!(format_number(-1234.5, 1, Locale::En), "-1,234.5");
        assert_eq!(format_number(5.0, 3, Locale::En), "5.000");
    }

    #[test]
    fn rounds_the_stored_value_not_its_shortest_form() {
        assert_eq!(format_number(1.0005, 3, Locale::En), "1.000");
        assert_eq!(format_number(1002.675, 2, Locale::ZhHant), "1,002.67");
        assert_eq!(format_number(1.5, 0, Locale::En), "2");
    }

    #[test]
    fn negative_zero_is_unsigned() {
        assert_eq!(format_number(-0.001, 2, Locale::En), "0.00");
    }

    #[test]
    fn german_swaps_separators() {
        assert_eq!(format_number(1234567.891, 2, Locale::De), "1.234.567,89");
    }

    #[test]
    fn non_finite_renders_placeholder() {
        assert_eq!(format_number(f64::NAN, 2, Locale::En), NOT_A_NUMBER);
        assert_eq!(format_percent(f64::INFINITY, 1, Locale::En), NOT_A_NUMBER);
    }

    #[test]
    fn percent() {
        assert_eq!(format_percent(0.35, 1, Locale::ZhHant), "35.0%");
    }

    #[test]
    fn locale_tags() {
        assert_eq!("zh-Hant".parse::<Locale>().unwrap(), Locale::ZhHant);
        assert_eq!("de".parse::<Locale>().unwrap(), Locale::De);
        assert!("xx".parse::<Locale>().is_err());
    }
}
