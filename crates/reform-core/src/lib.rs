#![deny(warnings)]

//! Core domain models for the phantom-area reform calculator.
//!
//! This crate defines the raw input record, the closed enums that replace
//! free-form tags, and the pure area model:
//! - Numeric utilities (clamp, lenient parsing, ping conversion, rounding)
//! - Before/after area composition under a fixing convention
//! - Deltas and threshold warnings derived from the area state

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Keeps ratios strictly inside (0, 1).
pub const EPSILON: f64 = 0.001;

/// Square meters per ping.
pub const PING_IN_M2: f64 = 3.305785;

/// Ratios or shrink fractions at or above this value raise a warning.
pub const RATIO_WARNING_THRESHOLD: f64 = 0.98;

/// Restrict `value` to `[min, max]`.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Square meters to ping.
pub fn to_ping(value: f64) -> f64 {
    value / PING_IN_M2
}

/// Ping to square meters.
pub fn from_ping(value: f64) -> f64 {
    value * PING_IN_M2
}

/// Round half away from zero to `dp` decimal places for display.
///
/// Rounds the exact stored binary value, so `1.0005` (stored just below the
/// midpoint) rounds down to `1.000`. Values that cannot be represented as a
/// decimal (non-finite or out of range) are returned unchanged.
pub fn round_dp(value: f64, dp: u32) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// A numeric field as entered: either already a number or free text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(f64),
    Text(String),
}

impl RawNumber {
    /// Coerce to a finite number, or `fallback` when that is impossible.
    pub fn to_finite(&self, fallback: f64) -> f64 {
        let parsed = match self {
            RawNumber::Number(v) => *v,
            RawNumber::Text(s) => match parse_text(s.trim()) {
                Some(v) => v,
                None => return fallback,
            },
        };
        if parsed.is_finite() {
            parsed
        } else {
            fallback
        }
    }
}

// Decimal literals, plus unsigned `0x`/`0o`/`0b` integer literals.
fn parse_text(s: &str) -> Option<f64> {
    let radix = match s.get(..2).map(str::to_ascii_lowercase).as_deref() {
        Some("0x") => 16,
        Some("0o") => 8,
        Some("0b") => 2,
        _ => return s.parse().ok(),
    };
    let digits = &s[2..];
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0.0f64, |acc, c| {
        c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
    })
}

impl Default for RawNumber {
    fn default() -> Self {
        RawNumber::Text(String::new())
    }
}

impl fmt::Display for RawNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawNumber::Number(v) => write!(f, "{v}"),
            RawNumber::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for RawNumber {
    fn from(v: f64) -> Self {
        RawNumber::Number(v)
    }
}

impl From<&str> for RawNumber {
    fn from(s: &str) -> Self {
        RawNumber::Text(s.to_string())
    }
}

impl From<String> for RawNumber {
    fn from(s: String) -> Self {
        RawNumber::Text(s)
    }
}

impl From<&RawNumber> for RawNumber {
    fn from(v: &RawNumber) -> Self {
        v.clone()
    }
}

/// Coerce any numeric or textual input to a finite number.
///
/// Empty text, `NaN`, infinities and non-numeric text all yield `fallback`.
/// Everything downstream of this call may assume finite values.
pub fn parse_number<V: Into<RawNumber>>(value: V, fallback: f64) -> f64 {
    value.into().to_finite(fallback)
}

/// Unknown tag for one of the closed input enums.
#[derive(Debug, Error, PartialEq)]
#[error("unknown {kind} tag: {tag:?}")]
pub struct TagError {
    pub kind: &'static str,
    pub tag: String,
}

/// Which quantity is held constant across the reform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FixMode {
    /// Usable (interior) area is held constant; total is back-derived.
    #[default]
    #[serde(rename = "A")]
    AreaFixed,
    /// Total (title) area is held constant; usable area changes.
    #[serde(rename = "T")]
    TotalFixed,
}

impl FixMode {
    pub fn as_tag(&self) -> &'static str {
        match self {
            FixMode::AreaFixed => "A",
            FixMode::TotalFixed => "T",
        }
    }

    /// Display label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            FixMode::AreaFixed => "A 固定（實坪固定）",
            FixMode::TotalFixed => "T 固定（總面積固定）",
        }
    }
}

impl FromStr for FixMode {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" => Ok(FixMode::AreaFixed),
            "T" => Ok(FixMode::TotalFixed),
            other => Err(TagError {
                kind: "mode",
                tag: other.to_string(),
            }),
        }
    }
}

/// Which area metric is the denominator of the unit price.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SalesBasis {
    /// Title (total) area.
    #[default]
    #[serde(rename = "T")]
    Total,
    /// Usable (interior) area.
    #[serde(rename = "A")]
    Usable,
}

impl SalesBasis {
    pub fn as_tag(&self) -> &'static str {
        match self {
            SalesBasis::Total => "T",
            SalesBasis::Usable => "A",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SalesBasis::Total => "權狀面積",
            SalesBasis::Usable => "實坪面積",
        }
    }
}

impl FromStr for SalesBasis {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "T" => Ok(SalesBasis::Total),
            "A" => Ok(SalesBasis::Usable),
            other => Err(TagError {
                kind: "basis",
                tag: other.to_string(),
            }),
        }
    }
}

/// Display unit for areas. Computation is always in square meters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AreaUnit {
    #[default]
    #[serde(rename = "m2")]
    SquareMeter,
    #[serde(rename = "ping")]
    Ping,
}

impl AreaUnit {
    pub fn as_tag(&self) -> &'static str {
        match self {
            AreaUnit::SquareMeter => "m2",
            AreaUnit::Ping => "ping",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            AreaUnit::SquareMeter => "㎡",
            AreaUnit::Ping => "坪",
        }
    }

    /// Convert an area in square meters into this unit.
    pub fn display(&self, m2: f64) -> f64 {
        match self {
            AreaUnit::SquareMeter => m2,
            AreaUnit::Ping => to_ping(m2),
        }
    }
}

impl FromStr for AreaUnit {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "m2" => Ok(AreaUnit::SquareMeter),
            "ping" => Ok(AreaUnit::Ping),
            other => Err(TagError {
                kind: "unit",
                tag: other.to_string(),
            }),
        }
    }
}

/// Flat input record as captured by the presentation layer.
///
/// Numeric fields are kept as entered; they are sanitized only when the
/// models read them. Missing fields take the defaults below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawInputs {
    /// Phantom ratio before the reform.
    pub r0: RawNumber,
    /// Phantom ratio after the reform.
    pub r1: RawNumber,
    /// Total area before the reform, in square meters.
    pub t0: RawNumber,
    pub mode: FixMode,
    pub unit: AreaUnit,
    pub basis: SalesBasis,
    /// Unit price before the reform.
    #[serde(rename = "P0", alias = "p0")]
    pub p0: RawNumber,
    /// Largest shrink fraction sampled by the sensitivity curve.
    pub k_max: RawNumber,
    /// Sampling step of the sensitivity curve.
    pub k_step: RawNumber,
}

impl Default for RawInputs {
    fn default() -> Self {
        Self {
            r0: RawNumber::Number(0.35),
            r1: RawNumber::Number(0.25),
            t0: RawNumber::Number(1000.0),
            mode: FixMode::AreaFixed,
            unit: AreaUnit::SquareMeter,
            basis: SalesBasis::Total,
            p0: RawNumber::Number(30.0),
            k_max: RawNumber::Number(0.3),
            k_step: RawNumber::Number(0.05),
        }
    }
}

/// Before/after area composition. Areas are in square meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AreaState {
    pub ratio0: f64,
    pub ratio1: f64,
    pub total0: f64,
    pub total1: f64,
    pub usable0: f64,
    pub usable1: f64,
    pub virtual0: f64,
    pub virtual1: f64,
}

/// Derive the before/after area breakdown.
///
/// Ratios are clamped into `[EPSILON, 1 - EPSILON]` so `1 - ratio` is never
/// zero; a negative total is floored to zero.
pub fn compute_area<R0, R1, T0>(r0: R0, r1: R1, t0: T0, mode: FixMode) -> AreaState
where
    R0: Into<RawNumber>,
    R1: Into<RawNumber>,
    T0: Into<RawNumber>,
{
    let ratio0 = clamp(parse_number(r0, 0.0), EPSILON, 1.0 - EPSILON);
    let ratio1 = clamp(parse_number(r1, 0.0), EPSILON, 1.0 - EPSILON);
    let total0 = parse_number(t0, 0.0).max(0.0);
    let usable0 = total0 * (1.0 - ratio0);
    let virtual0 = total0 * ratio0;

    let (total1, usable1) = match mode {
        FixMode::AreaFixed => (usable0 / (1.0 - ratio1), usable0),
        FixMode::TotalFixed => (total0, total0 * (1.0 - ratio1)),
    };
    // floating residue may leave a tiny negative
    let virtual1 = (total1 - usable1).max(0.0);

    AreaState {
        ratio0,
        ratio1,
        total0,
        total1,
        usable0,
        usable1,
        virtual0,
        virtual1,
    }
}

/// After-minus-before deltas. Negative means the quantity decreased.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AreaDiff {
    pub usable: f64,
    #[serde(rename = "virtual")]
    pub virtual_area: f64,
    pub total: f64,
}

pub fn compute_diff(area: &AreaState) -> AreaDiff {
    AreaDiff {
        usable: area.usable1 - area.usable0,
        virtual_area: area.virtual1 - area.virtual0,
        total: area.total1 - area.total0,
    }
}

/// True when the current shrink or the sampled maximum approaches divergence.
pub fn compute_k_near_limit<K: Into<RawNumber>>(k_current: f64, k_max: K) -> bool {
    parse_number(k_current, 0.0) >= RATIO_WARNING_THRESHOLD
        || parse_number(k_max, 0.0) >= RATIO_WARNING_THRESHOLD
}

/// True when either phantom ratio sits near the degenerate boundary.
pub fn compute_ratio_warning(area: &AreaState) -> bool {
    area.ratio0 >= RATIO_WARNING_THRESHOLD || area.ratio1 >= RATIO_WARNING_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn parse_number_accepts_numbers_and_numeric_text() {
        assert_eq!(parse_number(0.35, 0.0), 0.35);
        assert_eq!(parse_number("1000", 0.0), 1000.0);
        assert_eq!(parse_number(" 2.5 ", 0.0), 2.5);
        assert_eq!(parse_number("-3", 0.0), -3.0);
        assert_eq!(parse_number("0x10", 0.0), 16.0);
        assert_eq!(parse_number(" 0b101 ", 0.0), 5.0);
        assert_eq!(parse_number("0O17", 0.0), 15.0);
    }

    #[test]
    fn parse_number_falls_back_on_garbage() {
        assert_eq!(parse_number("", 7.0), 7.0);
        assert_eq!(parse_number("abc", 7.0), 7.0);
        assert_eq!(parse_number("NaN", 7.0), 7.0);
        assert_eq!(parse_number("inf", 7.0), 7.0);
        assert_eq!(parse_number("0x", 7.0), 7.0);
        assert_eq!(parse_number("-0x10", 7.0), 7.0);
        assert_eq!(parse_number("0b12", 7.0), 7.0);
        assert_eq!(parse_number(f64::NAN, 7.0), 7.0);
        assert_eq!(parse_number(f64::NEG_INFINITY, 7.0), 7.0);
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp(-1.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(2.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(0.4, 0.0, 1.0), 0.4);
    }

    #[test]
    fn round_dp_half_away_from_zero() {
        assert!((round_dp(34.615384615, 3) - 34.615).abs() < 1e-9);
        assert_eq!(round_dp(0.15000000000000002, 2), 0.15);
        assert_eq!(round_dp(0.125, 2), 0.13);
        assert!(round_dp(f64::INFINITY, 2).is_infinite());
    }

    #[test]
    fn round_dp_uses_the_stored_binary_value() {
        // both literals sit just below their midpoints once stored
        assert_eq!(round_dp(1.0005, 3), 1.0);
        assert!((round_dp(2.675, 2) - 2.67).abs() < 1e-12);
        assert!((round_dp(-2.675, 2) + 2.67).abs() < 1e-12);
    }

    #[test]
    fn area_fixed_scenario() {
        let a = compute_area(0.35, 0.25, 1000.0, FixMode::AreaFixed);
        assert!(approx(a.usable0, 650.0));
        assert!(approx(a.virtual0, 350.0));
        assert!(approx(a.usable1, 650.0));
        assert!((a.total1 - 866.667).abs() < 1e-3);
        assert!((a.virtual1 - 216.667).abs() < 1e-3);
    }

    #[test]
    fn total_fixed_scenario() {
        let a = compute_area(0.35, 0.25, 1000.0, FixMode::TotalFixed);
        assert!(approx(a.total1, 1000.0));
        assert!(approx(a.usable1, 750.0));
        assert!(approx(a.virtual1, 250.0));
    }

    #[test]
    fn ratios_are_clamped_and_total_floored() {
        let a = compute_area(-0.5, 1.5, -10.0, FixMode::AreaFixed);
        assert_eq!(a.ratio0, EPSILON);
        assert_eq!(a.ratio1, 1.0 - EPSILON);
        assert_eq!(a.total0, 0.0);
        assert_eq!(a.total1, 0.0);
        assert_eq!(a.virtual1, 0.0);
    }

    #[test]
    fn text_inputs_are_sanitized() {
        let a = compute_area("0.35", "oops", "", FixMode::TotalFixed);
        assert_eq!(a.ratio0, 0.35);
        assert_eq!(a.ratio1, EPSILON);
        assert_eq!(a.total0, 0.0);
    }

    #[test]
    fn diff_is_after_minus_before() {
        let a = compute_area(0.35, 0.25, 1000.0, FixMode::TotalFixed);
        let d = compute_diff(&a);
        assert!(approx(d.usable, 100.0));
        assert!(approx(d.virtual_area, -100.0));
        assert!(approx(d.total, 0.0));
    }

    #[test]
    fn ratio_warning_threshold() {
        let hot = compute_area(0.985, 0.25, 1000.0, FixMode::TotalFixed);
        assert!(compute_ratio_warning(&hot));
        let calm = compute_area(0.5, 0.25, 1000.0, FixMode::TotalFixed);
        assert!(!compute_ratio_warning(&calm));
    }

    #[test]
    fn k_near_limit_checks_both_values() {
        assert!(compute_k_near_limit(0.99, 0.3));
        assert!(compute_k_near_limit(0.1, "0.98"));
        assert!(!compute_k_near_limit(0.1, 0.3));
        assert!(!compute_k_near_limit(0.1, "junk"));
    }

    #[test]
    fn tags_round_trip() {
        for m in [FixMode::AreaFixed, FixMode::TotalFixed] {
            assert_eq!(m.as_tag().parse::<FixMode>().unwrap(), m);
        }
        for b in [SalesBasis::Total, SalesBasis::Usable] {
            assert_eq!(b.as_tag().parse::<SalesBasis>().unwrap(), b);
        }
        for u in [AreaUnit::SquareMeter, AreaUnit::Ping] {
            assert_eq!(u.as_tag().parse::<AreaUnit>().unwrap(), u);
        }
        let err = "X".parse::<FixMode>().unwrap_err();
        assert_eq!(err.kind, "mode");
    }

    #[test]
    fn raw_inputs_fill_missing_fields_with_defaults() {
        let inputs: RawInputs =
            serde_json::from_str(r#"{"r0": "0.4", "mode": "T", "P0": 50}"#).unwrap();
        assert_eq!(inputs.r0, RawNumber::Text("0.4".to_string()));
        assert_eq!(inputs.mode, FixMode::TotalFixed);
        assert_eq!(inputs.p0, RawNumber::Number(50.0));
        assert_eq!(inputs.t0, RawNumber::Number(1000.0));
        assert_eq!(inputs.basis, SalesBasis::Total);
    }

    proptest! {
        #[test]
        fn area_is_conserved(r0 in -0.5f64..1.5, r1 in -0.5f64..1.5, t0 in 0.0f64..1e7, fixed_total in any::<bool>()) {
            let mode = if fixed_total { FixMode::TotalFixed } else { FixMode::AreaFixed };
            let a = compute_area(r0, r1, t0, mode);
            prop_assert!(approx(a.total0, a.usable0 + a.virtual0));
            prop_assert!(approx(a.total1, a.usable1 + a.virtual1));
            prop_assert!(a.virtual0 >= 0.0 && a.virtual1 >= 0.0);
        }

        #[test]
        fn unchanged_ratio_is_a_no_op(r in 0.0f64..0.95, t0 in 1.0f64..1e6, fixed_total in any::<bool>()) {
            let mode = if fixed_total { FixMode::TotalFixed } else { FixMode::AreaFixed };
            let a = compute_area(r, r, t0, mode);
            prop_assert!(approx(a.usable1, a.usable0));
            prop_assert!(approx(a.total1, a.total0));
        }

        #[test]
        fn ping_round_trip(v in 0.001f64..1e9) {
            prop_assert!(approx(from_ping(to_ping(v)), v));
        }
    }
}
