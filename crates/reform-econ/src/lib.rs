#![deny(warnings)]

//! Price models for the phantom-area reform calculator.
//!
//! Total sale revenue `R = P × S` is assumed fixed across the reform, so a
//! shrinking sellable area `S` forces the unit price `P` up:
//! - Shrink fraction and compensating price for a chosen sales basis
//! - Sampled sensitivity curve `P1(k) = P0 / (1 - k)`
//! - Summary of the sampled curve for reports

use reform_core::{clamp, parse_number, round_dp, AreaState, RawNumber, SalesBasis, EPSILON};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Smallest and largest accepted sampling steps.
pub const MIN_K_STEP: f64 = 0.01;
pub const MAX_K_STEP: f64 = 0.5;

/// Additive slack so the last intended sample survives step accumulation.
const K_TOLERANCE: f64 = 1e-9;

/// Price response to the area change implied by the sales basis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SalesState {
    /// Sellable area before the reform, per basis.
    pub s0: f64,
    /// Sellable area after the reform, per basis.
    pub s1: f64,
    /// Unclamped shrink fraction; negative when area grew.
    pub raw_k: f64,
    /// Shrink fraction in `[0, 1 - EPSILON]`.
    pub k_current: f64,
    pub p0: f64,
    pub p1: f64,
    /// Relative price increase, `p1 / p0 - 1`.
    pub delta: f64,
}

/// Compute the compensating unit price for a fixed total revenue.
///
/// Only shrink is modeled: when the selected area grows, `k_current` is
/// floored at zero and the price is reported unchanged.
pub fn compute_sales<P: Into<RawNumber>>(basis: SalesBasis, area: &AreaState, p0: P) -> SalesState {
    let (s0, s1) = match basis {
        SalesBasis::Total => (area.total0, area.total1),
        SalesBasis::Usable => (area.usable0, area.usable1),
    };
    let raw_k = if s0 > 0.0 { 1.0 - s1 / s0 } else { 0.0 };
    let k_current = clamp(raw_k, 0.0, 1.0 - EPSILON);
    if raw_k < 0.0 {
        debug!(raw_k, ?basis, "area grew; price held at P0");
    }
    let p0 = parse_number(p0, 0.0);
    let factor = 1.0 / (1.0 - k_current);
    SalesState {
        s0,
        s1,
        raw_k,
        k_current,
        p0,
        p1: p0 * factor,
        delta: factor - 1.0,
    }
}

/// Price required at shrink fraction `k`.
pub fn price_at(p0: f64, k: f64) -> f64 {
    p0 / (1.0 - k)
}

/// One sample of the sensitivity curve, rounded for display.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRow {
    pub k: f64,
    #[serde(rename = "P1")]
    pub p1: f64,
}

/// Lazy sampler over `k ∈ [0, k_max]`.
///
/// The unrounded `k` drives stepping; only the yielded rows are rounded.
#[derive(Clone, Debug)]
pub struct SensitivityCurve {
    k: f64,
    max: f64,
    step: f64,
    p0: f64,
}

impl SensitivityCurve {
    /// Clamped upper bound of `k`.
    pub fn max_k(&self) -> f64 {
        self.max
    }

    /// Clamped sampling step.
    pub fn step_k(&self) -> f64 {
        self.step
    }
}

impl Iterator for SensitivityCurve {
    type Item = SensitivityRow;

    fn next(&mut self) -> Option<Self::Item> {
        if self.k > self.max + K_TOLERANCE {
            return None;
        }
        let k = self.k;
        self.k += self.step;
        Some(SensitivityRow {
            k: round_dp(k, 2),
            p1: round_dp(price_at(self.p0, k), 3),
        })
    }
}

/// Build the sampler for `P1(k)` from as-entered parameters.
///
/// `k_max` is clamped to `[0, 1 - EPSILON]` and `k_step` to
/// `[MIN_K_STEP, MAX_K_STEP]`, so the sequence is always finite.
pub fn sensitivity_curve<M, S, P>(k_max: M, k_step: S, p0: P) -> SensitivityCurve
where
    M: Into<RawNumber>,
    S: Into<RawNumber>,
    P: Into<RawNumber>,
{
    SensitivityCurve {
        k: 0.0,
        max: clamp(parse_number(k_max, 0.0), 0.0, 1.0 - EPSILON),
        step: clamp(parse_number(k_step, MIN_K_STEP), MIN_K_STEP, MAX_K_STEP),
        p0: parse_number(p0, 0.0),
    }
}

/// Collected sensitivity rows for charting.
pub fn build_sensitivity_data<M, S, P>(k_max: M, k_step: S, p0: P) -> Vec<SensitivityRow>
where
    M: Into<RawNumber>,
    S: Into<RawNumber>,
    P: Into<RawNumber>,
{
    sensitivity_curve(k_max, k_step, p0).collect()
}

/// Headline figures of a sampled curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensitivitySummary {
    /// Requested maximum shrink as entered (unclamped).
    pub k_max: f64,
    /// Price at the last sample, or `P0` when nothing was sampled.
    pub peak_p1: f64,
    /// `peak_p1 / P0`; 1 when `P0` is not positive.
    pub peak_multiplier: f64,
}

pub fn summarize_sensitivity<M, P>(rows: &[SensitivityRow], k_max: M, p0: P) -> SensitivitySummary
where
    M: Into<RawNumber>,
    P: Into<RawNumber>,
{
    let p0 = parse_number(p0, 0.0);
    let peak_p1 = rows.last().map(|r| r.p1).unwrap_or(p0);
    let peak_multiplier = if p0 > 0.0 { peak_p1 / p0 } else { 1.0 };
    SensitivitySummary {
        k_max: parse_number(k_max, 0.0),
        peak_p1,
        peak_multiplier,
    }
}
