#![deny(warnings)]

//! Dashboard view-model for the reform calculator.
//!
//! Reshapes area and sales results into display-ready series and bundles
//! everything the presentation layer needs into one immutable snapshot.

pub mod format;

use reform_core::{
    compute_area, compute_diff, compute_k_near_limit, compute_ratio_warning, AreaDiff, AreaState,
    AreaUnit, FixMode, RawInputs, SalesBasis,
};
use reform_econ::{
    build_sensitivity_data, compute_sales, summarize_sensitivity, SalesState, SensitivityRow,
    SensitivitySummary,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// One slice of the before-reform composition donut.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DonutSlice {
    pub name: String,
    pub value: f64,
}

/// One stacked bar: phantom on top of usable area.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarGroup {
    pub name: String,
    #[serde(rename = "虛坪")]
    pub virtual_area: f64,
    #[serde(rename = "實坪")]
    pub usable_area: f64,
}

/// Before-reform composition, phantom slice first.
pub fn build_donut_data(area: &AreaState, unit: AreaUnit) -> Vec<DonutSlice> {
    vec![
        DonutSlice {
            name: "改革前虛坪".to_string(),
            value: unit.display(area.virtual0),
        },
        DonutSlice {
            name: "改革前實坪".to_string(),
            value: unit.display(area.usable0),
        },
    ]
}

/// Before and after groups for the stacked bar chart.
pub fn build_bar_data(area: &AreaState, unit: AreaUnit) -> Vec<BarGroup> {
    vec![
        BarGroup {
            name: "改革前".to_string(),
            virtual_area: unit.display(area.virtual0),
            usable_area: unit.display(area.usable0),
        },
        BarGroup {
            name: "改革後".to_string(),
            virtual_area: unit.display(area.virtual1),
            usable_area: unit.display(area.usable1),
        },
    ]
}

/// Single-row scenario table. Areas are in the display unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRow {
    pub mode: FixMode,
    pub basis: SalesBasis,
    pub unit: AreaUnit,
    pub ratio0: f64,
    pub ratio1: f64,
    pub total0: f64,
    pub total1: f64,
    pub usable0: f64,
    pub usable1: f64,
    pub virtual0: f64,
    pub virtual1: f64,
    pub k_current: f64,
    pub p0: f64,
    pub p1: f64,
    pub delta: f64,
}

pub fn build_scenario_row(inputs: &RawInputs, area: &AreaState, sales: &SalesState) -> ScenarioRow {
    let unit = inputs.unit;
    ScenarioRow {
        mode: inputs.mode,
        basis: inputs.basis,
        unit,
        ratio0: area.ratio0,
        ratio1: area.ratio1,
        total0: unit.display(area.total0),
        total1: unit.display(area.total1),
        usable0: unit.display(area.usable0),
        usable1: unit.display(area.usable1),
        virtual0: unit.display(area.virtual0),
        virtual1: unit.display(area.virtual1),
        k_current: sales.k_current,
        p0: sales.p0,
        p1: sales.p1,
        delta: sales.delta,
    }
}

/// Everything the presentation layer renders for one set of inputs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub unit: AreaUnit,
    pub area: AreaState,
    pub sales: SalesState,
    pub donut: Vec<DonutSlice>,
    pub bar: Vec<BarGroup>,
    pub sensitivity: Vec<SensitivityRow>,
    pub summary: SensitivitySummary,
    pub scenario: ScenarioRow,
    pub diff: AreaDiff,
    /// Current or sampled shrink is close to price divergence.
    pub k_near_limit: bool,
    /// A phantom ratio is close to the degenerate boundary.
    pub ratio_warning: bool,
}

/// Compose the area model, sales model, diagnostics and chart series.
///
/// Pure: identical inputs always produce an identical snapshot.
pub fn build_dashboard(inputs: &RawInputs) -> DashboardSnapshot {
    let area = compute_area(&inputs.r0, &inputs.r1, &inputs.t0, inputs.mode);
    let sales = compute_sales(inputs.basis, &area, &inputs.p0);
    let donut = build_donut_data(&area, inputs.unit);
    let bar = build_bar_data(&area, inputs.unit);
    let sensitivity = build_sensitivity_data(&inputs.k_max, &inputs.k_step, &inputs.p0);
    let summary = summarize_sensitivity(&sensitivity, &inputs.k_max, &inputs.p0);
    let scenario = build_scenario_row(inputs, &area, &sales);
    let diff = compute_diff(&area);
    let k_near_limit = compute_k_near_limit(sales.k_current, &inputs.k_max);
    let ratio_warning = compute_ratio_warning(&area);
    debug!(
        mode = inputs.mode.as_tag(),
        basis = inputs.basis.as_tag(),
        k_current = sales.k_current,
        samples = sensitivity.len(),
        k_near_limit,
        ratio_warning,
        "dashboard rebuilt"
    );
    DashboardSnapshot {
        unit: inputs.unit,
        area,
        sales,
        donut,
        bar,
        sensitivity,
        summary,
        scenario,
        diff,
        k_near_limit,
        ratio_warning,
    }
}

/// Remembers the snapshot for the most recent inputs.
///
/// Purely an optimization: a hit returns exactly what `build_dashboard`
/// would have produced.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    last: Option<(RawInputs, Arc<DashboardSnapshot>)>,
    hits: u64,
    misses: u64,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&mut self, inputs: &RawInputs) -> Arc<DashboardSnapshot> {
        if let Some((cached_inputs, snap)) = &self.last {
            if cached_inputs == inputs {
                self.hits += 1;
                return Arc::clone(snap);
            }
        }
        self.misses += 1;
        let snap = Arc::new(build_dashboard(inputs));
        self.last = Some((inputs.clone(), Arc::clone(&snap)));
        snap
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}
