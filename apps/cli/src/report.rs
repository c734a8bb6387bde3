//! Plain-text rendering of a dashboard snapshot.

use reform_core::RawInputs;
use reform_view::format::{format_number, format_percent, Locale};
use reform_view::DashboardSnapshot;
use std::fmt;

/// Sectioned report: structure, price sensitivity, diff summary, warnings.
pub struct Report<'a> {
    pub inputs: &'a RawInputs,
    pub snap: &'a DashboardSnapshot,
    pub share_query: &'a str,
    pub locale: Locale,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Report {
            inputs,
            snap,
            share_query,
            locale,
        } = *self;
        let unit = snap.unit.symbol();
        let num = |v: f64| format_number(v, 2, locale);
        let pct = |v: f64| format_percent(v, 1, locale);
        let area = &snap.scenario;

        writeln!(f, "虛坪改革試算")?;
        writeln!(f)?;
        writeln!(f, "1｜改革前後結構（口徑：{}）", inputs.mode.label())?;
        writeln!(f, "  改革前虛坪率  {}", pct(snap.area.ratio0))?;
        writeln!(f, "  改革後虛坪率  {}", pct(snap.area.ratio1))?;
        for slice in &snap.donut {
            writeln!(f, "  {}  {} {unit}", slice.name, num(slice.value))?;
        }
        for group in &snap.bar {
            writeln!(
                f,
                "  {}  實坪 {} {unit} / 虛坪 {} {unit}",
                group.name,
                num(group.usable_area),
                num(group.virtual_area)
            )?;
        }

        writeln!(f)?;
        let sales = &snap.sales;
        writeln!(
            f,
            "2｜總銷固定：單價上調敏感度（計價面積：{}）",
            inputs.basis.label()
        )?;
        writeln!(
            f,
            "  S0 → S1     {} → {} {unit}",
            num(snap.unit.display(sales.s0)),
            num(snap.unit.display(sales.s1))
        )?;
        writeln!(f, "  面積縮減 k  {}", pct(sales.k_current))?;
        writeln!(
            f,
            "  P0 → P1     {} → {}",
            num(sales.p0),
            format_number(sales.p1, 3, locale)
        )?;
        writeln!(f, "  單價上調    {}", pct(sales.delta))?;
        writeln!(f, "  {:>6}  {:>12}", "k", "P1")?;
        for row in &snap.sensitivity {
            writeln!(
                f,
                "  {:>6}  {:>12}",
                format_number(row.k, 2, locale),
                format_number(row.p1, 3, locale)
            )?;
        }
        writeln!(
            f,
            "  kMax {}，最高單價倍數 {}×",
            pct(snap.summary.k_max),
            format_number(snap.summary.peak_multiplier, 3, locale)
        )?;

        writeln!(f)?;
        writeln!(f, "3｜差異摘要")?;
        let diffs = [
            ("實坪", area.usable0, area.usable1, snap.diff.usable),
            ("虛坪", area.virtual0, area.virtual1, snap.diff.virtual_area),
            ("總面積", area.total0, area.total1, snap.diff.total),
        ];
        for (label, before, after, delta) in diffs {
            writeln!(
                f,
                "  {label}  {} → {} {unit}（{}）",
                num(before),
                num(after),
                num(snap.unit.display(delta))
            )?;
        }

        if snap.k_near_limit || snap.ratio_warning {
            writeln!(f)?;
        }
        if snap.k_near_limit {
            writeln!(f, "! k 接近 1，單價將急遽發散")?;
        }
        if snap.ratio_warning {
            writeln!(f, "! 虛坪率接近 100%，面積回推不穩定")?;
        }

        writeln!(f)?;
        writeln!(f, "分享參數  ?{share_query}")
    }
}
