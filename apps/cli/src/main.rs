#![deny(warnings)]

//! Headless CLI: build a reform dashboard snapshot and print it.

mod report;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use reform_core::{RawInputs, RawNumber};
use reform_view::format::Locale;
use scenario_kit::{apply_query, encode_query, ScenarioLibrary};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    scenario: Option<String>,
    scenarios_dir: Option<PathBuf>,
    query: Option<String>,
    /// `(field, value)` pairs from explicit flags, applied last.
    overrides: Vec<(String, String)>,
    locale: Locale,
    json: bool,
    list: bool,
}

const VALUE_FLAGS: &[(&str, &str)] = &[
    ("--r0", "r0"),
    ("--r1", "r1"),
    ("--t0", "t0"),
    ("--p0", "P0"),
    ("--k-max", "kMax"),
    ("--k-step", "kStep"),
    ("--mode", "mode"),
    ("--unit", "unit"),
    ("--basis", "basis"),
];

fn parse_args(mut it: impl Iterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--scenario" => args.scenario = it.next(),
            "--scenarios-dir" => args.scenarios_dir = it.next().map(PathBuf::from),
            "--query" => args.query = it.next(),
            "--locale" => {
                let tag = it.next().context("--locale needs a value")?;
                args.locale = tag.parse()?;
            }
            "--json" => args.json = true,
            "--list" => args.list = true,
            flag => match VALUE_FLAGS.iter().find(|(f, _)| *f == flag) {
                Some((_, field)) => {
                    let Some(value) = it.next() else {
                        bail!("{flag} needs a value");
                    };
                    args.overrides.push((field.to_string(), value));
                }
                None => warn!(flag, "ignoring unknown argument"),
            },
        }
    }
    Ok(args)
}

fn load_library(args: &Args) -> Result<ScenarioLibrary> {
    match &args.scenarios_dir {
        Some(dir) => {
            let mut lib = ScenarioLibrary::new(dir);
            lib.load_all()
                .with_context(|| format!("loading presets from {}", dir.display()))?;
            Ok(lib)
        }
        None => Ok(ScenarioLibrary::builtin()),
    }
}

/// Defaults, then preset, then query string, then explicit flags.
fn resolve_inputs(args: &Args, library: &ScenarioLibrary) -> Result<RawInputs> {
    let mut inputs = match &args.scenario {
        Some(id) => library.get(id)?.inputs.clone(),
        None => RawInputs::default(),
    };
    if let Some(query) = &args.query {
        apply_query(&mut inputs, query);
    }
    for (field, value) in &args.overrides {
        match field.as_str() {
            "mode" => inputs.mode = value.parse()?,
            "unit" => inputs.unit = value.parse()?,
            "basis" => inputs.basis = value.parse()?,
            "r0" => inputs.r0 = RawNumber::from(value.as_str()),
            "r1" => inputs.r1 = RawNumber::from(value.as_str()),
            "t0" => inputs.t0 = RawNumber::from(value.as_str()),
            "P0" => inputs.p0 = RawNumber::from(value.as_str()),
            "kMax" => inputs.k_max = RawNumber::from(value.as_str()),
            "kStep" => inputs.k_step = RawNumber::from(value.as_str()),
            _ => {}
        }
    }
    Ok(inputs)
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: chrono::DateTime<Utc>,
    share_query: String,
    inputs: &'a RawInputs,
    snapshot: &'a reform_view::DashboardSnapshot,
}

fn main() -> Result<()> {
    // Logging setup; stdout is reserved for the report
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    info!(scenario = ?args.scenario, query = ?args.query, "starting CLI");

    let library = load_library(&args)?;
    if args.list {
        for loaded in library.presets() {
            let p = &loaded.preset;
            println!("{}\t{}\t{}", p.id, p.name, p.description.as_deref().unwrap_or(""));
        }
        return Ok(());
    }

    let inputs = resolve_inputs(&args, &library)?;
    let snap = reform_view::build_dashboard(&inputs);
    if snap.k_near_limit {
        warn!(k_current = snap.sales.k_current, "shrink fraction near divergence");
    }
    if snap.ratio_warning {
        warn!(
            ratio0 = snap.area.ratio0,
            ratio1 = snap.area.ratio1,
            "phantom ratio near boundary"
        );
    }

    let share_query = encode_query(&inputs);
    if args.json {
        let out = JsonReport {
            generated_at: Utc::now(),
            share_query,
            inputs: &inputs,
            snapshot: &snap,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        let report = report::Report {
            inputs: &inputs,
            snap: &snap,
            share_query: &share_query,
            locale: args.locale,
        };
        print!("{report}");
    }
    Ok(())
}
