//! Share-link codec: `RawInputs` <-> URL query string.
//!
//! Numbers travel as their shortest round-trip decimal string and enums as
//! their tags. Decoding never fails; unknown keys and tags are skipped.

use reform_core::{RawInputs, RawNumber};
use tracing::warn;

/// Serialize inputs as `r0=..&r1=..&t0=..&mode=..&unit=..&basis=..&P0=..&kMax=..&kStep=..`.
pub fn encode_query(inputs: &RawInputs) -> String {
    let pairs = [
        ("r0", inputs.r0.to_string()),
        ("r1", inputs.r1.to_string()),
        ("t0", inputs.t0.to_string()),
        ("mode", inputs.mode.as_tag().to_string()),
        ("unit", inputs.unit.as_tag().to_string()),
        ("basis", inputs.basis.as_tag().to_string()),
        ("P0", inputs.p0.to_string()),
        ("kMax", inputs.k_max.to_string()),
        ("kStep", inputs.k_step.to_string()),
    ];
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Parse a query string over the default inputs. A leading `?` is allowed.
pub fn decode_query(query: &str) -> RawInputs {
    let mut inputs = RawInputs::default();
    apply_query(&mut inputs, query);
    inputs
}

/// Overwrite only the fields present in `query`.
pub fn apply_query(inputs: &mut RawInputs, query: &str) {
    let query = query.strip_prefix('?').unwrap_or(query);
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = percent_decode(raw_key);
        let value = percent_decode(raw_value);
        match key.as_str() {
            "r0" => inputs.r0 = decode_number(value),
            "r1" => inputs.r1 = decode_number(value),
            "t0" => inputs.t0 = decode_number(value),
            "P0" | "p0" => inputs.p0 = decode_number(value),
            "kMax" => inputs.k_max = decode_number(value),
            "kStep" => inputs.k_step = decode_number(value),
            "mode" => match value.parse() {
                Ok(mode) => inputs.mode = mode,
                Err(e) => warn!(error = %e, "keeping default mode"),
            },
            "unit" => match value.parse() {
                Ok(unit) => inputs.unit = unit,
                Err(e) => warn!(error = %e, "keeping default unit"),
            },
            "basis" => match value.parse() {
                Ok(basis) => inputs.basis = basis,
                Err(e) => warn!(error = %e, "keeping default basis"),
            },
            other => warn!(key = other, "ignoring unknown query key"),
        }
    }
}

// finite numbers become numbers; anything else stays text for parse_number
fn decode_number(value: String) -> RawNumber {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => RawNumber::Number(v),
        _ => RawNumber::Text(value),
    }
}

// `+` is a space in form-encoded queries; bad escapes pass through as-is
fn percent_decode(s: &str) -> String {
    let spaced = s.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}
