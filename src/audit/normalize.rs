//! Turns PageSpeed `displayValue` strings into numbers.
//!
//! Values arrive formatted for humans (`"1.2\u{a0}s"`, `"340\u{a0}ms"`,
//! `"0.05"`, `"Root document took 80\u{a0}ms"`). Parsers are tried in a fixed
//! order and the first one that yields a number wins; durations come out in
//! milliseconds. When none match, the original string is returned untouched.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::probe::NOT_AVAILABLE;

static EMBEDDED_MS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+\.?[0-9]*)\s*ms").expect("static regex"));

/// A normalized audit value: a number when any parser matched, otherwise the raw text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AuditValue {
    Number(f64),
    Text(String),
}

type Parser = fn(&str) -> Option<f64>;

/// Tried in order against the cleaned value.
const PARSERS: [(&str, Parser); 4] = [
    ("suffix-ms", suffix_millis),
    ("suffix-s", suffix_seconds),
    ("bare-numeric", bare_numeric),
    ("embedded-ms", embedded_millis),
];

pub fn normalize(raw: &str) -> AuditValue {
    let cleaned = clean(raw);
    PARSERS
        .iter()
        .find_map(|(name, parse)| {
            let parsed = parse(&cleaned)?;
            log::trace!("[audit] {raw:?} parsed as {name}: {parsed}");
            Some(parsed)
        })
        .map_or_else(|| AuditValue::Text(raw.to_string()), AuditValue::Number)
}

/// Normalize a JSON `displayValue`. Numbers pass through; anything that is
/// neither a string nor a number reports as `"N/A"`.
pub fn normalize_value(value: &Value) -> AuditValue {
    match value {
        Value::String(s) => normalize(s),
        Value::Number(n) => n
            .as_f64()
            .map_or_else(|| AuditValue::Text(n.to_string()), AuditValue::Number),
        _ => AuditValue::Text(NOT_AVAILABLE.to_string()),
    }
}

/// Drop (narrow) no-break spaces, trim and lowercase.
fn clean(raw: &str) -> String {
    raw.replace(['\u{a0}', '\u{202f}'], "").trim().to_lowercase()
}

fn suffix_millis(value: &str) -> Option<f64> {
    value.strip_suffix("ms")?.trim().parse().ok()
}

fn suffix_seconds(value: &str) -> Option<f64> {
    if value.ends_with("ms") {
        return None;
    }
    let seconds: f64 = value.strip_suffix('s')?.trim().parse().ok()?;
    Some(seconds * 1000.0)
}

fn bare_numeric(value: &str) -> Option<f64> {
    if value.ends_with('s') {
        return None;
    }
    value.parse().ok()
}

fn embedded_millis(value: &str) -> Option<f64> {
    EMBEDDED_MS.captures(value)?.get(1)?.as_str().parse().ok()
}
