pub mod assembler;
pub mod model;

pub use assembler::{MetricsOutcome, ReportAssembler};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Pretty-print a report with four-space indentation.
pub fn to_pretty_json<T: Serialize>(report: &T) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    report.serialize(&mut serializer)?;
    // serde_json only ever writes valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
