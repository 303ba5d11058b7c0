use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::probe::ProbeOutcome;

const SECONDS_PER_DAY: i64 = 86_400;

/// Validity of the leaf certificate presented by the target.
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateInfo {
    pub not_after: DateTime<Utc>,
    /// Whole days until expiry, rounded down. Negative once expired.
    pub days_left: i64,
}

impl CertificateInfo {
    pub fn new(not_after: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let days_left = (not_after - now).num_seconds().div_euclid(SECONDS_PER_DAY);
        Self {
            not_after,
            days_left,
        }
    }
}

/// The `ssl_certificate` section of the metrics report. Both fields fall back
/// to `"N/A"` together; why the inspection failed is not reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateStatus {
    pub ssl_expiry_date: ProbeOutcome<String>,
    pub days_left: ProbeOutcome<i64>,
}

impl From<ProbeOutcome<CertificateInfo>> for CertificateStatus {
    fn from(outcome: ProbeOutcome<CertificateInfo>) -> Self {
        match outcome {
            ProbeOutcome::Ok(info) => Self {
                ssl_expiry_date: ProbeOutcome::Ok(info.not_after.format("%Y-%m-%d").to_string()),
                days_left: ProbeOutcome::Ok(info.days_left),
            },
            ProbeOutcome::Unavailable => Self {
                ssl_expiry_date: ProbeOutcome::Unavailable,
                days_left: ProbeOutcome::Unavailable,
            },
        }
    }
}
