use std::time::Duration;

use chrono::{DateTime, Utc};

/// One completed application-layer request.
///
/// Returned by value from the fetch probe; nothing about the request is kept
/// anywhere else.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub status: u16,
    /// Upper-case protocol label, e.g. `HTTP/1.1` or `HTTP/2`.
    pub http_version: String,
    pub content_bytes: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Monotonic duration of the request, body included.
    pub elapsed: Duration,
}

/// Transfer rate in kilobits per second, rounded to two decimals.
///
/// `-1.0` when there is no result or the request took no measurable time.
pub fn download_speed_kbps(result: Option<&FetchResult>) -> f64 {
    let Some(result) = result else {
        return -1.0;
    };
    let seconds = result.elapsed.as_secs_f64();
    if seconds == 0.0 {
        return -1.0;
    }
    let bits = (result.content_bytes * 8) as f64;
    round2(bits / seconds / 1024.0)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
