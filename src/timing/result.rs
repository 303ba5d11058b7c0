use serde::Serialize;

use crate::http_probe::result::round2;

/// Cumulative clock readings in seconds, each measured from the start of the
/// request up to the end of a connection phase.
///
/// `appconnect` stays at zero when no TLS handshake happens.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseClock {
    pub namelookup: f64,
    pub connect: f64,
    pub appconnect: f64,
    pub starttransfer: f64,
    pub total: f64,
}

impl PhaseClock {
    /// Fold in the clock of a followed redirect hop; times across hops add up.
    pub fn accumulate(&mut self, hop: &PhaseClock) {
        self.namelookup += hop.namelookup;
        self.connect += hop.connect;
        self.appconnect += hop.appconnect;
        self.starttransfer += hop.starttransfer;
        self.total += hop.total;
    }
}

/// Per-phase durations of one request, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseTimings {
    pub dns_time_ms: f64,
    pub tcp_connect_time_ms: f64,
    /// `appconnect - connect`. Not clamped: a negative value is reported as measured.
    pub ssl_handshake_time_ms: f64,
    pub ttfb_ms: f64,
    pub http_code: u16,
    pub total_load_time_ms: f64,
    pub page_size_bytes: usize,
}

impl PhaseTimings {
    pub fn from_clock(clock: &PhaseClock, http_code: u16, page_size_bytes: usize) -> Self {
        Self {
            dns_time_ms: millis(clock.namelookup),
            tcp_connect_time_ms: millis(clock.connect),
            ssl_handshake_time_ms: millis(clock.appconnect - clock.connect),
            ttfb_ms: millis(clock.starttransfer),
            http_code,
            total_load_time_ms: millis(clock.total),
            page_size_bytes,
        }
    }
}

fn millis(seconds: f64) -> f64 {
    round2(seconds * 1000.0)
}
