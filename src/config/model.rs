use std::time::Duration;

use serde::Deserialize;

/// Probe settings. Every field has a default, so an empty YAML document (or no
/// file at all) yields the stock behaviour.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `User-Agent` sent by every probe that speaks HTTP.
    pub user_agent: String,

    /// Timeout for the timed application-layer fetch.
    pub fetch_timeout_secs: u64,

    /// Connection-phase probe: budget for name resolution, TCP connect and TLS handshake.
    pub phase_connect_timeout_secs: u64,

    /// Connection-phase probe: budget for the whole transfer, redirects included.
    pub phase_total_timeout_secs: u64,

    /// Timeout for the raw TLS connection used to read the certificate.
    pub cert_timeout_secs: u64,

    /// Timeout for the geo-IP lookup service.
    pub geo_timeout_secs: u64,

    /// Timeout for each PageSpeed strategy request.
    pub audit_timeout_secs: u64,

    /// Timeout for each remote-browser `/status` health check.
    pub browser_status_timeout_secs: u64,

    /// Redirect limit shared by both HTTP probes.
    pub max_redirects: usize,

    /// Base URL of the geo-IP service; the IP is appended as a path segment.
    pub geo_endpoint: String,

    /// PageSpeed Insights `runPagespeed` endpoint.
    pub audit_endpoint: String,

    /// Name servers for the connection-phase probe. Empty means the system configuration.
    pub dns_hosts: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_agent: concat!("siteprobe/", env!("CARGO_PKG_VERSION")).to_string(),
            fetch_timeout_secs: 10,
            phase_connect_timeout_secs: 10,
            phase_total_timeout_secs: 20,
            cert_timeout_secs: 5,
            geo_timeout_secs: 5,
            audit_timeout_secs: 60,
            browser_status_timeout_secs: 2,
            max_redirects: 10,
            geo_endpoint: "http://ip-api.com/json".to_string(),
            audit_endpoint: "https://www.googleapis.com/pagespeedonline/v5/runPagespeed"
                .to_string(),
            dns_hosts: Vec::new(),
        }
    }
}

impl Settings {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn phase_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.phase_connect_timeout_secs)
    }

    pub fn phase_total_timeout(&self) -> Duration {
        Duration::from_secs(self.phase_total_timeout_secs)
    }

    pub fn cert_timeout(&self) -> Duration {
        Duration::from_secs(self.cert_timeout_secs)
    }

    pub fn geo_timeout(&self) -> Duration {
        Duration::from_secs(self.geo_timeout_secs)
    }

    pub fn audit_timeout(&self) -> Duration {
        Duration::from_secs(self.audit_timeout_secs)
    }

    pub fn browser_status_timeout(&self) -> Duration {
        Duration::from_secs(self.browser_status_timeout_secs)
    }
}
