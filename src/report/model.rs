use serde::Serialize;

use crate::audit::PagespeedReport;
use crate::cert::CertificateStatus;
use crate::geo::GeoInfo;
use crate::probe::ProbeOutcome;
use crate::timing::PhaseTimings;

/// Output of `site_metrix` mode.
///
/// `http_probe_status`, `http_version` and `download_speed_kbps` describe the
/// timed fetch; `network_metrics` comes from a separate request and may
/// disagree with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub url: String,
    pub http_probe_status: i32,
    pub http_version: String,
    pub download_speed_kbps: f64,
    pub dns_and_geo: GeoInfo,
    pub ssl_certificate: CertificateStatus,
    pub network_metrics: ProbeOutcome<PhaseTimings>,
}

/// Output of `site_seo_web` mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    pub url: String,
    pub pagespeed_insights: PagespeedReport,
}
