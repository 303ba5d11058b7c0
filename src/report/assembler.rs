use crate::audit::AuditClient;
use crate::cert::{CertInspector, CertificateInfo, CertificateStatus};
use crate::config::model::Settings;
use crate::error::{ProbeError, Result};
use crate::geo::{GeoInfo, GeoResolver};
use crate::http_probe::prelude::*;
use crate::probe::ProbeOutcome;
use crate::target::Target;
use crate::timing::{PhaseProbe, PhaseTimings};

use super::model::{AuditReport, MetricsReport};

/// What `site_metrix` mode produced.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricsOutcome {
    Report(Box<MetricsReport>),
    /// The timed fetch failed, so no other probe was run.
    FetchFailed,
}

/// Runs the probes a mode needs, strictly one after another, and merges
/// whatever they produced.
pub struct ReportAssembler {
    settings: Settings,
}

impl ReportAssembler {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Timed fetch first; geo, certificate and phase timing only when it
    /// produced a result.
    pub async fn run_metrics(&self, target: &Target) -> Result<MetricsOutcome> {
        let client = build_client(&self.settings)?;
        let fetched = fetch_once(&client, target).await;
        drop(client);

        let Some(fetch) = fetched.ok() else {
            return Ok(MetricsOutcome::FetchFailed);
        };

        let dns_and_geo = self.geo(target).await;
        let certificate = self.certificate(target).await;
        let network_metrics = self.phases(target).await;
        log::info!(
            "[report] {target}: status {}, ip {}, geo {}, ssl {}, phases {}",
            fetch.status,
            dns_and_geo.ip.is_ok(),
            dns_and_geo.geo.is_ok(),
            certificate.is_ok(),
            network_metrics.is_ok()
        );
        let ssl_certificate = CertificateStatus::from(certificate);

        Ok(MetricsOutcome::Report(Box::new(MetricsReport {
            url: target.to_string(),
            http_probe_status: i32::from(fetch.status),
            download_speed_kbps: download_speed_kbps(Some(&fetch)),
            http_version: fetch.http_version,
            dns_and_geo,
            ssl_certificate,
            network_metrics,
        })))
    }

    /// Both PageSpeed strategies. Without a credential nothing is contacted.
    pub async fn run_audit(&self, target: &Target, api_key: Option<&str>) -> Result<AuditReport> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(ProbeError::MissingCredential)?;
        let client = AuditClient::new(&self.settings, api_key)?;

        Ok(AuditReport {
            url: target.to_string(),
            pagespeed_insights: client.run(target).await,
        })
    }

    async fn geo(&self, target: &Target) -> GeoInfo {
        match GeoResolver::from_settings(&self.settings) {
            Ok(resolver) => resolver.resolve(target).await,
            Err(e) => {
                log::warn!("[geo] resolver setup failed: {e}");
                GeoInfo::unresolved()
            }
        }
    }

    async fn certificate(&self, target: &Target) -> ProbeOutcome<CertificateInfo> {
        match CertInspector::from_settings(&self.settings) {
            Ok(inspector) => inspector.inspect(target).await,
            Err(e) => {
                log::warn!("[ssl] inspector setup failed: {e}");
                ProbeOutcome::Unavailable
            }
        }
    }

    /// The phase probe propagates its errors; this is the scope that turns
    /// them into an unavailable section instead of losing the whole report.
    async fn phases(&self, target: &Target) -> ProbeOutcome<PhaseTimings> {
        let measured = async {
            PhaseProbe::from_settings(&self.settings)?
                .measure(target)
                .await
        };
        ProbeOutcome::from_result("phases", measured.await)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::audit::client::tests::lighthouse_fixture;
    use crate::test_support::{closed_port, hang, http_response, json_response, serve};

    fn settings_with_geo(geo_endpoint: String) -> Settings {
        Settings {
            geo_endpoint,
            dns_hosts: vec!["127.0.0.1".to_string()],
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn failed_fetch_skips_every_other_probe() {
        let geo = serve(vec![json_response("{}")]).await;
        let port = closed_port().await;
        let target = Target::parse(&format!("http://127.0.0.1:{port}/")).unwrap();

        let outcome = ReportAssembler::new(settings_with_geo(geo.url("/json")))
            .run_metrics(&target)
            .await
            .unwrap();
        assert_eq!(outcome, MetricsOutcome::FetchFailed);
        assert!(geo.requests().is_empty());
    }

    #[tokio::test]
    async fn fetch_timeout_skips_every_other_probe() {
        let geo = serve(vec![json_response("{}")]).await;
        let site = hang().await;
        let target = Target::parse(&site.url("/")).unwrap();
        let settings = Settings {
            fetch_timeout_secs: 1,
            ..settings_with_geo(geo.url("/json"))
        };

        let outcome = ReportAssembler::new(settings).run_metrics(&target).await.unwrap();
        assert_eq!(outcome, MetricsOutcome::FetchFailed);
        assert!(geo.requests().is_empty());
        // only the timed fetch ever reached the site; the phase probe never ran
        assert_eq!(site.requests(), vec!["GET / HTTP/1.1"]);
    }

    #[tokio::test]
    async fn metrics_report_merges_partial_results() {
        let site = serve(vec![http_response(200, "text/html", "<p>hi</p>")]).await;
        let geo = serve(vec![json_response(
            r#"{"status":"success","country":"Peru","regionName":"Lima","city":"Lima","isp":"Example SA"}"#,
        )])
        .await;
        let target = Target::parse(&site.url("/")).unwrap();

        let outcome = ReportAssembler::new(settings_with_geo(geo.url("/json")))
            .run_metrics(&target)
            .await
            .unwrap();
        let MetricsOutcome::Report(report) = outcome else {
            panic!("expected a report");
        };

        assert_eq!(report.url, format!("http://{}", site.addr));
        assert_eq!(report.http_probe_status, 200);
        assert_eq!(report.http_version, "HTTP/1.1");
        assert_eq!(report.dns_and_geo.ip, ProbeOutcome::Ok("127.0.0.1".to_string()));
        assert!(report.dns_and_geo.geo.is_ok());
        // nothing speaks TLS on port 443 of the loopback test host
        assert_eq!(report.ssl_certificate, CertificateStatus::from(ProbeOutcome::Unavailable));
        let timings = report.network_metrics.clone().ok().expect("phase timings");
        assert_eq!(timings.http_code, 200);
        assert_eq!(timings.page_size_bytes, "<p>hi</p>".len());

        let value = serde_json::to_value(&*report).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        for key in [
            "url",
            "http_probe_status",
            "http_version",
            "download_speed_kbps",
            "dns_and_geo",
            "ssl_certificate",
            "network_metrics",
        ] {
            assert!(keys.contains(&key), "missing {key}");
        }
    }

    #[tokio::test]
    async fn geo_outage_does_not_touch_other_sections() {
        let site = serve(vec![http_response(200, "text/plain", "ok")]).await;
        let geo_port = closed_port().await;
        let target = Target::parse(&site.url("/")).unwrap();

        let outcome = ReportAssembler::new(settings_with_geo(format!("http://127.0.0.1:{geo_port}/json")))
            .run_metrics(&target)
            .await
            .unwrap();
        let MetricsOutcome::Report(report) = outcome else {
            panic!("expected a report");
        };
        assert_eq!(
            serde_json::to_value(&report.dns_and_geo).unwrap(),
            json!({"ip": "127.0.0.1", "geo": "N/A"})
        );
        assert!(report.network_metrics.is_ok());
    }

    #[tokio::test]
    async fn audit_without_credential_makes_no_calls() {
        let audit = serve(vec![json_response(&lighthouse_fixture().to_string())]).await;
        let settings = Settings {
            audit_endpoint: audit.url("/runPagespeed"),
            ..Settings::default()
        };
        let target = Target::parse("example.com").unwrap();
        let assembler = ReportAssembler::new(settings);

        for key in [None, Some(""), Some("   ")] {
            let result = assembler.run_audit(&target, key).await;
            assert!(matches!(result, Err(ProbeError::MissingCredential)));
        }
        assert!(audit.requests().is_empty());
    }

    #[tokio::test]
    async fn audit_report_has_both_strategies() {
        let audit = serve(vec![json_response(&lighthouse_fixture().to_string())]).await;
        let settings = Settings {
            audit_endpoint: audit.url("/runPagespeed"),
            ..Settings::default()
        };
        let target = Target::parse("example.com").unwrap();

        let report = ReportAssembler::new(settings)
            .run_audit(&target, Some("secret"))
            .await
            .unwrap();
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["url"], "https://example.com");
        assert_eq!(value["pagespeed_insights"]["desktop"]["FCP"], 1200.0);
        assert_eq!(value["pagespeed_insights"]["mobile"]["TTFB"], 80.0);
        assert_eq!(audit.requests().len(), 2);
    }
}
