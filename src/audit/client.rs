use reqwest::Client;
use serde_json::Value;

use super::normalize::{AuditValue, normalize_value};
use super::result::{AuditMetrics, AuditValues, PagespeedReport, Score, Strategy};
use crate::config::model::Settings;
use crate::error::{ProbeError, Result};
use crate::http_probe::report;
use crate::probe::NOT_AVAILABLE;
use crate::target::Target;

const CATEGORIES: [&str; 4] = ["PERFORMANCE", "ACCESSIBILITY", "BEST_PRACTICES", "SEO"];

/// PageSpeed Insights client. One request per strategy, run one after the other.
pub struct AuditClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl AuditClient {
    pub fn new(settings: &Settings, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .timeout(settings.audit_timeout())
            .user_agent(&settings.user_agent)
            .build()?;
        Ok(Self {
            client,
            endpoint: settings.audit_endpoint.clone(),
            api_key: api_key.to_string(),
        })
    }

    /// Audit both strategies. A failing strategy never stops the other one.
    pub async fn run(&self, target: &Target) -> PagespeedReport {
        PagespeedReport {
            desktop: self.audit(target, Strategy::Desktop).await,
            mobile: self.audit(target, Strategy::Mobile).await,
        }
    }

    pub async fn audit(&self, target: &Target, strategy: Strategy) -> AuditMetrics {
        match self.fetch(target, strategy).await {
            Ok(metrics) => metrics,
            Err(e) => {
                log::error!("[audit] PageSpeed {} failed: {}", strategy.as_str(), report(&e));
                AuditMetrics::failed()
            }
        }
    }

    async fn fetch(&self, target: &Target, strategy: Strategy) -> Result<AuditMetrics> {
        let mut query: Vec<(&str, &str)> = vec![("url", target.as_str())];
        query.extend(CATEGORIES.iter().map(|c| ("category", *c)));
        query.push(("strategy", strategy.as_str()));

        let request = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .query(&[("key", self.api_key.as_str())])
            .build()?;
        let called = redact_key(request.url());

        let body = self.client.execute(request).await?.text().await?;
        let parsed = serde_json::from_str::<Value>(&body)
            .map_err(ProbeError::from)
            .and_then(|data| parse_lighthouse(&data));

        if parsed.is_err() {
            log::error!("[audit] URL called: {called}");
            log::error!("[audit] Response: {body}");
        }
        parsed
    }
}

/// Extract scores and audit values from a `runPagespeed` response.
///
/// Missing categories or any of the six core audits fail the strategy; the
/// three optional audits fall back to `"N/A"`.
pub fn parse_lighthouse(data: &Value) -> Result<AuditMetrics> {
    let lighthouse = data
        .get("lighthouseResult")
        .ok_or_else(|| missing("lighthouseResult"))?;
    let audits = lighthouse.get("audits").ok_or_else(|| missing("audits"))?;

    let score = |category: &str| -> Result<Score> {
        lighthouse
            .pointer(&format!("/categories/{category}/score"))
            .and_then(Value::as_f64)
            .map(|score| Score::Measured(score * 100.0))
            .ok_or_else(|| missing(&format!("categories.{category}.score")))
    };
    let required = |audit: &str| -> Result<AuditValue> {
        audits
            .pointer(&format!("/{audit}/displayValue"))
            .map(normalize_value)
            .ok_or_else(|| missing(&format!("audits.{audit}.displayValue")))
    };
    let optional = |audit: &str| -> AuditValue {
        let fallback = Value::String(NOT_AVAILABLE.to_string());
        normalize_value(
            audits
                .pointer(&format!("/{audit}/displayValue"))
                .unwrap_or(&fallback),
        )
    };

    Ok(AuditMetrics {
        performance: score("performance")?,
        accessibility: score("accessibility")?,
        best_practices: score("best-practices")?,
        seo: score("seo")?,
        values: Some(AuditValues {
            first_contentful_paint: required("first-contentful-paint")?,
            largest_contentful_paint: required("largest-contentful-paint")?,
            total_blocking_time: required("total-blocking-time")?,
            cumulative_layout_shift: required("cumulative-layout-shift")?,
            speed_index: required("speed-index")?,
            server_response_time: required("server-response-time")?,
            max_potential_fid: optional("max-potential-fid"),
            interactive: optional("interactive"),
            network_server_latency: optional("network-server-latency"),
        }),
    })
}

fn missing(field: &str) -> ProbeError {
    ProbeError::InvalidResponse(format!("missing {field}"))
}

fn redact_key(url: &url::Url) -> String {
    let mut url = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "<redacted>".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url.to_string()
}
