use serde::{Serialize, Serializer};

use super::normalize::AuditValue;

/// Device profile PageSpeed emulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Desktop,
    Mobile,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Desktop => "desktop",
            Strategy::Mobile => "mobile",
        }
    }
}

/// A 0-100 category score, or the `-1` placeholder for a failed strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    Measured(f64),
    Failed,
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Score::Measured(value) => serializer.serialize_f64(*value),
            Score::Failed => serializer.serialize_i64(-1),
        }
    }
}

/// Normalized Lighthouse audit values, keyed the way the report exposes them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditValues {
    #[serde(rename = "FCP")]
    pub first_contentful_paint: AuditValue,
    #[serde(rename = "LCP")]
    pub largest_contentful_paint: AuditValue,
    #[serde(rename = "TBT")]
    pub total_blocking_time: AuditValue,
    #[serde(rename = "CLS")]
    pub cumulative_layout_shift: AuditValue,
    #[serde(rename = "SpeedIndex")]
    pub speed_index: AuditValue,
    #[serde(rename = "TTFB")]
    pub server_response_time: AuditValue,
    #[serde(rename = "MaxFID")]
    pub max_potential_fid: AuditValue,
    #[serde(rename = "TTI")]
    pub interactive: AuditValue,
    #[serde(rename = "NetworkServerLatency")]
    pub network_server_latency: AuditValue,
}

/// One strategy's result. A failed strategy keeps only the four scores, all `-1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditMetrics {
    pub performance: Score,
    pub accessibility: Score,
    #[serde(rename = "bestPractices")]
    pub best_practices: Score,
    pub seo: Score,
    #[serde(flatten)]
    pub values: Option<AuditValues>,
}

impl AuditMetrics {
    pub fn failed() -> Self {
        Self {
            performance: Score::Failed,
            accessibility: Score::Failed,
            best_practices: Score::Failed,
            seo: Score::Failed,
            values: None,
        }
    }
}

/// The `pagespeed_insights` section of the audit report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagespeedReport {
    pub desktop: AuditMetrics,
    pub mobile: AuditMetrics,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn failed_strategy_has_only_scores() {
        assert_eq!(
            serde_json::to_value(AuditMetrics::failed()).unwrap(),
            json!({"performance": -1, "accessibility": -1, "bestPractices": -1, "seo": -1})
        );
    }

    #[test]
    fn strategy_names() {
        assert_eq!(Strategy::Desktop.as_str(), "desktop");
        assert_eq!(Strategy::Mobile.as_str(), "mobile");
    }
}
