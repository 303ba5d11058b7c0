use serde::{Deserialize, Serialize};

use crate::probe::ProbeOutcome;

/// Coarse location of the target's address. Fields the service leaves out stay `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoDetails {
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub isp: Option<String>,
}

/// The `dns_and_geo` section of the metrics report.
///
/// `ip` and `geo` degrade independently: a resolved address is still reported
/// when the lookup service is down.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoInfo {
    pub ip: ProbeOutcome<String>,
    pub geo: ProbeOutcome<GeoDetails>,
}

impl GeoInfo {
    pub fn unresolved() -> Self {
        Self {
            ip: ProbeOutcome::Unavailable,
            geo: ProbeOutcome::Unavailable,
        }
    }
}

/// Response body of the ip-api.com `json` endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IpApiResponse {
    pub status: Option<String>,
    pub message: Option<String>,
    pub country: Option<String>,
    pub region_name: Option<String>,
    pub city: Option<String>,
    pub isp: Option<String>,
}

impl From<IpApiResponse> for GeoDetails {
    fn from(response: IpApiResponse) -> Self {
        Self {
            country: response.country,
            region: response.region_name,
            city: response.city,
            isp: response.isp,
        }
    }
}
