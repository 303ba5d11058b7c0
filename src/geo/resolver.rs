use std::net::IpAddr;

use reqwest::Client;
use tokio::net::lookup_host;

use super::result::{GeoDetails, GeoInfo, IpApiResponse};
use crate::config::model::Settings;
use crate::error::{ProbeError, Result};
use crate::probe::ProbeOutcome;
use crate::target::Target;

/// Resolves the target through the operating system and annotates the address
/// using an ip-api.com compatible service.
pub struct GeoResolver {
    client: Client,
    endpoint: String,
}

impl GeoResolver {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .timeout(settings.geo_timeout())
            .user_agent(&settings.user_agent)
            .build()?;
        Ok(Self {
            client,
            endpoint: settings.geo_endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub async fn resolve(&self, target: &Target) -> GeoInfo {
        let ip = match resolve_host(target.host()).await {
            Ok(ip) => ip,
            Err(e) => {
                log::warn!("[geo] could not resolve {}: {e}", target.host());
                return GeoInfo::unresolved();
            }
        };

        let geo = ProbeOutcome::from_result("geo", self.lookup(ip).await);
        GeoInfo {
            ip: ProbeOutcome::Ok(ip.to_string()),
            geo,
        }
    }

    async fn lookup(&self, ip: IpAddr) -> Result<GeoDetails> {
        let response: IpApiResponse = self
            .client
            .get(format!("{}/{ip}", self.endpoint))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.status.as_deref() == Some("fail") {
            return Err(ProbeError::InvalidResponse(format!(
                "geo lookup refused: {}",
                response.message.as_deref().unwrap_or("no reason given")
            )));
        }
        Ok(response.into())
    }
}

/// System resolver, no timeout of our own. IPv4 answers are preferred.
async fn resolve_host(host: &str) -> std::io::Result<IpAddr> {
    let addrs: Vec<IpAddr> = lookup_host((host, 0)).await?.map(|a| a.ip()).collect();
    addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses"))
}
