//! Picks a remote-browser (WebDriver) host for the transaction probe.
//!
//! Hosts are asked for `<host>/status` in the order given; the first that
//! answers `200` with `value.ready == true` is used for the whole run. There
//! is no retry against other hosts once one has been picked.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::model::Settings;
use crate::error::Result;

pub const NO_HOST_ERROR: &str = "No working Selenium host found";

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    value: StatusValue,
}

#[derive(Debug, Default, Deserialize)]
struct StatusValue {
    #[serde(default)]
    ready: bool,
}

/// Outcome of `browser_host` mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HostSelection {
    Selected { host: String },
    NoneReady { error: String },
}

pub struct HostSelector {
    client: Client,
}

impl HostSelector {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .timeout(settings.browser_status_timeout())
            .user_agent(&settings.user_agent)
            .build()?;
        Ok(Self { client })
    }

    pub async fn select(&self, hosts: &[String]) -> HostSelection {
        for host in hosts {
            match self.is_ready(host).await {
                Ok(true) => {
                    log::info!("[browser] using {host}");
                    return HostSelection::Selected { host: host.clone() };
                }
                Ok(false) => log::debug!("[browser] {host} is not ready"),
                Err(e) => log::debug!("[browser] {host} unreachable: {e}"),
            }
        }
        HostSelection::NoneReady {
            error: NO_HOST_ERROR.to_string(),
        }
    }

    async fn is_ready(&self, host: &str) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/status", host.trim_end_matches('/')))
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            return Ok(false);
        }
        let status: StatusResponse = response.json().await?;
        Ok(status.value.ready)
    }
}

/// Split a comma separated host list, dropping blanks.
pub fn parse_host_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .collect()
}
