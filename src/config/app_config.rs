use std::env;
use std::net::IpAddr;

use trust_dns_resolver::{
    TokioAsyncResolver,
    config::{NameServerConfig, NameServerConfigGroup, Protocol, ResolverConfig, ResolverOpts},
};

use super::model::Settings;
use crate::error::{ProbeError, Result};

const API_KEY_VAR: &str = "PAGESPEED_API_KEY";

/// Load the probe settings.
///
/// A `.env` file is honoured when present. `CONFIG_FILE` may point at a YAML
/// file with any subset of [`Settings`] fields; `GEO_ENDPOINT`, `AUDIT_ENDPOINT`
/// and `DNS_HOSTS` then override whatever the file said.
pub fn load_settings() -> Result<Settings> {
    if let Ok(path) = dotenvy::dotenv() {
        log::debug!("Loaded environment from {}", path.display());
    }

    let mut settings = match env::var("CONFIG_FILE") {
        Ok(location) => {
            log::info!("Reading settings from {location}");
            let yaml = std::fs::read_to_string(&location)
                .map_err(|e| ProbeError::Config(format!("cannot read {location}: {e}")))?;
            parse_settings(&yaml)?
        }
        Err(_) => Settings::default(),
    };

    apply_env_overrides(&mut settings, |key| env::var(key).ok());
    Ok(settings)
}

pub fn parse_settings(yaml: &str) -> Result<Settings> {
    if yaml.trim().is_empty() {
        return Ok(Settings::default());
    }
    Ok(serde_yaml::from_str(yaml)?)
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(endpoint) = lookup("GEO_ENDPOINT") {
        settings.geo_endpoint = endpoint;
    }
    if let Some(endpoint) = lookup("AUDIT_ENDPOINT") {
        settings.audit_endpoint = endpoint;
    }
    if let Some(hosts) = lookup("DNS_HOSTS") {
        settings.dns_hosts = hosts
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }
}

/// The PageSpeed credential: the command-line value wins over `PAGESPEED_API_KEY`.
/// Blank values count as missing.
pub fn resolve_api_key(cli_value: Option<String>) -> Option<String> {
    cli_value
        .or_else(|| env::var(API_KEY_VAR).ok())
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

/// Setup the DNS resolver used by the connection-phase probe.
///
/// With no `dns_hosts` the system resolver configuration is used, otherwise a
/// resolver querying exactly those name servers over UDP.
pub fn setup_resolver(dns_hosts: &[String]) -> Result<TokioAsyncResolver> {
    if dns_hosts.is_empty() {
        return Ok(TokioAsyncResolver::tokio_from_system_conf()?);
    }

    let mut name_servers = NameServerConfigGroup::new();
    for host in dns_hosts {
        let ip: IpAddr = host
            .parse()
            .map_err(|_| ProbeError::Config(format!("invalid DNS host {host:?}")))?;
        name_servers.push(NameServerConfig {
            socket_addr: (ip, 53).into(),
            protocol: Protocol::Udp,
            tls_dns_name: None,
            trust_negative_responses: false,
            bind_addr: None,
        });
    }

    let mut opts = ResolverOpts::default();
    opts.attempts = 2;
    let resolver_config = ResolverConfig::from_parts(None, vec![], name_servers);
    Ok(TokioAsyncResolver::tokio(resolver_config, opts))
}
