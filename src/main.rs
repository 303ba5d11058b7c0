use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

pub mod audit;
pub mod browser;
pub mod cert;
pub mod config;
pub mod error;
pub mod geo;
pub mod http_probe;
pub mod probe;
pub mod report;
pub mod target;
#[cfg(test)]
mod test_support;
pub mod timing;
pub mod tls;

use browser::{HostSelection, HostSelector, parse_host_list};
use config::app_config::{load_settings, resolve_api_key};
use config::model::Settings;
use report::{MetricsOutcome, ReportAssembler, to_pretty_json};
use target::Target;

#[derive(Parser)]
#[command(name = "siteprobe")]
#[command(about = "Website health probe: HTTP timing, connection phases, TLS expiry, geo/IP and PageSpeed scores")]
#[command(version)]
struct Cli {
    /// Website URL or domain (for browser_host: comma separated WebDriver hosts)
    target: String,

    /// Probe mode
    #[arg(value_enum)]
    mode: Mode,

    /// PageSpeed Insights API key (only required for 'site_seo_web'; falls back to PAGESPEED_API_KEY)
    #[arg(long = "api-key", visible_alias = "api_key")]
    api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// HTTP fetch, DNS/geo, certificate and connection-phase timings
    #[value(name = "site_metrix")]
    SiteMetrix,
    /// PageSpeed Insights scores for desktop and mobile
    #[value(name = "site_seo_web")]
    SiteSeoWeb,
    /// Pick the first ready remote-browser host
    #[value(name = "browser_host")]
    BrowserHost,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let settings = match load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("[ERROR] {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.mode {
        Mode::SiteMetrix => run_metrics(settings, &cli.target).await,
        Mode::SiteSeoWeb => run_audit(settings, &cli.target, resolve_api_key(cli.api_key)).await,
        Mode::BrowserHost => run_browser_host(&settings, &cli.target).await,
    }
}

async fn run_metrics(settings: Settings, raw_target: &str) -> ExitCode {
    let Some(target) = parse_target(raw_target) else {
        return ExitCode::FAILURE;
    };

    match ReportAssembler::new(settings).run_metrics(&target).await {
        Ok(MetricsOutcome::Report(report)) => emit(&*report),
        Ok(MetricsOutcome::FetchFailed) => {
            println!("Failed to fetch the URL.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("[ERROR] {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_audit(settings: Settings, raw_target: &str, api_key: Option<String>) -> ExitCode {
    // No probe may run without a credential.
    if api_key.is_none() {
        eprintln!("[ERROR] {}", error::ProbeError::MissingCredential);
        return ExitCode::FAILURE;
    }
    let Some(target) = parse_target(raw_target) else {
        return ExitCode::FAILURE;
    };

    match ReportAssembler::new(settings)
        .run_audit(&target, api_key.as_deref())
        .await
    {
        Ok(report) => emit(&report),
        Err(e) => {
            eprintln!("[ERROR] {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_browser_host(settings: &Settings, raw_hosts: &str) -> ExitCode {
    let selector = match HostSelector::from_settings(settings) {
        Ok(selector) => selector,
        Err(e) => {
            eprintln!("[ERROR] {e}");
            return ExitCode::FAILURE;
        }
    };

    let selection = selector.select(&parse_host_list(raw_hosts)).await;
    let code = match selection {
        HostSelection::Selected { .. } => ExitCode::SUCCESS,
        HostSelection::NoneReady { .. } => ExitCode::FAILURE,
    };
    match serde_json::to_string(&selection) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("[ERROR] {e}");
            return ExitCode::FAILURE;
        }
    }
    code
}

fn parse_target(raw: &str) -> Option<Target> {
    match Target::parse(raw) {
        Ok(target) => Some(target),
        Err(e) => {
            eprintln!("[ERROR] {e}");
            None
        }
    }
}

fn emit<T: Serialize>(report: &T) -> ExitCode {
    match to_pretty_json(report) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("[ERROR] Could not render report: {e}");
            ExitCode::FAILURE
        }
    }
}
