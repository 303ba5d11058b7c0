use std::time::Instant;

use chrono::Utc;
use reqwest::{Client, Version, redirect::Policy};

use super::report;
use super::result::FetchResult;
use crate::config::model::Settings;
use crate::probe::ProbeOutcome;
use crate::target::Target;

/// Client for the timed fetch: redirects followed, HTTP/2 negotiated over ALPN.
pub fn build_client(settings: &Settings) -> reqwest::Result<Client> {
    Client::builder()
        .use_rustls_tls()
        .timeout(settings.fetch_timeout())
        .redirect(Policy::limited(settings.max_redirects))
        .user_agent(&settings.user_agent)
        .build()
}

/// Issue a single GET against the target and time it.
///
/// Only the request itself is timed, body download included. Transport
/// failures are logged and reported as `Unavailable`.
pub async fn fetch_once(client: &Client, target: &Target) -> ProbeOutcome<FetchResult> {
    let started_at = Utc::now();
    let start = Instant::now();
    let sent = send(client, target).await;
    let elapsed = start.elapsed();
    let finished_at = Utc::now();

    match sent {
        Ok((status, version, content_bytes)) => {
            let result = FetchResult {
                status,
                http_version: version_label(version),
                content_bytes,
                started_at,
                finished_at,
                elapsed,
            };
            log::debug!(
                "[fetch] {target} -> {} {}, {} bytes, {} .. {} ({:.2}ms)",
                result.status,
                result.http_version,
                result.content_bytes,
                result.started_at.format("%H:%M:%S%.3f"),
                result.finished_at.format("%H:%M:%S%.3f"),
                result.elapsed.as_secs_f64() * 1000.0
            );
            ProbeOutcome::Ok(result)
        }
        Err(e) => {
            log::error!("[fetch] fetch_url_once failed for {target}: {}", report(&e));
            ProbeOutcome::Unavailable
        }
    }
}

async fn send(client: &Client, target: &Target) -> reqwest::Result<(u16, Version, usize)> {
    let response = client.get(target.url().clone()).send().await?;
    let status = response.status().as_u16();
    let version = response.version();
    let body = response.bytes().await?;
    Ok((status, version, body.len()))
}

/// Protocol label as reported, always upper case.
pub fn version_label(version: Version) -> String {
    let label = match version {
        Version::HTTP_09 => "HTTP/0.9".to_string(),
        Version::HTTP_10 => "HTTP/1.0".to_string(),
        Version::HTTP_11 => "HTTP/1.1".to_string(),
        Version::HTTP_2 => "HTTP/2".to_string(),
        Version::HTTP_3 => "HTTP/3".to_string(),
        other => format!("{other:?}"),
    };
    label.to_uppercase()
}
