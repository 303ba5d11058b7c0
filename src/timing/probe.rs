use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::header::{ACCEPT, HOST, LOCATION, USER_AGENT};
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use rustls::ClientConfig;
use rustls_pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use trust_dns_resolver::TokioAsyncResolver;
use url::{Host, Position, Url};

use super::result::{PhaseClock, PhaseTimings};
use crate::config::app_config::setup_resolver;
use crate::config::model::Settings;
use crate::error::{ProbeError, Result};
use crate::target::Target;
use crate::tls;

/// Low-level GET that records when each connection phase completes.
///
/// Deliberately independent of the timed fetch: it opens its own connections
/// and resolves names with its own resolver, so its numbers describe a
/// different request than the one the fetch probe reports on.
pub struct PhaseProbe {
    resolver: TokioAsyncResolver,
    tls: Arc<ClientConfig>,
    user_agent: String,
    connect_timeout: Duration,
    total_timeout: Duration,
    max_redirects: usize,
}

/// What one request/response exchange on an open connection yielded.
struct Exchange {
    status: StatusCode,
    location: Option<String>,
    body_bytes: usize,
    starttransfer: f64,
    total: f64,
}

/// Aborts the hyper connection driver however the exchange ends.
struct ConnectionGuard(JoinHandle<()>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl PhaseProbe {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            resolver: setup_resolver(&settings.dns_hosts)?,
            tls: tls::client_config(&[b"http/1.1"])?,
            user_agent: settings.user_agent.clone(),
            connect_timeout: settings.phase_connect_timeout(),
            total_timeout: settings.phase_total_timeout(),
            max_redirects: settings.max_redirects,
        })
    }

    #[cfg(test)]
    pub fn with_tls(mut self, tls: Arc<ClientConfig>) -> Self {
        self.tls = tls;
        self
    }

    /// Run the request, following redirects, and convert the accumulated
    /// clocks into per-phase milliseconds.
    ///
    /// Errors are returned rather than swallowed; no partial timings are ever
    /// produced.
    pub async fn measure(&self, target: &Target) -> Result<PhaseTimings> {
        timeout(self.total_timeout, self.follow(target.url().clone()))
            .await
            .map_err(|_| ProbeError::Timeout("connection-phase transfer"))?
    }

    async fn follow(&self, mut url: Url) -> Result<PhaseTimings> {
        let mut clock = PhaseClock::default();
        let mut redirects = 0;

        loop {
            let (hop_clock, exchange) = self.hop(&url).await?;
            clock.accumulate(&hop_clock);

            let next = match (&exchange.location, exchange.status.is_redirection()) {
                (Some(location), true) => Some(url.join(location).map_err(|e| {
                    ProbeError::InvalidResponse(format!("bad redirect location {location:?}: {e}"))
                })?),
                _ => None,
            };

            match next {
                Some(next) if redirects < self.max_redirects => {
                    log::debug!("[phases] following {} redirect to {next}", exchange.status);
                    redirects += 1;
                    url = next;
                }
                Some(_) => {
                    return Err(ProbeError::InvalidResponse(format!(
                        "maximum ({}) redirects followed",
                        self.max_redirects
                    )));
                }
                None => {
                    return Ok(PhaseTimings::from_clock(
                        &clock,
                        exchange.status.as_u16(),
                        exchange.body_bytes,
                    ));
                }
            }
        }
    }

    /// One connection: resolve, connect, optionally handshake, then exchange.
    async fn hop(&self, url: &Url) -> Result<(PhaseClock, Exchange)> {
        let start = Instant::now();
        let https = match url.scheme() {
            "https" => true,
            "http" => false,
            other => {
                return Err(ProbeError::InvalidResponse(format!("unsupported scheme {other}")));
            }
        };
        let port = url
            .port_or_known_default()
            .ok_or_else(|| ProbeError::InvalidResponse(format!("no port for {url}")))?;

        let mut clock = PhaseClock::default();

        let ip = timeout(self.connect_timeout, self.resolve(url))
            .await
            .map_err(|_| ProbeError::Timeout("name resolution"))??;
        clock.namelookup = start.elapsed().as_secs_f64();

        let remaining = self.connect_timeout.saturating_sub(start.elapsed());
        let tcp = timeout(remaining, TcpStream::connect(SocketAddr::new(ip, port)))
            .await
            .map_err(|_| ProbeError::Timeout("TCP connect"))??;
        clock.connect = start.elapsed().as_secs_f64();

        let exchange = if https {
            let server_name = server_name(url)?;
            let connector = TlsConnector::from(self.tls.clone());
            let remaining = self.connect_timeout.saturating_sub(start.elapsed());
            let stream = timeout(remaining, connector.connect(server_name, tcp))
                .await
                .map_err(|_| ProbeError::Timeout("TLS handshake"))??;
            clock.appconnect = start.elapsed().as_secs_f64();
            self.exchange(stream, url, start).await?
        } else {
            self.exchange(tcp, url, start).await?
        };

        clock.starttransfer = exchange.starttransfer;
        clock.total = exchange.total;
        Ok((clock, exchange))
    }

    async fn resolve(&self, url: &Url) -> Result<IpAddr> {
        match url.host() {
            Some(Host::Ipv4(ip)) => Ok(IpAddr::V4(ip)),
            Some(Host::Ipv6(ip)) => Ok(IpAddr::V6(ip)),
            Some(Host::Domain(domain)) => {
                let lookup = self.resolver.lookup_ip(domain).await?;
                lookup.iter().next().ok_or_else(|| {
                    ProbeError::InvalidResponse(format!("no addresses for {domain}"))
                })
            }
            None => Err(ProbeError::InvalidResponse(format!("no host in {url}"))),
        }
    }

    async fn exchange<S>(&self, io: S, url: &Url, start: Instant) -> Result<Exchange>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(io)).await?;
        let _guard = ConnectionGuard(tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::debug!("[phases] connection closed with error: {e}");
            }
        }));

        let request = Request::builder()
            .method(Method::GET)
            .uri(&url[Position::BeforePath..Position::AfterQuery])
            .header(HOST, &url[Position::BeforeHost..Position::AfterPort])
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "*/*")
            .body(Empty::<Bytes>::new())?;

        let response = sender.send_request(request).await?;
        let starttransfer = start.elapsed().as_secs_f64();

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut body = response.into_body();
        let mut body_bytes = 0;
        while let Some(frame) = body.frame().await {
            if let Some(data) = frame?.data_ref() {
                body_bytes += data.len();
            }
        }

        Ok(Exchange {
            status,
            location,
            body_bytes,
            starttransfer,
            total: start.elapsed().as_secs_f64(),
        })
    }
}

fn server_name(url: &Url) -> Result<ServerName<'static>> {
    let host = url
        .host_str()
        .ok_or_else(|| ProbeError::InvalidServerName(url.to_string()))?
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_string();
    ServerName::try_from(host.clone()).map_err(|_| ProbeError::InvalidServerName(host))
}
