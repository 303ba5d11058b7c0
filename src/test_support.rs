//! Loopback HTTP(S) responders and certificates for probe tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use rcgen::{CertificateParams, KeyPair};
use rustls::{ClientConfig, RootCertStore, ServerConfig};
use rustls_pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

use crate::tls;

pub struct TestServer {
    pub addr: SocketAddr,
    scheme: &'static str,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}://{}{}", self.scheme, self.addr, path)
    }

    /// Request lines (`GET /path HTTP/1.1`) seen so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

/// Serve the given raw responses, one per connection. The last one repeats.
pub async fn serve(responses: Vec<String>) -> TestServer {
    spawn_server(responses, None).await
}

/// Same as [`serve`], behind TLS with the given certificate.
pub async fn serve_tls(responses: Vec<String>, cert: &TestCert) -> TestServer {
    spawn_server(responses, Some(TlsAcceptor::from(cert.server_config()))).await
}

/// Accepts connections and reads the request, then never answers.
pub async fn hang() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();

    tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            record_request_line(&mut stream, &seen).await;
            held.push(stream);
        }
    });

    TestServer {
        addr,
        scheme: "http",
        requests,
    }
}

async fn spawn_server(responses: Vec<String>, acceptor: Option<TlsAcceptor>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();
    let scheme = if acceptor.is_some() { "https" } else { "http" };

    tokio::spawn(async move {
        let mut served = 0usize;
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let response = responses
                .get(served)
                .or_else(|| responses.last())
                .cloned()
                .unwrap_or_default();
            served += 1;

            match &acceptor {
                Some(acceptor) => {
                    if let Ok(stream) = acceptor.accept(stream).await {
                        respond(stream, &response, &seen).await;
                    }
                }
                None => respond(stream, &response, &seen).await,
            }
        }
    });

    TestServer {
        addr,
        scheme,
        requests,
    }
}

async fn respond<S>(mut stream: S, response: &str, seen: &Mutex<Vec<String>>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    record_request_line(&mut stream, seen).await;
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

async fn record_request_line<S>(stream: &mut S, seen: &Mutex<Vec<String>>)
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let head = String::from_utf8_lossy(&buf);
    if let Some(line) = head.lines().next() {
        if let Ok(mut r) = seen.lock() {
            r.push(line.to_string());
        }
    }
}

pub fn http_response(status: u16, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status} Test\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

pub fn json_response(body: &str) -> String {
    http_response(200, "application/json", body)
}

pub fn redirect_response(location: &str) -> String {
    format!(
        "HTTP/1.1 302 Found\r\nLocation: {location}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
    )
}

/// A loopback port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind probe port");
    let port = listener.local_addr().expect("listener address").port();
    drop(listener);
    port
}

/// Self-signed certificate for `127.0.0.1` and `localhost`.
pub struct TestCert {
    pub der: CertificateDer<'static>,
    /// Expiry as written into the certificate, midnight UTC.
    pub not_after: DateTime<Utc>,
    key_der: Vec<u8>,
}

impl TestCert {
    pub fn expiring(year: i32, month: u8, day: u8) -> Self {
        let mut params = CertificateParams::new(vec!["127.0.0.1".to_string(), "localhost".to_string()])
            .expect("certificate params");
        params.not_after = rcgen::date_time_ymd(year, month, day);
        let key_pair = KeyPair::generate().expect("key pair");
        let cert = params.self_signed(&key_pair).expect("self-signed certificate");

        Self {
            der: cert.der().clone(),
            not_after: Utc
                .with_ymd_and_hms(year, month.into(), day.into(), 0, 0, 0)
                .single()
                .expect("valid expiry date"),
            key_der: key_pair.serialize_der(),
        }
    }

    /// Verifying client configuration that trusts only this certificate.
    pub fn client_config(&self, alpn: &[&[u8]]) -> Arc<ClientConfig> {
        let mut roots = RootCertStore::empty();
        roots.add(self.der.clone()).expect("trust anchor");
        tls::client_config_with_roots(roots, alpn).expect("client config")
    }

    fn server_config(&self) -> Arc<ServerConfig> {
        let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(self.key_der.clone()));
        let config =
            ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
                .with_safe_default_protocol_versions()
                .expect("protocol versions")
                .with_no_client_auth()
                .with_single_cert(vec![self.der.clone()], key)
                .expect("server certificate");
        Arc::new(config)
    }
}
