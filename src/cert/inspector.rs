use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rustls::ClientConfig;
use rustls_pki_types::ServerName;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use x509_parser::parse_x509_certificate;

use super::result::CertificateInfo;
use crate::config::model::Settings;
use crate::error::{ProbeError, Result};
use crate::probe::ProbeOutcome;
use crate::target::Target;
use crate::tls;

const HTTPS_PORT: u16 = 443;

/// Reads the leaf certificate's expiry over a direct, verified TLS connection.
pub struct CertInspector {
    tls: Arc<ClientConfig>,
    timeout: Duration,
    port: u16,
}

impl CertInspector {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            tls: tls::client_config(&[])?,
            timeout: settings.cert_timeout(),
            port: HTTPS_PORT,
        })
    }

    #[cfg(test)]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[cfg(test)]
    pub fn with_tls(mut self, tls: Arc<ClientConfig>) -> Self {
        self.tls = tls;
        self
    }

    /// Every failure (connect, handshake, missing or unparsable certificate)
    /// ends up as `Unavailable`.
    pub async fn inspect(&self, target: &Target) -> ProbeOutcome<CertificateInfo> {
        let not_after = ProbeOutcome::from_result("ssl", self.leaf_not_after(target.host()).await);
        not_after.map(|not_after| {
            let info = CertificateInfo::new(not_after, Utc::now());
            log::debug!("[ssl] {} expires {} ({} days)", target.host(), info.not_after, info.days_left);
            info
        })
    }

    async fn leaf_not_after(&self, host: &str) -> Result<DateTime<Utc>> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| ProbeError::InvalidServerName(host.to_string()))?;
        let connector = TlsConnector::from(self.tls.clone());

        // The stream is dropped, and the socket closed, as soon as the DER bytes are copied out.
        let cert_der = timeout(self.timeout, async {
            let stream = TcpStream::connect((host, self.port)).await?;
            let tls_stream = connector.connect(server_name, stream).await?;
            let (_, connection) = tls_stream.get_ref();
            connection
                .peer_certificates()
                .and_then(|certs| certs.first())
                .map(|cert| cert.as_ref().to_vec())
                .ok_or_else(|| ProbeError::InvalidResponse("no peer certificate".to_string()))
        })
        .await
        .map_err(|_| ProbeError::Timeout("TLS certificate inspection"))??;

        let (_, parsed) = parse_x509_certificate(&cert_der)
            .map_err(|e| ProbeError::InvalidResponse(format!("certificate parsing failed: {e}")))?;

        let timestamp = parsed.validity().not_after.timestamp();
        DateTime::<Utc>::from_timestamp(timestamp, 0)
            .ok_or_else(|| ProbeError::InvalidResponse(format!("notAfter out of range: {timestamp}")))
    }
}
