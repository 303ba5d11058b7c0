use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Invalid URL or domain name format: {0}")]
    InvalidTarget(String),

    #[error("API key is required for PageSpeed Insights in 'site_seo_web' mode.")]
    MissingCredential,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Connection failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS handshake failed: {0}")]
    Tls(#[from] rustls::Error),

    #[error("Invalid TLS server name: {0}")]
    InvalidServerName(String),

    #[error("DNS resolution failed: {0}")]
    Dns(#[from] trust_dns_resolver::error::ResolveError),

    #[error("HTTP connection error: {0}")]
    Hyper(#[from] hyper::Error),

    #[error("HTTP request could not be built: {0}")]
    Request(#[from] hyper::http::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid settings file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Timed out during {0}")]
    Timeout(&'static str),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, ProbeError>;
