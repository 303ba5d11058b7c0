use std::sync::Arc;

use rustls::{ClientConfig, RootCertStore};

use crate::error::Result;

/// Verifying rustls client configuration backed by the Mozilla root set.
///
/// The ring provider is passed explicitly so nothing depends on a process-wide
/// default provider being installed.
pub fn client_config(alpn: &[&[u8]]) -> Result<Arc<ClientConfig>> {
    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    client_config_with_roots(root_store, alpn)
}

pub fn client_config_with_roots(root_store: RootCertStore, alpn: &[&[u8]]) -> Result<Arc<ClientConfig>> {
    let mut config =
        ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()?
            .with_root_certificates(root_store)
            .with_no_client_auth();
    config.alpn_protocols = alpn.iter().map(|p| p.to_vec()).collect();

    Ok(Arc::new(config))
}
