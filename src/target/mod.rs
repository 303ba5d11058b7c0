use url::Url;

use crate::error::{ProbeError, Result};

const DEFAULT_SCHEME: &str = "https://";

/// A validated probe target.
///
/// Built once from user input and shared read-only by every probe, so no
/// probe ever re-parses or re-validates the raw string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    url: Url,
    host: String,
}

impl Target {
    /// Parse a bare domain or a full URL.
    ///
    /// Inputs without a scheme get `https://` prepended before parsing. Anything
    /// that still lacks a scheme or a host afterwards is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let candidate = if has_scheme(raw) {
            raw.to_string()
        } else {
            format!("{DEFAULT_SCHEME}{raw}")
        };

        let url = Url::parse(&candidate).map_err(|e| {
            log::debug!("Rejecting target {raw:?}: {e}");
            ProbeError::InvalidTarget(raw.to_string())
        })?;

        let host = match url.host_str() {
            Some(host) if !host.is_empty() && !url.scheme().is_empty() => host.to_string(),
            _ => return Err(ProbeError::InvalidTarget(raw.to_string())),
        };

        Ok(Self { url, host })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The canonical URL as rendered in reports. A bare origin keeps no trailing slash.
    pub fn as_str(&self) -> &str {
        let s = self.url.as_str();
        if self.url.path() == "/" && self.url.query().is_none() && self.url.fragment().is_none() {
            s.strip_suffix('/').unwrap_or(s)
        } else {
            s
        }
    }

    /// Bare host name (or IP literal, without IPv6 brackets).
    pub fn host(&self) -> &str {
        self.host.trim_start_matches('[').trim_end_matches(']')
    }
}

/// A scheme is `<alpha>[alnum+-.]*://`. Checking for `://` keeps `example.com:8080`
/// from being read as scheme `example.com`.
fn has_scheme(raw: &str) -> bool {
    let Some((scheme, _)) = raw.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_domain_gets_https() {
        let target = Target::parse("example.com").expect("valid target");
        assert_eq!(target.as_str(), "https://example.com");
        assert_eq!(target.host(), "example.com");
        assert_eq!(target.url().scheme(), "https");
    }

    #[test]
    fn explicit_scheme_is_kept() {
        let target = Target::parse("http://example.com/status?x=1").expect("valid target");
        assert_eq!(target.as_str(), "http://example.com/status?x=1");
        assert_eq!(target.host(), "example.com");
        assert_eq!(target.url().scheme(), "http");
    }

    #[test]
    fn domain_with_port_and_path() {
        let target = Target::parse("example.com:8443/health").expect("valid target");
        assert_eq!(target.as_str(), "https://example.com:8443/health");
        assert_eq!(target.url().port(), Some(8443));
    }

    #[test]
    fn whitespace_is_trimmed() {
        let target = Target::parse("  www.example.org \n").expect("valid target");
        assert_eq!(target.as_str(), "https://www.example.org");
    }

    #[test]
    fn ipv6_literal_host_is_unbracketed() {
        let target = Target::parse("https://[::1]:8080").expect("valid target");
        assert_eq!(target.host(), "::1");
    }

    #[test]
    fn missing_host_is_rejected() {
        for raw in ["", "https://", "http://:80", "file:///etc/passwd"] {
            let err = Target::parse(raw).expect_err(raw);
            assert!(matches!(err, ProbeError::InvalidTarget(_)), "{raw}: {err}");
        }
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(Target::parse("exa mple.com").is_err());
    }
}
