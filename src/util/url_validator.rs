use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Reasons a discovered URL is refused before any request is made.
///
/// Search results and `<link>` tags are attacker-controlled input; these
/// checks keep discovery from being pointed at internal services.
#[derive(Error, Debug)]
pub enum CandidateUrlError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
    /// SEC-015: `user:pass@host` URLs are never fetched.
    #[error("Credentials in URL not allowed")]
    Credentials,
    #[error("Localhost not allowed")]
    Localhost,
    #[error("Private IP address not allowed: {0}")]
    PrivateIp(IpAddr),
}

/// Validates a URL that came from an untrusted source (search hit, HTML
/// link tag) before it is probed.
///
/// Accepts only `http`/`https` URLs with a public host and no userinfo.
pub fn validate_candidate_url(url_str: &str) -> Result<Url, CandidateUrlError> {
    let url = Url::parse(url_str)?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(CandidateUrlError::UnsupportedScheme(url.scheme().to_owned()));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(CandidateUrlError::Credentials);
    }

    let host = url.host_str().ok_or(CandidateUrlError::MissingHost)?;
    if host.eq_ignore_ascii_case("localhost") || host.ends_with(".localhost") {
        return Err(CandidateUrlError::Localhost);
    }

    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = bare.parse::<IpAddr>() {
        if ip.is_loopback() {
            return Err(CandidateUrlError::Localhost);
        }
        if is_non_public(&ip) {
            return Err(CandidateUrlError::PrivateIp(ip));
        }
    }

    Ok(url)
}

fn is_non_public(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_link_local() || v4.is_unspecified(),
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00 // unique local fc00::/7
                || (first & 0xffc0) == 0xfe80 // link local fe80::/10
        }
    }
}
