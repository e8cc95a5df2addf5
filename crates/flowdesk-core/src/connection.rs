use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use thiserror::Error;

pub const DEFAULT_API_KEY_HEADER: &str = "X-N8N-API-KEY";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5678;
pub const DEFAULT_BASE_PATH: &str = "api/v1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("Host is empty")]
    EmptyHost,

    #[error("Unsupported scheme in host: {0}")]
    UnsupportedScheme(String),
}

/// How the key is presented to the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthScheme {
    /// `<api_key_header>: <key>`
    #[default]
    ApiKey,
    /// `Authorization: Bearer <key>`
    Bearer,
}

/// Where the workflow server lives and how to authenticate against it.
///
/// Held in memory for the lifetime of a session only.
#[derive(Clone, PartialEq, Eq)]
pub struct Connection {
    pub host: String,
    /// `None` applies [`DEFAULT_PORT`] to local hosts given without a scheme
    /// and no port to anything else. `Some(0)` never adds a port.
    pub port: Option<u16>,
    pub base_path: String,
    pub api_key: String,
    pub auth: AuthScheme,
    pub api_key_header: String,
}

impl Default for Connection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: None,
            base_path: DEFAULT_BASE_PATH.to_string(),
            api_key: String::new(),
            auth: AuthScheme::ApiKey,
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_path", &self.base_path)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("auth", &self.auth)
            .field("api_key_header", &self.api_key_header)
            .finish()
    }
}

impl Connection {
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// The `(name, value)` auth header, or `None` when no key is configured.
    /// A missing key is not an error here; the server rejects the first call.
    pub fn auth_header(&self) -> Option<(String, String)> {
        if !self.has_api_key() {
            return None;
        }
        let key = self.api_key.trim();
        Some(match self.auth {
            AuthScheme::ApiKey => {
                let header = self.api_key_header.trim();
                let header = if header.is_empty() {
                    DEFAULT_API_KEY_HEADER
                } else {
                    header
                };
                (header.to_string(), key.to_string())
            }
            AuthScheme::Bearer => ("Authorization".to_string(), format!("Bearer {}", key)),
        })
    }

    /// Derives `scheme://host[:port]/base/path` with no trailing slash.
    ///
    /// An explicit `http://` or `https://` prefix on the host is honoured;
    /// otherwise the scheme is `http` for local hostnames and `https` for
    /// everything else. See [`Connection::port`] for when a port is added. Path segments from the host and from `base_path` are
    /// trimmed of slashes and empty segments are dropped before joining.
    pub fn base_url(&self) -> Result<String, ConnectionError> {
        let (explicit_scheme, rest) = split_scheme(self.host.trim())?;

        let mut host_parts = rest
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let authority = host_parts.next().ok_or(ConnectionError::EmptyHost)?;
        let authority = bracket_ipv6(authority);

        let local = is_local_host(host_name(&authority));
        let scheme = explicit_scheme.unwrap_or(if local { "http" } else { "https" });
        let port = match self.port {
            Some(0) => None,
            Some(port) => Some(port),
            None if explicit_scheme.is_none() && local => Some(DEFAULT_PORT),
            None => None,
        };

        let mut url = format!("{}://{}", scheme, authority);
        if let Some(port) = port.filter(|_| !has_port(&authority)) {
            url.push_str(&format!(":{}", port));
        }

        let segments = host_parts.chain(
            self.base_path
                .split('/')
                .map(str::trim)
                .filter(|s| !s.is_empty()),
        );
        for segment in segments {
            url.push('/');
            url.push_str(segment);
        }

        Ok(url)
    }
}

fn split_scheme(host: &str) -> Result<(Option<&'static str>, &str), ConnectionError> {
    let Some((scheme, rest)) = host.split_once("://") else {
        return Ok((None, host));
    };
    match scheme.to_ascii_lowercase().as_str() {
        "http" => Ok((Some("http"), rest)),
        "https" => Ok((Some("https"), rest)),
        _ => Err(ConnectionError::UnsupportedScheme(scheme.to_string())),
    }
}

/// Wraps a bare IPv6 literal in brackets so a port can follow it.
fn bracket_ipv6(authority: &str) -> String {
    match authority.parse::<IpAddr>() {
        Ok(IpAddr::V6(_)) => format!("[{}]", authority),
        _ => authority.to_string(),
    }
}

fn has_port(authority: &str) -> bool {
    match authority.rfind(']') {
        Some(end) => authority[end..].contains(':'),
        None => authority.contains(':'),
    }
}

/// Host name without port or IPv6 brackets.
fn host_name(authority: &str) -> &str {
    if let Some(rest) = authority.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    authority.split(':').next().unwrap_or(authority)
}

/// Plain local hostnames are served over http.
pub fn is_local_host(host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    if let Ok(ip) = host.parse::<IpAddr>() {
        return match ip {
            IpAddr::V4(v4) => {
                v4.is_loopback() || v4.is_unspecified() || v4.is_private() || v4.is_link_local()
            }
            IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
        };
    }
    host == "localhost"
        || host.ends_with(".localhost")
        || host.ends_with(".local")
        || !host.contains('.')
}
