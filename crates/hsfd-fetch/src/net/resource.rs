use std::fmt;

use url::{ParseError, Position, Url};

use crate::error::ConfigError;

/// A validated `https://host[:port]/path` locator.
///
/// The original string is kept and passed to the client unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    raw:    String,
    parsed: Url,
    host:   String,
    port:   u16,
}

impl ResourceId {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Err(ConfigError::EmptyUrl);
        }
        let parsed = Url::parse(raw).map_err(|source| match source {
            ParseError::EmptyHost => ConfigError::MissingHost(raw.to_string()),
            ParseError::InvalidPort => ConfigError::InvalidPort(raw.to_string()),
            ParseError::RelativeUrlWithoutBase => ConfigError::UnsupportedScheme(raw.to_string()),
            source => ConfigError::InvalidUrl {
                url: raw.to_string(),
                source,
            },
        })?;

        if parsed.scheme() != "https" {
            return Err(ConfigError::UnsupportedScheme(raw.to_string()));
        }
        let host = parsed
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| ConfigError::MissingHost(raw.to_string()))?
            .to_string();
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| ConfigError::InvalidPort(raw.to_string()))?;

        Ok(Self {
            raw: raw.to_string(),
            parsed,
            host,
            port,
        })
    }

    pub fn as_str(&self) -> &str { &self.raw }

    pub fn url(&self) -> &Url { &self.parsed }

    /// Host as it appears in the authority; IPv6 literals keep their brackets.
    pub fn host(&self) -> &str { &self.host }

    pub fn port(&self) -> u16 { self.port }

    /// Path plus query, as sent on the request line.
    pub fn path(&self) -> &str { &self.parsed[Position::BeforePath..Position::AfterQuery] }

    /// `host:port`, suitable for a TCP connect.
    pub fn authority(&self) -> String { format!("{}:{}", self.host, self.port) }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.raw) }
}
