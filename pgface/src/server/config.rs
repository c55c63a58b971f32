//! Listener configuration.
use std::{borrow::Cow, env::var, fmt, time::Duration};

use crate::common::ByteStr;

/// Server listener config.
#[derive(Clone, Debug)]
pub struct Config {
    pub(crate) host: ByteStr,
    pub(crate) port: u16,
    pub(crate) read_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: ByteStr::from_static("127.0.0.1"),
            port: 5432,
            read_timeout: None,
        }
    }
}

impl Config {
    /// Retrieve configuration from environment variable.
    ///
    /// It reads:
    /// - `PGHOST`
    /// - `PGPORT`
    /// - `PGTIMEOUT`, read timeout in seconds
    ///
    /// Additionally, it also read `LISTEN_ADDR` to provide missing value from
    /// previous variables before fallback to default value.
    pub fn from_env() -> Config {
        let addr = var("LISTEN_ADDR").ok().and_then(|e|Config::parse_inner(e.into()).ok());
        let default = Config::default();

        let host = match (var("PGHOST"),addr.as_ref()) {
            (Ok(ok),_) => ok.into(),
            (Err(_),Some(e)) => e.host.clone(),
            (Err(_),None) => default.host,
        };

        let port = match (var("PGPORT"),addr.as_ref()) {
            (Ok(ok),_) => ok.parse().unwrap_or(default.port),
            (Err(_),Some(e)) => e.port,
            (Err(_),None) => default.port,
        };

        let read_timeout = var("PGTIMEOUT")
            .ok()
            .and_then(|e|e.parse().ok())
            .map(Duration::from_secs);

        Self { host, port, read_timeout }
    }

    /// Parse config from `host:port` address.
    pub fn parse(addr: &str) -> Result<Config, ParseError> {
        Self::parse_inner(ByteStr::copy_from_str(addr))
    }

    /// Parse config from static string address.
    ///
    /// This is for micro optimization, see [`Bytes::from_static`][1].
    ///
    /// [1]: bytes::Bytes::from_static
    pub fn parse_static(addr: &'static str) -> Result<Config, ParseError> {
        Self::parse_inner(ByteStr::from_static(addr))
    }

    fn parse_inner(addr: ByteStr) -> Result<Self, ParseError> {
        let read = addr.as_str();

        // ipv6 host contains colon, so port is after the last one
        let Some(idx) = read.rfind(':') else {
            return Err(ParseError { reason: "port missing".into() })
        };
        let host = read[..idx].trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(ParseError { reason: "host missing".into() })
        }

        let Ok(port) = read[idx + 1..].parse() else {
            return Err(ParseError { reason: "invalid port".into() })
        };

        Ok(Self { host: addr.slice_ref(host), port, read_timeout: None })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    pub fn set_host(mut self, host: impl Into<ByteStr>) -> Self {
        self.host = host.into();
        self
    }

    pub fn set_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Emit [`Event::SocketTimeout`][crate::Event::SocketTimeout] when the client
    /// sends nothing for `timeout`.
    pub fn set_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }
}

impl std::str::FromStr for Config {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Error when parsing address.
pub struct ParseError {
    pub(crate) reason: Cow<'static,str>,
}

impl std::error::Error for ParseError { }

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            return f.write_str(&self.reason)
        }
        write!(f, "failed to parse address: {}", self.reason)
    }
}

impl fmt::Debug for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}
