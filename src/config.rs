use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::ops::RangeInclusive;

use crate::error::{Error, Result};

/// Default URL path the geocode endpoint is served on.
pub const DEFAULT_PATH: &str = "/geocode";
pub const DEFAULT_PORT: u16 = 8000;
/// Registered (user) port range accepted for the listener.
pub const PORT_RANGE: RangeInclusive<u16> = 1024..=49151;

/// Validated options for the HTTP front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// URL path of the geocode endpoint, always starting with `/`.
    pub path: String,
    pub bind_addr: IpAddr,
    pub port: u16,
    /// `Cache-Control` max-age in seconds for successful responses; 0 omits
    /// the header.
    pub cache_max_age: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_PATH.to_string(),
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            cache_max_age: 0,
        }
    }
}

impl ServerConfig {
    /// Validate raw option values.
    ///
    /// An empty `addr` binds every IPv4 interface. A trailing `?` on `path`
    /// is accepted and dropped, so `/geocode?` and `/geocode` are equivalent.
    /// `port` and `cache_max_age` take wide integers so out-of-range values
    /// from the command line are reported here rather than by the parser.
    pub fn new(path: &str, addr: &str, port: i64, cache_max_age: i64) -> Result<Self> {
        let path = validate_path(path)?;

        let bind_addr = if addr.is_empty() {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            addr.parse().map_err(|_| Error::InvalidConfig {
                reason: format!("bind address '{}' is not a valid IP address", addr),
            })?
        };

        let port = u16::try_from(port)
            .ok()
            .filter(|port| PORT_RANGE.contains(port))
            .ok_or_else(|| Error::InvalidConfig {
                reason: format!(
                    "port {} must be between {} and {}, inclusive",
                    port,
                    PORT_RANGE.start(),
                    PORT_RANGE.end()
                ),
            })?;

        let cache_max_age = u32::try_from(cache_max_age).map_err(|_| Error::InvalidConfig {
            reason: format!(
                "cache-control max-age {} must be 0 or greater (and at most {})",
                cache_max_age,
                u32::MAX
            ),
        })?;

        Ok(Self {
            path,
            bind_addr,
            port,
            cache_max_age,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn validate_path(path: &str) -> Result<String> {
    let trimmed = path.strip_suffix('?').unwrap_or(path);
    let invalid = |why: &str| Error::InvalidConfig {
        reason: format!("relative URL path '{}' {}", path, why),
    };

    if !trimmed.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }
    if trimmed
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '?' | '#' | ':' | '*' | '{' | '}'))
    {
        return Err(invalid("contains reserved characters"));
    }

    Ok(trimmed.to_string())
}
