use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::Deserialize;

/// Desktop Chrome user agent used for relayed segments and provider API calls.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Read buffer hint for relayed bodies, sized for a typical video chunk (64 KB).
pub const RELAY_CHUNK_BYTES: usize = 64 * 1024;

/// Connect budget for reaching a segment origin.
pub const UPSTREAM_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum idle time between two reads from a segment origin.
pub const UPSTREAM_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Content type assumed when the origin does not declare one.
pub const DEFAULT_SEGMENT_CONTENT_TYPE: &str = "video/mp2t";

/// Published segments never change, so clients may keep them for a year.
pub const SEGMENT_CACHE_CONTROL: &str = "public, max-age=31536000";

/// Environment variable that turns the segment relay off when set to exactly `true`.
pub const DISABLE_RELAY_ENV: &str = "DISABLE_M3U8";

/// Environment variable selecting quiet production logging (`true` or `TRUE`).
pub const PRODUCTION_ENV: &str = "PRODUCTION";

/// Process configuration, resolved once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Address the relay server binds to.
    pub host: IpAddr,
    /// Port the relay server listens on.
    pub port: u16,
    /// Short-circuit every relay call with the fixed "disabled" response.
    pub relay_disabled: bool,
    /// Quiet logging: only warnings and errors unless `RUST_LOG` says otherwise.
    pub production: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            relay_disabled: false,
            production: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Unset or unparseable values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST").and_then(|v| v.trim().parse().ok()) {
            config.host = host;
        }
        if let Some(port) = lookup("PORT").and_then(|v| v.trim().parse().ok()) {
            config.port = port;
        }

        // Case-sensitive on purpose: only the literal `true` disables the relay.
        config.relay_disabled = lookup(DISABLE_RELAY_ENV).as_deref() == Some("true");
        config.production = matches!(lookup(PRODUCTION_ENV).as_deref(), Some("true" | "TRUE"));

        config
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
