//! Environment detection and base URL configuration.
//!
//! Server-style environments have no implicit document origin, so
//! root-relative routes must be made absolute before dispatch. The default
//! origin is resolved once per process from the `BASE_URL` and `PORT`
//! variables; individual clients own a [`BaseUrl`] value and can override it
//! at any time without touching process state.
//!
//! An empty base URL models the opposite environment: a transport that
//! resolves relative URLs natively (a browser-backed fetch binding, an
//! in-process test router). Such clients are built with
//! [`BaseUrl::detached`].

use std::env;
use std::sync::LazyLock;

/// Fallback port when neither an explicit port nor `PORT` is set.
const DEFAULT_PORT: u16 = 3000;

static PROCESS_DEFAULT: LazyLock<String> = LazyLock::new(|| {
    env::var("BASE_URL")
        .ok()
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| format!("http://localhost:{}", env_port().unwrap_or(DEFAULT_PORT)))
});

fn env_port() -> Option<u16> {
    env::var("PORT").ok()?.parse().ok()
}

/// The process-wide default base URL, resolved once from `BASE_URL`/`PORT`.
pub fn process_default_base_url() -> &'static str {
    &PROCESS_DEFAULT
}

/// Owned base URL configuration.
///
/// Wrapping the value (instead of a bare module-level variable) lets
/// independent client instances hold distinct base URLs in the same process;
/// clients that share one configuration share the wrapper.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseUrl {
    url: String,
}

impl BaseUrl {
    /// Base URL from an explicit string. A trailing slash is dropped.
    pub fn new<S: Into<String>>(url: S) -> Self {
        let url = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
        }
    }

    /// Base URL from the process environment (`BASE_URL`, else
    /// `http://localhost:<PORT>`, else port 3000).
    pub fn from_env() -> Self {
        Self::new(process_default_base_url())
    }

    /// Empty base URL for transports that resolve relative routes natively.
    pub fn detached() -> Self {
        Self { url: String::new() }
    }

    /// Replace the base URL without going through environment variables.
    ///
    /// With a host, the new base is `<host>` plus `:<port>` when a port is
    /// given. Without a host, it falls back to `http://localhost:<port>`,
    /// where the port defaults to `PORT` and then 3000. Returns the new
    /// value.
    pub fn set(&mut self, host: Option<&str>, port: Option<u16>) -> &str {
        self.url = match host.filter(|h| !h.is_empty()) {
            Some(host) => match port {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            },
            None => format!(
                "http://localhost:{}",
                port.or_else(env_port).unwrap_or(DEFAULT_PORT)
            ),
        };
        &self.url
    }

    /// The current base URL; empty for detached configurations.
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Whether this configuration carries no origin at all.
    pub fn is_empty(&self) -> bool {
        self.url.is_empty()
    }
}

impl Default for BaseUrl {
    fn default() -> Self {
        Self::from_env()
    }
}

impl std::fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}
