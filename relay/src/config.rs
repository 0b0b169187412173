//! Configuration module for environment variable parsing.
//!
//! All configuration is read once at startup; secrets themselves are never
//! carried here, only the identifier used to look them up.

use std::env;

use tracing::warn;

/// Forward proxy for outbound Bitbucket Server requests.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Proxy host name
    pub host: String,
    /// Proxy port
    pub port: u16,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Identifier of the secret bundle (path of the mounted secret file)
    pub secret_name: String,

    /// Bitbucket Server base URL for archive downloads
    pub server_url: String,

    /// Destination bucket for published archives
    pub bucket: String,

    /// Object store base URL
    pub store_endpoint: String,

    /// Optional forward proxy for Bitbucket Server requests
    pub proxy: Option<ProxyConfig>,

    /// HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            secret_name: env::var("BITBUCKET_SECRET_NAME").unwrap_or_default(),

            server_url: env::var("BITBUCKET_SERVER_URL").unwrap_or_default(),

            bucket: env::var("S3BUCKET").unwrap_or_default(),

            store_endpoint: env::var("S3_ENDPOINT").unwrap_or_default(),

            proxy: parse_proxy("WEBPROXY_HOST", "WEBPROXY_PORT"),

            request_timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
        }
    }
}

/// Parse the optional proxy pair; both variables must be set for the proxy
/// to take effect.
fn parse_proxy(host_var: &str, port_var: &str) -> Option<ProxyConfig> {
    let host = env::var(host_var).ok().filter(|h| !h.is_empty())?;
    let raw_port = env::var(port_var).ok()?;

    match raw_port.trim().parse::<u16>() {
        Ok(port) => Some(ProxyConfig { host, port }),
        Err(_) => {
            warn!(env_var = port_var, value = %raw_port, "Invalid proxy port, ignoring proxy");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_proxy_valid() {
        env::set_var("TEST_PROXY_HOST_A", "proxy.internal");
        env::set_var("TEST_PROXY_PORT_A", "3128");
        let result = parse_proxy("TEST_PROXY_HOST_A", "TEST_PROXY_PORT_A");
        let proxy = result.expect("proxy should parse");
        assert_eq!(proxy.host, "proxy.internal");
        assert_eq!(proxy.port, 3128);
        env::remove_var("TEST_PROXY_HOST_A");
        env::remove_var("TEST_PROXY_PORT_A");
    }

    #[test]
    fn test_parse_proxy_missing_port() {
        env::set_var("TEST_PROXY_HOST_B", "proxy.internal");
        assert!(parse_proxy("TEST_PROXY_HOST_B", "TEST_PROXY_PORT_B").is_none());
        env::remove_var("TEST_PROXY_HOST_B");
    }

    #[test]
    fn test_parse_proxy_bad_port() {
        env::set_var("TEST_PROXY_HOST_C", "proxy.internal");
        env::set_var("TEST_PROXY_PORT_C", "not-a-port");
        assert!(parse_proxy("TEST_PROXY_HOST_C", "TEST_PROXY_PORT_C").is_none());
        env::remove_var("TEST_PROXY_HOST_C");
        env::remove_var("TEST_PROXY_PORT_C");
    }

    #[test]
    fn test_parse_proxy_unset() {
        assert!(parse_proxy("NONEXISTENT_HOST_VAR", "NONEXISTENT_PORT_VAR").is_none());
    }
}
