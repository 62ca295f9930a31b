//! Configuration Module
//!
//! Handles loading node configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::peers::{DEFAULT_BASE_PATH, DEFAULT_REPLICAS};

/// Node configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// This node's base URL, also its identity on the ring
    pub self_addr: String,
    /// Base URLs of every node in the cluster, this one included
    pub peers: Vec<String>,
    /// Bind address of the frontend API, None = API disabled
    pub api_addr: Option<String>,
    /// Path prefix of the peer endpoint
    pub base_path: String,
    /// Virtual nodes per peer on the hash ring
    pub replicas: usize,
    /// Byte budget of the demo group
    pub cache_bytes: i64,
    /// Default TTL of the demo group in seconds, 0 = never expires
    pub ttl_secs: u64,
    /// Peer fetch timeout in milliseconds
    pub peer_timeout_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PEERCACHE_SELF` - This node's base URL (default: http://localhost:8001)
    /// - `PEERCACHE_PEERS` - Comma-separated peer base URLs (default: self only)
    /// - `PEERCACHE_API_ADDR` - Frontend API bind address (default: disabled)
    /// - `PEERCACHE_BASE_PATH` - Peer endpoint base path (default: /_geecache/)
    /// - `PEERCACHE_REPLICAS` - Virtual nodes per peer (default: 50)
    /// - `PEERCACHE_CACHE_BYTES` - Cache byte budget (default: 2048)
    /// - `PEERCACHE_TTL_SECS` - Default entry TTL in seconds (default: 30)
    /// - `PEERCACHE_PEER_TIMEOUT_MS` - Peer fetch timeout (default: 2000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let self_addr = env::var("PEERCACHE_SELF").unwrap_or(defaults.self_addr);

        let peers = env::var("PEERCACHE_PEERS")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|peer| !peer.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|peers| !peers.is_empty())
            .unwrap_or_else(|| vec![self_addr.clone()]);

        Self {
            self_addr,
            peers,
            api_addr: env::var("PEERCACHE_API_ADDR")
                .ok()
                .filter(|addr| !addr.is_empty()),
            base_path: env::var("PEERCACHE_BASE_PATH").unwrap_or(defaults.base_path),
            replicas: parse_var("PEERCACHE_REPLICAS", defaults.replicas),
            cache_bytes: parse_var("PEERCACHE_CACHE_BYTES", defaults.cache_bytes),
            ttl_secs: parse_var("PEERCACHE_TTL_SECS", defaults.ttl_secs),
            peer_timeout_ms: parse_var("PEERCACHE_PEER_TIMEOUT_MS", defaults.peer_timeout_ms),
        }
    }

    /// Socket address to bind the peer endpoint on, derived from `self_addr`.
    pub fn listen_addr(&self) -> String {
        let addr = self.self_addr.as_str();
        let addr = addr
            .strip_prefix("http://")
            .or_else(|| addr.strip_prefix("https://"))
            .unwrap_or(addr);
        addr.trim_end_matches('/').to_string()
    }

    /// Default TTL as a Duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Peer fetch timeout as a Duration.
    pub fn peer_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_timeout_ms)
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        let self_addr = "http://localhost:8001".to_string();
        Self {
            peers: vec![self_addr.clone()],
            self_addr,
            api_addr: None,
            base_path: DEFAULT_BASE_PATH.to_string(),
            replicas: DEFAULT_REPLICAS,
            cache_bytes: 2 << 10,
            ttl_secs: 30,
            peer_timeout_ms: 2000,
        }
    }
}
