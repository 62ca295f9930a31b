//! HTTP Peer Pool
//!
//! Peer-set management, the HTTP client used to fetch from peers, and the
//! server side answering those fetches.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use bytes::Bytes;
use parking_lot::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::error::{CacheError, Result};
use crate::group::GroupRegistry;
use crate::peers::{HashRing, PeerGetter, PeerPicker, DEFAULT_REPLICAS};

/// Path prefix of the peer endpoint.
pub const DEFAULT_BASE_PATH: &str = "/_geecache/";

/// Upper bound on a single peer fetch.
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(2);

// == HTTP Getter ==
/// Client for one remote peer.
#[derive(Debug, Clone)]
pub struct HttpGetter {
    /// Peer URL with the base path appended, e.g. `http://10.0.0.2:8001/_geecache/`
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpGetter {
    /// Creates a client for the peer at `base_url` (base path included).
    pub fn new(base_url: impl Into<String>, client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            client,
            timeout,
        }
    }

    /// URL fetched for `(group, key)`.
    pub fn url_for(&self, group: &str, key: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            urlencoding::encode(group),
            urlencoding::encode(key)
        )
    }
}

#[async_trait]
impl PeerGetter for HttpGetter {
    async fn fetch(&self, group: &str, key: &str) -> Result<Bytes> {
        let url = self.url_for(group, key);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| CacheError::PeerUnavailable(err.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(CacheError::PeerUnavailable(format!("bad status: {status}")));
        }

        response
            .bytes()
            .await
            .map_err(|err| CacheError::PeerUnavailable(err.to_string()))
    }
}

#[derive(Debug, Default)]
struct PeerSet {
    ring: Option<HashRing>,
    getters: HashMap<String, Arc<HttpGetter>>,
}

// == HTTP Pool ==
/// Routes keys to peers over HTTP and serves this node's values to them.
///
/// Peers are identified by their base URL (e.g. `http://localhost:8001`).
/// A key owned by this node itself is never fetched over the network.
#[derive(Debug)]
pub struct HttpPool {
    /// This node's own base URL
    self_addr: String,
    base_path: String,
    replicas: usize,
    client: reqwest::Client,
    timeout: Duration,
    peers: RwLock<PeerSet>,
}

impl HttpPool {
    // == Constructor ==
    /// Creates a pool for the node reachable at `self_addr`, with defaults.
    pub fn new(self_addr: impl Into<String>) -> Self {
        Self {
            self_addr: self_addr.into(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            replicas: DEFAULT_REPLICAS,
            client: reqwest::Client::new(),
            timeout: DEFAULT_PEER_TIMEOUT,
            peers: RwLock::new(PeerSet::default()),
        }
    }

    // == Options ==
    /// Sets the endpoint base path. Empty keeps the default; the result always
    /// starts and ends with `/`.
    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = normalize_base_path(base_path);
        self
    }

    /// Sets virtual nodes per peer. Zero keeps the current value.
    pub fn with_replicas(mut self, replicas: usize) -> Self {
        if replicas > 0 {
            self.replicas = replicas;
        }
        self
    }

    /// Uses a preconfigured HTTP client for peer fetches.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Sets the per-fetch timeout. Zero keeps the current value.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.timeout = timeout;
        }
        self
    }

    // == Accessors ==
    /// This node's base URL.
    pub fn self_addr(&self) -> &str {
        &self.self_addr
    }

    /// Normalized endpoint base path.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Virtual nodes per peer.
    pub fn replicas(&self) -> usize {
        self.replicas
    }

    /// Per-fetch timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // == Set Peers ==
    /// Replaces the peer set, rebuilding the ring and one client per peer.
    pub fn set_peers<S: AsRef<str>>(&self, peers: &[S]) {
        let mut ring = HashRing::new(self.replicas);
        ring.set_peers(peers);

        let getters = peers
            .iter()
            .map(|peer| {
                let peer = peer.as_ref();
                let getter = HttpGetter::new(
                    format!("{peer}{}", self.base_path),
                    self.client.clone(),
                    self.timeout,
                );
                (peer.to_string(), Arc::new(getter))
            })
            .collect();

        *self.peers.write() = PeerSet {
            ring: Some(ring),
            getters,
        };
        info!(node = %self.self_addr, peers = peers.len(), "peer set updated");
    }

    /// Current peer identifiers, sorted.
    pub fn peers(&self) -> Vec<String> {
        let mut peers: Vec<String> = self.peers.read().getters.keys().cloned().collect();
        peers.sort();
        peers
    }

    // == Router ==
    /// Axum router answering `{base_path}{group}/{key}` from `registry`.
    pub fn router(self: &Arc<Self>, registry: Arc<GroupRegistry>) -> Router {
        let state = PeerServerState {
            pool: self.clone(),
            registry,
        };

        Router::new()
            .fallback(serve_peer)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

impl PeerPicker for HttpPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>> {
        // URL parsers collapse "." and ".." path segments, so these keys
        // cannot be addressed on a peer
        if is_dot_segment(key) {
            debug!(node = %self.self_addr, key, "dot segment key served locally");
            return None;
        }

        let peers = self.peers.read();
        let owner = peers.ring.as_ref()?.get(key)?;
        if owner == self.self_addr {
            return None;
        }

        debug!(node = %self.self_addr, peer = owner, key, "pick peer");
        let getter = peers.getters.get(owner)?.clone();
        Some(getter)
    }
}

fn is_dot_segment(key: &str) -> bool {
    key == "." || key == ".."
}

/// Ensures a leading and trailing `/`; empty means the default path.
fn normalize_base_path(base_path: &str) -> String {
    if base_path.is_empty() {
        return DEFAULT_BASE_PATH.to_string();
    }

    let mut path = String::with_capacity(base_path.len() + 2);
    if !base_path.starts_with('/') {
        path.push('/');
    }
    path.push_str(base_path);
    if !path.ends_with('/') {
        path.push('/');
    }
    path
}

// == Peer Server ==
#[derive(Clone)]
struct PeerServerState {
    pool: Arc<HttpPool>,
    registry: Arc<GroupRegistry>,
}

fn plain_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, message.into()).into_response()
}

/// Handles `{base_path}{group}/{key}` for any method.
async fn serve_peer(State(state): State<PeerServerState>, uri: Uri) -> Response {
    let path = uri.path();
    let Some(rest) = path.strip_prefix(state.pool.base_path()) else {
        return plain_error(StatusCode::BAD_REQUEST, "bad request path");
    };
    debug!(node = %state.pool.self_addr(), path, "serving peer request");

    let Some((group_name, key)) = rest.split_once('/') else {
        return plain_error(StatusCode::BAD_REQUEST, "bad request");
    };
    let (Ok(group_name), Ok(key)) = (urlencoding::decode(group_name), urlencoding::decode(key))
    else {
        return plain_error(StatusCode::BAD_REQUEST, "bad request");
    };
    if group_name.is_empty() || key.is_empty() {
        return plain_error(StatusCode::BAD_REQUEST, "bad request");
    }

    let Some(group) = state.registry.get_group(&group_name) else {
        return plain_error(StatusCode::NOT_FOUND, "group not found");
    };

    match group.get(&key).await {
        Ok(view) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            view.to_bytes(),
        )
            .into_response(),
        Err(err) => plain_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}
