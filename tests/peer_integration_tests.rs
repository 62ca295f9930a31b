//! Integration Tests for Peer Transport
//!
//! Runs real nodes on loopback listeners and checks that keys are fetched
//! from their owner, that failures fall back to the local source, and that
//! the frontend API serves the same group.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use peercache::api::create_router;
use peercache::peers::{HttpGetter, DEFAULT_PEER_TIMEOUT};
use peercache::{AppState, CacheError, Group, GroupRegistry, HttpPool, PeerGetter, PeerPicker};
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;

// == Helper Functions ==

struct Node {
    addr: String,
    pool: Arc<HttpPool>,
    group: Arc<Group>,
    source_calls: Arc<AtomicUsize>,
}

/// Binds a loopback listener and returns it with its base URL.
async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = format!("http://{}", listener.local_addr().unwrap());
    (listener, addr)
}

/// Base URL of a port nobody listens on.
async fn dead_addr() -> String {
    let (listener, addr) = bind().await;
    drop(listener);
    addr
}

/// Starts a node serving the `scores` group from its own registry.
fn start_node(listener: TcpListener, addr: String, peers: &[String]) -> Node {
    let registry = Arc::new(GroupRegistry::new());
    let source_calls = Arc::new(AtomicUsize::new(0));
    let calls = source_calls.clone();
    let owner = addr.clone();
    let group = registry.create_group("scores", 2 << 10, move |key: &str| -> anyhow::Result<Vec<u8>> {
        calls.fetch_add(1, Ordering::SeqCst);
        if key.starts_with("missing") {
            anyhow::bail!("{key} not exist");
        }
        Ok(format!("{key}@{owner}").into_bytes())
    });

    let pool = Arc::new(HttpPool::new(addr.clone()));
    pool.set_peers(peers);
    group.register_peers(pool.clone());

    let router = pool.router(registry);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Node {
        addr,
        pool,
        group,
        source_calls,
    }
}

/// First generated key the node routes to a remote peer.
fn remote_key(node: &Node) -> String {
    (0..1000)
        .map(|i| format!("key-{i}"))
        .find(|key| node.pool.pick_peer(key).is_some())
        .expect("no key routed to a remote peer")
}

/// First generated key the node keeps for itself.
fn local_key(node: &Node) -> String {
    (0..1000)
        .map(|i| format!("key-{i}"))
        .find(|key| node.pool.pick_peer(key).is_none())
        .expect("no key owned locally")
}

// == Peer Fetch Tests ==

#[tokio::test]
async fn test_remote_key_is_loaded_by_its_owner() {
    let (listener_a, addr_a) = bind().await;
    let (listener_b, addr_b) = bind().await;
    let peers = vec![addr_a.clone(), addr_b.clone()];
    let a = start_node(listener_a, addr_a, &peers);
    let b = start_node(listener_b, addr_b, &peers);

    let key = remote_key(&a);
    let value = a.group.get(&key).await.unwrap();

    assert_eq!(value.to_string(), format!("{key}@{}", b.addr));
    assert_eq!(a.source_calls.load(Ordering::SeqCst), 0);
    assert_eq!(b.source_calls.load(Ordering::SeqCst), 1);
    assert_eq!(a.group.stats().peer_loads, 1);
    assert_eq!(b.group.stats().local_loads, 1);

    // Second read is served from A's own cache
    a.group.get(&key).await.unwrap();
    assert_eq!(a.group.stats().hits, 1);
    assert_eq!(b.group.stats().misses, 1);
}

#[tokio::test]
async fn test_local_key_never_leaves_the_node() {
    let (listener_a, addr_a) = bind().await;
    let (listener_b, addr_b) = bind().await;
    let peers = vec![addr_a.clone(), addr_b.clone()];
    let a = start_node(listener_a, addr_a, &peers);
    let b = start_node(listener_b, addr_b, &peers);

    let key = local_key(&a);
    let value = a.group.get(&key).await.unwrap();

    assert_eq!(value.to_string(), format!("{key}@{}", a.addr));
    assert_eq!(a.source_calls.load(Ordering::SeqCst), 1);
    assert_eq!(b.source_calls.load(Ordering::SeqCst), 0);
    assert_eq!(a.group.stats().peer_loads, 0);
}

#[tokio::test]
async fn test_dot_segment_keys_load_locally() {
    let (listener_a, addr_a) = bind().await;
    let (listener_b, addr_b) = bind().await;
    let a = start_node(listener_a, addr_a, &[addr_b.clone()]);
    let b = start_node(listener_b, addr_b.clone(), &[addr_b]);

    for key in [".", ".."] {
        let value = a.group.get(key).await.unwrap();
        assert_eq!(value.to_string(), format!("{key}@{}", a.addr));
    }

    let stats = a.group.stats();
    assert_eq!(stats.peer_failures, 0);
    assert_eq!(stats.peer_loads, 0);
    assert_eq!(stats.local_loads, 2);
    assert_eq!(b.source_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_dead_peer_falls_back_to_local_source() {
    let (listener_a, addr_a) = bind().await;
    let dead = dead_addr().await;
    let peers = vec![addr_a.clone(), dead];
    let a = start_node(listener_a, addr_a, &peers);

    let key = remote_key(&a);
    let value = a.group.get(&key).await.unwrap();

    assert_eq!(value.to_string(), format!("{key}@{}", a.addr));
    let stats = a.group.stats();
    assert_eq!(stats.peer_failures, 1);
    assert_eq!(stats.local_loads, 1);
    assert_eq!(stats.peer_loads, 0);
}

#[tokio::test]
async fn test_missing_key_on_owner_falls_back_and_reports_not_found() {
    let (listener_a, addr_a) = bind().await;
    let (listener_b, addr_b) = bind().await;
    let peers = vec![addr_a.clone(), addr_b.clone()];
    let a = start_node(listener_a, addr_a, &peers);
    let _b = start_node(listener_b, addr_b, &peers);

    let key = (0..1000)
        .map(|i| format!("missing-{i}"))
        .find(|key| a.pool.pick_peer(key).is_some())
        .unwrap();

    assert_eq!(
        a.group.get(&key).await,
        Err(CacheError::NotFound(key.clone()))
    );
    let stats = a.group.stats();
    assert_eq!(stats.peer_failures, 1);
    assert_eq!(stats.local_loads, 1);
    assert_eq!(stats.entries, 0);
}

#[tokio::test]
async fn test_http_getter_status_errors() {
    let (listener_b, addr_b) = bind().await;
    let b = start_node(listener_b, addr_b.clone(), &[addr_b.clone()]);

    let getter = HttpGetter::new(
        format!("{}/_geecache/", b.addr),
        reqwest::Client::new(),
        DEFAULT_PEER_TIMEOUT,
    );

    let bytes = getter.fetch("scores", "Tom").await.unwrap();
    assert_eq!(&bytes[..], format!("Tom@{}", b.addr).as_bytes());

    let err = getter.fetch("unknown-group", "Tom").await.unwrap_err();
    assert!(matches!(err, CacheError::PeerUnavailable(msg) if msg.contains("404")));

    let err = getter.fetch("scores", "missing-1").await.unwrap_err();
    assert!(matches!(err, CacheError::PeerUnavailable(msg) if msg.contains("500")));
}

// == Frontend API Tests ==

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_api_serves_group() {
    let (listener, addr) = bind().await;
    let node = start_node(listener, addr.clone(), &[addr]);
    let app = create_router(AppState::new(node.group.clone()));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api?key=Tom").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/octet-stream"
    );

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/batch?keys=Tom,missing-x")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["data"]["Tom"], format!("Tom@{}", node.addr));
    assert_eq!(json["errors"]["missing-x"], "key not found: missing-x");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/delete?key=Tom")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(Request::builder().uri("/api/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["name"], "scores");
    assert_eq!(json["hits"], 1);
    assert_eq!(json["entries"], 0);
    assert_eq!(json["evictions"], 1);
}

#[tokio::test]
async fn test_api_load_failure_is_500() {
    let (listener, addr) = bind().await;
    let node = start_node(listener, addr.clone(), &[addr]);
    let app = create_router(AppState::new(node.group));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api?key=missing-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "key not found: missing-1");
}
