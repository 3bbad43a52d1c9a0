//! Simulated spreadsheet endpoints for integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::LOCATION;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::{any, post};
use axum::Router;
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

/// A request captured by the simulated endpoint
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub content_type: Option<String>,
    pub user_agent: Option<String>,
    pub body: Value,
}

/// Canned endpoint behaviour plus everything it received
pub struct EndpointState {
    status: StatusCode,
    body: String,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl EndpointState {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

async fn capture(
    State(state): State<Arc<EndpointState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    record(&state, &headers, &body);
    (state.status, state.body.clone())
}

/// Start an endpoint that answers every POST with `status` and `body`
pub async fn spawn_endpoint(status: u16, body: &str) -> (String, Arc<EndpointState>) {
    let state = Arc::new(EndpointState {
        status: StatusCode::from_u16(status).unwrap(),
        body: body.to_string(),
        requests: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/exec", post(capture))
        .with_state(Arc::clone(&state));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/exec"), state)
}

fn record(state: &EndpointState, headers: &HeaderMap, body: &Bytes) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    state.requests.lock().unwrap().push(RecordedRequest {
        content_type: header("content-type"),
        user_agent: header("user-agent"),
        body: serde_json::from_slice(body).unwrap_or(Value::Null),
    });
}

async fn redirect_to_echo(
    State(state): State<Arc<EndpointState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, [(axum::http::HeaderName, &'static str); 1]) {
    record(&state, &headers, &body);
    (StatusCode::FOUND, [(LOCATION, "/echo")])
}

async fn echo_success(
    State(state): State<Arc<EndpointState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    record(&state, &headers, &body);
    (StatusCode::OK, r#"{"status":"success"}"#)
}

/// Start an endpoint whose `/exec` answers `302 Location: /echo`, while
/// `/echo` reports success; both record what they receive
pub async fn spawn_redirecting_endpoint() -> (String, Arc<EndpointState>) {
    let state = Arc::new(EndpointState {
        status: StatusCode::FOUND,
        body: String::new(),
        requests: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/exec", post(redirect_to_echo))
        .route("/echo", any(echo_success))
        .with_state(Arc::clone(&state));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/exec"), state)
}

/// A request captured by the simulated identity service
#[derive(Debug, Clone)]
pub struct IdentityRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

/// Canned identity service reply plus everything it received
pub struct IdentityState {
    status: StatusCode,
    body: String,
    requests: Mutex<Vec<IdentityRequest>>,
}

impl IdentityState {
    pub fn requests(&self) -> Vec<IdentityRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn identity_capture(
    State(state): State<Arc<IdentityState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    state.requests.lock().unwrap().push(IdentityRequest {
        path: uri.path().to_string(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    (state.status, state.body.clone())
}

/// Start an identity service answering every request with `status` and
/// `body`; returns the base URL to hand to the lookup client
pub async fn spawn_identity_endpoint(status: u16, body: &str) -> (String, Arc<IdentityState>) {
    let state = Arc::new(IdentityState {
        status: StatusCode::from_u16(status).unwrap(),
        body: body.to_string(),
        requests: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .fallback(identity_capture)
        .with_state(Arc::clone(&state));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/v1"), state)
}

/// Connection counters for the stalling endpoint
#[derive(Clone, Default)]
pub struct StallCounters {
    pub accepted: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
}

impl StallCounters {
    /// Wait until every accepted connection has been closed by the client
    pub async fn wait_all_closed(&self, limit: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + limit;
        loop {
            let accepted = self.accepted.load(Ordering::SeqCst);
            if accepted > 0 && self.closed.load(Ordering::SeqCst) == accepted {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

/// Start an endpoint that reads requests but never answers
pub async fn spawn_stalling_endpoint() -> (String, StallCounters) {
    let tracker = StallCounters::default();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let counters = tracker.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            counters.accepted.fetch_add(1, Ordering::SeqCst);
            let closed = Arc::clone(&counters.closed);
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                loop {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => {
                            closed.fetch_add(1, Ordering::SeqCst);
                            break;
                        }
                        Ok(_) => continue,
                    }
                }
            });
        }
    });

    (format!("http://{addr}/exec"), tracker)
}

/// An address with nothing listening on it
pub async fn unused_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
