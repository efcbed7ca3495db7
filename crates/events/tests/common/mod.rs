#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use applyhook_core::ApplyResult;

/// A request as seen by the test receiver.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[derive(Clone)]
struct ReceiverState {
    status: StatusCode,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

/// Handle to a running webhook receiver.
pub struct TestReceiver {
    /// URL that records the request and answers with the configured status.
    pub url: String,
    /// URL that never answers within a test's lifetime.
    pub slow_url: String,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl TestReceiver {
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().unwrap().clone()
    }
}

async fn record(
    State(state): State<ReceiverState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    state.captured.lock().unwrap().push(CapturedRequest {
        headers,
        body: body.to_vec(),
    });
    state.status
}

async fn stall() -> StatusCode {
    tokio::time::sleep(Duration::from_secs(60)).await;
    StatusCode::OK
}

/// Start an axum receiver on an ephemeral localhost port.
pub async fn spawn_receiver(status: StatusCode) -> TestReceiver {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let state = ReceiverState {
        status,
        captured: captured.clone(),
    };

    let app = Router::new()
        .route("/hook", post(record))
        .route("/slow", post(stall))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestReceiver {
        url: format!("http://{addr}/hook"),
        slow_url: format!("http://{addr}/slow"),
        captured,
    }
}

/// Start a bare TCP server that answers every connection with `head` and
/// `body`, then holds the socket open without sending anything else.
///
/// Used for responses axum will not produce, such as a body shorter than
/// its `content-length`.
pub async fn spawn_raw_responder(head: &str, body: Vec<u8>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let head = head.as_bytes().to_vec();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let head = head.clone();
            let body = body.clone();
            tokio::spawn(async move {
                let mut request = [0u8; 8192];
                let _ = socket.read(&mut request).await;
                let _ = socket.write_all(&head).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.flush().await;
                tokio::time::sleep(Duration::from_secs(60)).await;
            });
        }
    });

    format!("http://{addr}/hook")
}

/// A localhost URL with nothing listening behind it.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/hook")
}

pub fn apply_result() -> ApplyResult {
    ApplyResult {
        workspace: "production".to_string(),
        repo_full_name: "org/repo".to_string(),
        pull_num: 1,
        pull_url: "url".to_string(),
        base_branch: "main".to_string(),
        user: "alice".to_string(),
        success: true,
    }
}
