//! Local stand-in for the hosted REST and auth APIs.
//!
//! Serves canned answers per HTTP method on an ephemeral port and keeps
//! every request it receives, so adapter tests can check the headers and
//! bodies that actually went over the wire.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Router;

/// One request as the fake backend saw it.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    /// Path and query.
    pub uri: String,
    pub apikey: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Clone)]
struct Shared {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    answers: Arc<HashMap<Method, (StatusCode, String)>>,
}

/// Builder for the canned answers. Methods without an answer get
/// `201 Created` with an empty JSON array.
#[derive(Default)]
pub struct FakeBackend {
    answers: HashMap<Method, (StatusCode, String)>,
}

/// A running fake backend.
pub struct RunningBackend {
    pub url: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, method: Method, status: StatusCode, body: &str) -> Self {
        self.answers.insert(method, (status, body.to_string()));
        self
    }

    pub async fn start(self) -> RunningBackend {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let shared = Shared {
            requests: requests.clone(),
            answers: Arc::new(self.answers),
        };
        let app = Router::new().fallback(answer).with_state(shared);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let url = format!("http://{}", listener.local_addr().expect("local addr"));
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake backend stopped");
        });

        RunningBackend { url, requests }
    }
}

impl RunningBackend {
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().expect("fake backend lock").clone()
    }

    pub fn last_request(&self) -> CapturedRequest {
        self.requests()
            .pop()
            .expect("fake backend received no request")
    }
}

async fn answer(
    State(shared): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let (status, payload) = shared
        .answers
        .get(&method)
        .cloned()
        .unwrap_or((StatusCode::CREATED, "[]".to_string()));

    shared
        .requests
        .lock()
        .expect("fake backend lock")
        .push(CapturedRequest {
            method,
            uri: uri.to_string(),
            apikey: header_value("apikey"),
            authorization: header_value("authorization"),
            body: String::from_utf8_lossy(&body).into_owned(),
        });

    (status, [(header::CONTENT_TYPE, "application/json")], payload)
}
