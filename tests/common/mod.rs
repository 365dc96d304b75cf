//! Test helpers: an in-process stand-in for the OpenAI endpoints and a
//! shortcut for driving the relay router without binding a port.
#![allow(dead_code)]

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tower::ServiceExt; // for `oneshot`

use prompt_relay::{create_router, AppState, Config};

#[derive(Clone)]
pub enum StubBody {
    Json(Value),
    Text(String),
}

#[derive(Clone)]
pub struct StubReply {
    pub status: StatusCode,
    pub body: StubBody,
    pub delay: Duration,
}

impl StubReply {
    pub fn json(status: StatusCode, body: Value) -> Self {
        StubReply { status, body: StubBody::Json(body), delay: Duration::ZERO }
    }

    pub fn text(status: StatusCode, body: &str) -> Self {
        StubReply { status, body: StubBody::Text(body.to_string()), delay: Duration::ZERO }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    async fn respond(&self) -> Response {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.body {
            StubBody::Json(v) => (self.status, Json(v.clone())).into_response(),
            StubBody::Text(t) => (self.status, t.clone()).into_response(),
        }
    }
}

pub fn completion_reply(content: &str) -> StubReply {
    StubReply::json(
        StatusCode::OK,
        json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] }),
    )
}

pub fn image_reply(url: &str) -> StubReply {
    StubReply::json(StatusCode::OK, json!({ "data": [{ "url": url }] }))
}

struct StubState {
    chat: StubReply,
    image: StubReply,
    chat_calls: AtomicUsize,
    image_calls: AtomicUsize,
    chat_requests: Mutex<Vec<Value>>,
    image_requests: Mutex<Vec<Value>>,
    auth_headers: Mutex<Vec<String>>,
}

/// Running stand-in for the provider, listening on an ephemeral port.
pub struct StubProvider {
    pub base_url: String,
    state: Arc<StubState>,
}

impl StubProvider {
    pub async fn start(chat: StubReply, image: StubReply) -> Self {
        let state = Arc::new(StubState {
            chat,
            image,
            chat_calls: AtomicUsize::new(0),
            image_calls: AtomicUsize::new(0),
            chat_requests: Mutex::new(Vec::new()),
            image_requests: Mutex::new(Vec::new()),
            auth_headers: Mutex::new(Vec::new()),
        });
        let app = Router::new()
            .route("/v1/chat/completions", post(stub_chat))
            .route("/v1/images/generations", post(stub_image))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = axum::Server::from_tcp(listener)
            .unwrap()
            .serve(app.into_make_service());
        tokio::spawn(async move {
            server.await.unwrap();
        });

        StubProvider { base_url: format!("http://{}/v1", addr), state }
    }

    pub fn chat_calls(&self) -> usize {
        self.state.chat_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.state.image_calls.load(Ordering::SeqCst)
    }

    pub fn chat_requests(&self) -> Vec<Value> {
        self.state.chat_requests.lock().unwrap().clone()
    }

    pub fn image_requests(&self) -> Vec<Value> {
        self.state.image_requests.lock().unwrap().clone()
    }

    pub fn auth_headers(&self) -> Vec<String> {
        self.state.auth_headers.lock().unwrap().clone()
    }
}

fn record_auth(state: &StubState, headers: &HeaderMap) {
    if let Some(v) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        state.auth_headers.lock().unwrap().push(v.to_string());
    }
}

async fn stub_chat(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.chat_calls.fetch_add(1, Ordering::SeqCst);
    record_auth(&state, &headers);
    state.chat_requests.lock().unwrap().push(body);
    state.chat.respond().await
}

async fn stub_image(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.image_calls.fetch_add(1, Ordering::SeqCst);
    record_auth(&state, &headers);
    state.image_requests.lock().unwrap().push(body);
    state.image.respond().await
}

/// What the raw-socket provider does after reading a request.
#[derive(Clone)]
pub enum RawReply {
    /// Close the connection without answering.
    Hangup,
    /// Promise a 500-byte 2xx body, send a fragment, then close.
    Truncated,
    /// Answer 200 with the given JSON.
    Json(Value),
}

/// Provider stand-in speaking HTTP/1.1 directly over the socket, for
/// transport failures axum cannot produce.
pub struct RawProvider {
    pub base_url: String,
    chat_calls: Arc<AtomicUsize>,
    image_calls: Arc<AtomicUsize>,
}

impl RawProvider {
    pub async fn start(chat: RawReply, image: RawReply) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let chat_calls = Arc::new(AtomicUsize::new(0));
        let image_calls = Arc::new(AtomicUsize::new(0));

        let (chat_counter, image_counter) = (chat_calls.clone(), image_calls.clone());
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let (chat, image) = (chat.clone(), image.clone());
                let (chat_counter, image_counter) = (chat_counter.clone(), image_counter.clone());
                tokio::spawn(async move {
                    let Some(path) = read_request(&mut socket).await else { return };
                    let reply = if path.ends_with("/chat/completions") {
                        chat_counter.fetch_add(1, Ordering::SeqCst);
                        chat
                    } else {
                        image_counter.fetch_add(1, Ordering::SeqCst);
                        image
                    };
                    match reply {
                        RawReply::Hangup => {}
                        RawReply::Truncated => {
                            let head = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 500\r\n\r\n";
                            let _ = socket.write_all(head.as_bytes()).await;
                            let _ = socket.write_all(br#"{"data":"#).await;
                            let _ = socket.flush().await;
                            let _ = socket.shutdown().await;
                        }
                        RawReply::Json(body) => {
                            let body = body.to_string();
                            let response = format!(
                                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                                body.len(),
                                body
                            );
                            let _ = socket.write_all(response.as_bytes()).await;
                            let _ = socket.shutdown().await;
                        }
                    }
                });
            }
        });

        RawProvider { base_url: format!("http://{}/v1", addr), chat_calls, image_calls }
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }
}

/// Read one request (head plus `Content-Length` body) and return its path.
async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.trim().eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);
    while buf.len() < head_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    head.split_whitespace().nth(1).map(String::from)
}

/// Base URL where nothing is listening.
pub fn closed_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/v1", addr)
}

pub fn relay_config(base_url: &str, extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert("OPENAI_API_KEY".to_string(), "sk-test-key".to_string());
    vars.insert("OPENAI_BASE_URL".to_string(), base_url.to_string());
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

pub fn relay_app(config: &Config) -> Router {
    create_router(Arc::new(AppState::new(config)))
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    (status, bytes.to_vec())
}

pub async fn post_generate(app: Router, content_type: Option<&str>, body: &str) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("POST").uri("/generate-image");
    if let Some(ct) = content_type {
        builder = builder.header("content-type", ct);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    let (status, bytes) = send(app, request).await;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

pub async fn post_prompt(app: Router, prompt: &str) -> (StatusCode, Value) {
    post_generate(app, Some("application/json"), &json!({ "prompt": prompt }).to_string()).await
}
