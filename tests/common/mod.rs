use std::collections::HashMap;
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::oneshot;

/// Nothing listens here; requests fail fast with a connection error.
pub const UNREACHABLE_SERVER: &str = "http://127.0.0.1:9";

#[allow(dead_code)]
pub fn run_clipcoach(args: &[&str]) -> Output {
    TestEnv::new().run(args)
}

pub struct TestEnv {
    home: TempDir,
    config: TempDir,
    data: TempDir,
    server_url: String,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_server(UNREACHABLE_SERVER)
    }

    pub fn with_server(url: &str) -> Self {
        Self {
            home: tempfile::tempdir().expect("create temporary HOME dir"),
            config: tempfile::tempdir().expect("create temporary XDG config dir"),
            data: tempfile::tempdir().expect("create temporary XDG data dir"),
            server_url: url.to_string(),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_clipcoach"));
        cmd.args(args)
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.config.path())
            .env("XDG_DATA_HOME", self.data.path())
            .env("CLIPCOACH_SERVER_URL", &self.server_url)
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args)
            .output()
            .expect("failed to execute clipcoach binary")
    }

    #[allow(dead_code)]
    pub fn run_with_stdin(&self, args: &[&str], input: &str) -> Output {
        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to spawn clipcoach binary");

        child
            .stdin
            .take()
            .expect("child stdin")
            .write_all(input.as_bytes())
            .expect("write child stdin");

        child.wait_with_output().expect("wait for clipcoach binary")
    }

    #[allow(dead_code)]
    pub fn config_path(&self) -> PathBuf {
        let output = self.run(&["config", "path"]);
        assert!(
            output.status.success(),
            "config path should succeed\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );

        let path = String::from_utf8_lossy(&output.stdout);
        PathBuf::from(path.trim())
    }

    #[allow(dead_code)]
    pub fn write_config(&self, contents: &str) {
        let config_path = self.config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).expect("create config parent directory");
        }
        std::fs::write(&config_path, contents).expect("write config file");
    }
}

/// A request the mock service received
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub body: Value,
}

struct MockState {
    videos: Vec<Value>,
    videos_status: Option<StatusCode>,
    upload_reply: Value,
    thumbnail_reply: Option<(StatusCode, Value)>,
    chat_status: Option<StatusCode>,
    chat_history: Vec<Value>,
    requests: Vec<Recorded>,
    delay: Duration,
}

impl MockState {
    async fn pause(state: &Shared) {
        let delay = state.lock().unwrap().delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn record(&mut self, path: &str, body: Value) {
        self.requests.push(Recorded {
            path: path.to_string(),
            body,
        });
    }
}

type Shared = Arc<Mutex<MockState>>;

/// In-process stand-in for the feedback service.
///
/// Runs on its own thread and runtime so both blocking CLI tests and async
/// client tests can talk to it.
#[allow(dead_code)]
pub struct MockServer {
    addr: SocketAddr,
    state: Shared,
    shutdown: Option<oneshot::Sender<()>>,
}

#[allow(dead_code)]
impl MockServer {
    pub fn start() -> Self {
        let state = Arc::new(Mutex::new(MockState {
            videos: Vec::new(),
            videos_status: None,
            upload_reply: analysed_video("uploaded-1", None),
            thumbnail_reply: None,
            chat_status: None,
            chat_history: Vec::new(),
            requests: Vec::new(),
            delay: Duration::ZERO,
        }));

        let app = Router::new()
            .route("/api/videos", get(list_videos))
            .route("/api/upload", post(upload))
            .route("/api/generate-image", post(generate_image))
            .route("/api/chat", post(chat))
            .layer(DefaultBodyLimit::disable())
            .with_state(state.clone());

        let (addr_tx, addr_rx) = std::sync::mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        // Detached: the server thread winds down once shutdown fires and
        // clients let go of their connections.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("build mock runtime");

            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind mock server");
                addr_tx
                    .send(listener.local_addr().expect("mock server address"))
                    .expect("report mock server address");

                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = shutdown_rx.await;
                    })
                    .await
                    .expect("mock server");
            });
        });

        let addr = addr_rx.recv().expect("mock server did not start");

        Self {
            addr,
            state,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_videos(&self, videos: Vec<Value>) {
        self.state.lock().unwrap().videos = videos;
    }

    pub fn fail_videos(&self, status: StatusCode) {
        self.state.lock().unwrap().videos_status = Some(status);
    }

    pub fn set_upload_reply(&self, reply: Value) {
        self.state.lock().unwrap().upload_reply = reply;
    }

    pub fn set_thumbnail_reply(&self, status: StatusCode, reply: Value) {
        self.state.lock().unwrap().thumbnail_reply = Some((status, reply));
    }

    /// Hold every list, upload and chat reply back by `delay`
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = delay;
    }

    pub fn fail_chat(&self, status: StatusCode) {
        self.state.lock().unwrap().chat_status = Some(status);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// A fully analysed record as the service stores it
#[allow(dead_code)]
pub fn analysed_video(video_id: &str, thumbnail_url: Option<&str>) -> Value {
    json!({
        "video_id": video_id,
        "video_path": format!("uploads/{} clip.mp4", video_id),
        "filename": format!("{}%20clip.mp4", video_id),
        "summary": "Great clip with a clean triple kill in the final circle",
        "advice": {
            "good": ["Crosshair placement"],
            "bad": ["Peeked without utility"],
            "improve": ["Trade your teammate faster"]
        },
        "chapters": [
            {
                "chapter_number": 1,
                "chapter_title": "Opening",
                "chapter_summary": "Rotation to site",
                "start": 0.0,
                "end": 12.5
            }
        ],
        "thumbnail_url": thumbnail_url
    })
}

async fn list_videos(State(state): State<Shared>) -> Response {
    MockState::pause(&state).await;
    let mut state = state.lock().unwrap();
    state.record("/api/videos", Value::Null);

    match state.videos_status {
        Some(status) => (status, Json(json!({"error": "listing unavailable"}))).into_response(),
        None => Json(Value::Array(state.videos.clone())).into_response(),
    }
}

async fn upload(State(state): State<Shared>, request: Request) -> Response {
    MockState::pause(&state).await;
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    let body = if is_multipart {
        let mut multipart = match Multipart::from_request(request, &()).await {
            Ok(multipart) => multipart,
            Err(rejection) => return rejection.into_response(),
        };

        let mut fields = serde_json::Map::new();
        while let Ok(Some(field)) = multipart.next_field().await {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await.unwrap_or_default();
            fields.insert(name, json!({"file_name": file_name, "len": bytes.len()}));
        }
        Value::Object(fields)
    } else {
        match Form::<HashMap<String, String>>::from_request(request, &()).await {
            Ok(Form(form)) => json!(form),
            Err(rejection) => return rejection.into_response(),
        }
    };

    let mut state = state.lock().unwrap();
    state.record("/api/upload", body);
    let reply = state.upload_reply.clone();
    state.videos.push(reply.clone());
    Json(reply).into_response()
}

async fn generate_image(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    state.record("/api/generate-image", body.clone());

    let (status, reply) = state.thumbnail_reply.clone().unwrap_or_else(|| {
        (
            StatusCode::OK,
            json!({"thumbnail_url": "/static/thumbnails/generated.png"}),
        )
    });

    if status.is_success() {
        let url = reply
            .get("thumbnail_url")
            .or_else(|| reply.get("image_url"))
            .cloned();
        if let Some(url) = url {
            for video in state.videos.iter_mut() {
                if video.get("video_id") == body.get("video_id") {
                    video["thumbnail_url"] = url.clone();
                }
            }
        }
    }

    (status, Json(reply)).into_response()
}

async fn chat(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    MockState::pause(&state).await;
    let mut state = state.lock().unwrap();
    state.record("/api/chat", body.clone());

    if let Some(status) = state.chat_status {
        return (status, Json(json!({"error": "model offline"}))).into_response();
    }

    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let reply = format!("Coach says: {}", message);
    state
        .chat_history
        .push(json!({"user": message, "ai": reply}));

    Json(json!({"history": state.chat_history})).into_response()
}
