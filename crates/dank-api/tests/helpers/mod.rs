//! Test helpers: an in-process gateway wired to a stub seaweed cluster.
//!
//! One stub server plays both master and volume: `/dir/assign` and
//! `/dir/lookup` report the stub's own address, and the needle paths record
//! what the gateway forwards.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use axum_test::TestServer;
use bytes::Bytes;

use dank_api::AppState;
use dank_api::setup::routes::build_router;
use dank_core::Signer;
use dank_seaweed::{SeaweedClient, SrvResolver};

pub const TEST_SECRET: &str = "0123456789abcdef";

/// One multipart PUT as the volume saw it.
#[derive(Debug, Clone)]
pub struct ReceivedUpload {
    pub fid: String,
    pub file_name: String,
    pub bytes: Bytes,
    pub content_type: String,
    pub query: HashMap<String, String>,
}

#[derive(Default)]
pub struct StubState {
    pub addr: Mutex<String>,
    pub assign_count: AtomicUsize,
    pub lookup_empty: AtomicBool,
    pub uploads: Mutex<Vec<ReceivedUpload>>,
    pub get_count: AtomicUsize,
    pub delete_count: AtomicUsize,
}

pub struct StubCluster {
    pub addr: String,
    pub state: Arc<StubState>,
}

impl StubCluster {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = format!("{}", listener.local_addr().unwrap());

        let state = Arc::new(StubState::default());
        *state.addr.lock().unwrap() = addr.clone();

        let router = Router::new()
            .route("/dir/assign", get(stub_assign))
            .route("/dir/lookup", get(stub_lookup))
            .route("/{fid}", put(stub_put).get(stub_get).delete(stub_delete))
            .with_state(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, state }
    }

    /// The fid handed out by the n-th assign (0-based).
    pub fn fid_for(&self, n: usize) -> String {
        format!("3,017{:08x}", n)
    }

    pub fn uploads(&self) -> Vec<ReceivedUpload> {
        self.state.uploads.lock().unwrap().clone()
    }

    pub fn set_lookup_empty(&self, empty: bool) {
        self.state.lookup_empty.store(empty, Ordering::SeqCst);
    }

    pub fn get_count(&self) -> usize {
        self.state.get_count.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.state.delete_count.load(Ordering::SeqCst)
    }
}

async fn stub_assign(State(state): State<Arc<StubState>>) -> Json<serde_json::Value> {
    let n = state.assign_count.fetch_add(1, Ordering::SeqCst);
    let fid = format!("3,017{:08x}", n);
    let addr = state.addr.lock().unwrap().clone();
    Json(serde_json::json!({"fid": fid, "url": addr, "count": 1}))
}

async fn stub_lookup(State(state): State<Arc<StubState>>) -> Json<serde_json::Value> {
    if state.lookup_empty.load(Ordering::SeqCst) {
        return Json(serde_json::json!({"locations": []}));
    }
    let addr = state.addr.lock().unwrap().clone();
    Json(serde_json::json!({"locations": [{"url": addr}]}))
}

async fn stub_put(
    State(state): State<Arc<StubState>>,
    Path(fid): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    mut multipart: Multipart,
) -> StatusCode {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or("").to_string();
            let content_type = field.content_type().unwrap_or("").to_string();
            let bytes = field.bytes().await.unwrap_or_default();
            state.uploads.lock().unwrap().push(ReceivedUpload {
                fid,
                file_name,
                bytes,
                content_type,
                query,
            });
            return StatusCode::CREATED;
        }
    }
    StatusCode::BAD_REQUEST
}

async fn stub_get(State(state): State<Arc<StubState>>) -> impl IntoResponse {
    state.get_count.fetch_add(1, Ordering::SeqCst);
    (
        [
            (header::CONTENT_TYPE, "image/gif"),
            (header::CACHE_CONTROL, "max-age=60"),
        ],
        Bytes::from_static(b"hello volume"),
    )
}

async fn stub_delete(State(state): State<Arc<StubState>>) -> StatusCode {
    state.delete_count.fetch_add(1, Ordering::SeqCst);
    StatusCode::ACCEPTED
}

/// Gateway under test plus the stub cluster behind it.
pub struct TestApp {
    pub server: TestServer,
    pub cluster: StubCluster,
}

pub async fn setup_test_app() -> TestApp {
    let cluster = StubCluster::start().await;

    let signer = Signer::new(TEST_SECRET).expect("test signer");
    let seaweed = SeaweedClient::with_resolver(cluster.addr.clone(), SrvResolver::disabled());
    let state = Arc::new(AppState::new(signer, seaweed));

    let server = TestServer::new(build_router(state)).expect("test server");
    TestApp { server, cluster }
}

pub mod fixtures {
    /// Minimal valid 1x1 GIF bytes.
    pub fn minimal_gif() -> Vec<u8> {
        vec![
            0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x21, 0xF9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2C,
            0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00,
            0x3B,
        ]
    }

    /// Minimal valid 1x1 PNG bytes.
    pub fn minimal_png() -> Vec<u8> {
        vec![
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
            0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00,
            0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x08,
            0xD7, 0x63, 0xF8, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x18, 0xDD, 0x8D,
            0x89, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
        ]
    }
}
