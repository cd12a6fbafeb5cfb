//! Drives the real HTTP client against an in-process axum backend that
//! answers the way the production conversation API does.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chat_history_core::api::{ApiError, ConversationApi, HttpApi};
use chat_history_core::dialogs::FixedDialogs;
use chat_history_core::{generate_title, HistoryConfig, HistoryEvent, HistoryItem, HistoryManager};
use serde_json::{json, Value};
use tokio::sync::oneshot;

// ============================================================================
// Mock backend
// ============================================================================

#[derive(Default)]
struct Backend {
    conversations: Mutex<Vec<Value>>,
    history: Mutex<Vec<(String, Value)>>,
    fail_list: AtomicBool,
    garbage_list: AtomicBool,
}

type Shared = Arc<Backend>;

fn sqlite_now() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

async fn list(State(b): State<Shared>) -> Result<Json<Value>, (StatusCode, String)> {
    if b.fail_list.load(Ordering::SeqCst) {
        return Err((StatusCode::INTERNAL_SERVER_ERROR, "boom".into()));
    }
    if b.garbage_list.load(Ordering::SeqCst) {
        return Ok(Json(json!({"unexpected": true})));
    }
    Ok(Json(Value::Array(b.conversations.lock().unwrap().clone())))
}

async fn create(State(b): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let id = uuid::Uuid::new_v4().to_string();
    b.conversations.lock().unwrap().insert(
        0,
        json!({
            "id": id,
            "title": body["title"],
            "created_at": sqlite_now(),
            "updated_at": sqlite_now(),
            "message_count": 0,
            "messages": []
        }),
    );
    Json(json!({ "conversation_id": id }))
}

async fn rename(
    State(b): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    let mut convs = b.conversations.lock().unwrap();
    match convs.iter_mut().find(|c| c["id"] == id) {
        Some(conv) => {
            conv["title"] = body["title"].clone();
            StatusCode::OK
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn delete(State(b): State<Shared>, Path(id): Path<String>) -> StatusCode {
    b.conversations.lock().unwrap().retain(|c| c["id"] != id);
    b.history.lock().unwrap().retain(|(cid, _)| *cid != id);
    StatusCode::NO_CONTENT
}

async fn get_history(State(b): State<Shared>, Path(id): Path<String>) -> Json<Value> {
    let history: Vec<Value> = b
        .history
        .lock()
        .unwrap()
        .iter()
        .filter(|(cid, _)| *cid == id)
        .map(|(_, entry)| entry.clone())
        .collect();
    Json(json!({ "history": history }))
}

async fn append_history(
    State(b): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    let mut convs = b.conversations.lock().unwrap();
    let Some(conv) = convs.iter_mut().find(|c| c["id"] == id) else {
        return StatusCode::NOT_FOUND;
    };
    conv["updated_at"] = json!(sqlite_now());
    conv["messages"] = json!([
        {"content": body["message"], "sender": "user"},
        {"content": body["response"], "sender": "ai"}
    ]);

    let mut entry = body.clone();
    entry["created_at"] = json!(sqlite_now());
    b.history.lock().unwrap().push((id, entry));
    StatusCode::OK
}

/// Running mock backend; shuts down on drop.
struct MockServer {
    addr: SocketAddr,
    backend: Shared,
    shutdown_tx: Option<oneshot::Sender<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl MockServer {
    fn start() -> Self {
        let backend: Shared = Arc::new(Backend::default());
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (addr_tx, addr_rx) = std::sync::mpsc::channel();

        let state = Arc::clone(&backend);
        let thread = std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .expect("runtime");

            rt.block_on(async move {
                let app = Router::new()
                    .route("/api/conversations", get(list).post(create))
                    .route(
                        "/api/conversations/{id}",
                        axum::routing::patch(rename).delete(delete),
                    )
                    .route(
                        "/api/conversations/{id}/history",
                        get(get_history).post(append_history),
                    )
                    .with_state(state);

                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind");
                addr_tx.send(listener.local_addr().expect("addr")).expect("send addr");

                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        shutdown_rx.await.ok();
                    })
                    .await
                    .ok();
            });
        });

        let addr = addr_rx.recv().expect("server address");
        Self {
            addr,
            backend,
            shutdown_tx: Some(shutdown_tx),
            thread: Some(thread),
        }
    }

    fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn manager_for(server: &MockServer, dialogs: FixedDialogs) -> HistoryManager<HttpApi> {
    let config = HistoryConfig {
        base_url: server.base_url(),
        ..HistoryConfig::default()
    };
    HistoryManager::new(HttpApi::from_config(&config), dialogs, &config)
}

// ============================================================================
// TESTS
// ============================================================================

#[test]
fn full_conversation_lifecycle() {
    let server = MockServer::start();
    let manager = manager_for(&server, FixedDialogs::accepting(Some("Projet Rust".into())));
    let mut rx = manager.events().subscribe();

    // Saving without a current conversation creates one first.
    assert!(manager.save_message(
        "Comment fonctionne le borrow checker en pratique ?",
        "Il vérifie les emprunts.",
        vec!["rustbook.pdf".into()],
    ));
    let id = manager.current_conversation_id().expect("current id");

    let listed = manager.conversations();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].updated_at.is_some());

    let history = manager.load_conversation(&id).expect("history");
    match &history[0] {
        HistoryItem::Exchange(ex) => {
            assert_eq!(ex.response, "Il vérifie les emprunts.");
            assert_eq!(ex.sources, vec!["rustbook.pdf".to_string()]);
        }
        other => panic!("unexpected history item {other:?}"),
    }

    assert!(manager.rename_conversation(&id));
    assert_eq!(generate_title(&manager.conversations()[0]), "Projet Rust");

    assert!(manager.delete_conversation(&id));
    assert!(manager.current_conversation_id().is_none());
    assert!(manager.conversations().is_empty());

    let events: Vec<HistoryEvent> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    assert!(events.contains(&HistoryEvent::NewConversation {
        conversation_id: id.clone()
    }));
    assert!(events.contains(&HistoryEvent::ConversationDeleted));
}

#[test]
fn server_error_keeps_cached_list() {
    let server = MockServer::start();
    let manager = manager_for(&server, FixedDialogs::accepting(None));
    manager.create_new_chat().expect("created");
    assert_eq!(manager.conversations().len(), 1);

    server.backend.fail_list.store(true, Ordering::SeqCst);
    assert!(!manager.load_conversations());

    assert_eq!(manager.conversations().len(), 1);
    assert!(manager.current_conversation_id().is_some());
    assert_eq!(
        manager.active_notifications()[0].message,
        "Impossible de charger l'historique"
    );
}

#[test]
fn status_error_carries_code() {
    let server = MockServer::start();
    let api = HttpApi::new(server.base_url());

    match api.rename_conversation("missing", "x") {
        Err(ApiError::Status { status, url }) => {
            assert_eq!(status, 404);
            assert!(url.ends_with("/api/conversations/missing"));
        }
        other => panic!("expected 404, got {other:?}"),
    }
}

#[test]
fn unexpected_body_is_decode_error() {
    let server = MockServer::start();
    server.backend.garbage_list.store(true, Ordering::SeqCst);
    let api = HttpApi::new(server.base_url());

    assert!(matches!(api.list_conversations(), Err(ApiError::Decode(_))));
}

#[test]
fn wire_log_records_requests() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    let config = HistoryConfig {
        base_url: server.base_url(),
        wire_log_dir: Some(dir.path().to_string_lossy().into_owned()),
        ..HistoryConfig::default()
    };
    let api = HttpApi::from_config(&config);

    api.list_conversations().unwrap();

    let log = std::fs::read_to_string(dir.path().join("http.log")).unwrap();
    assert!(log.contains("GET: /api/conversations -> 200"));
}
