use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use botdash_core::session::{SessionEvent, SessionEventKind, SessionTicket, StreamEvent};
use botdash_core::stream::spawn_log_stream;
use botdash_core::{
    ConnectionStatus, ControlPlaneClient, LogSessionManager, SessionUpdate, StreamFrame,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use url::Url;

const WAIT: Duration = Duration::from_secs(5);

#[derive(Clone, Default)]
struct Hub {
    backlog_served: Arc<Notify>,
    client_gone: Arc<Notify>,
}

async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("127.0.0.1:{}", addr.port())
}

async fn send_json(socket: &mut WebSocket, value: serde_json::Value) {
    socket
        .send(Message::Text(value.to_string().into()))
        .await
        .unwrap();
}

/// Snapshot of two entries, one live entry, then a clean close.
async fn scripted(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(|mut socket| async move {
        send_json(
            &mut socket,
            json!({"type": "init", "logs": [
                {"ts": 1700000000000i64, "level": "system", "msg": "booted"},
                {"ts": 1700000001000i64, "level": "output", "msg": "hello"}
            ]}),
        )
        .await;
        socket
            .send(Message::Text("{not json".into()))
            .await
            .unwrap();
        send_json(
            &mut socket,
            json!({"type": "log", "data": {"ts": 1700000002000i64, "level": "error", "msg": "boom"}}),
        )
        .await;
        let _ = socket.send(Message::Close(None)).await;
    })
}

async fn receive(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> StreamEvent {
    let event = tokio::time::timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    match event.kind {
        SessionEventKind::Stream(e) => e,
        SessionEventKind::Backlog(_) => panic!("connector never reports backlog"),
    }
}

#[tokio::test]
async fn connector_reports_open_frames_and_close_in_order() {
    let addr = spawn_server(Router::new().route("/ws/{id}", get(scripted))).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let ticket = SessionTicket {
        subject: "bot-1".into(),
        epoch: 3,
    };
    let url = Url::parse(&format!("ws://{addr}/ws/bot-1")).unwrap();
    let _handle = spawn_log_stream(url, None, ticket, tx);

    assert_eq!(receive(&mut rx).await, StreamEvent::Opened);

    let StreamEvent::Frame(StreamFrame::Init { logs }) = receive(&mut rx).await else {
        panic!("expected init snapshot");
    };
    let messages: Vec<_> = logs.iter().map(|l| l.message.as_str()).collect();
    assert_eq!(messages, ["booted", "hello"]);

    // The malformed frame in between is skipped.
    let StreamEvent::Frame(StreamFrame::Log { data }) = receive(&mut rx).await else {
        panic!("expected live entry");
    };
    assert_eq!(data.message, "boom");

    assert_eq!(receive(&mut rx).await, StreamEvent::Closed);
}

async fn backlog(State(hub): State<Hub>, Path(_id): Path<String>) -> impl IntoResponse {
    hub.backlog_served.notify_one();
    Json(json!({"logs": []}))
}

/// Waits for the backlog to be served, sends one live entry, then holds the socket
/// open until the client goes away.
async fn live(State(hub): State<Hub>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |mut socket| async move {
        hub.backlog_served.notified().await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        send_json(
            &mut socket,
            json!({"type": "log", "data": {"ts": 1700000000000i64, "level": "info", "msg": "started"}}),
        )
        .await;
        while let Some(Ok(msg)) = socket.recv().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
        hub.client_gone.notify_one();
    })
}

#[tokio::test]
async fn session_merges_backlog_and_stream_then_closes_connection() {
    let hub = Hub::default();
    let app = Router::new()
        .route("/api/bots/{id}/logs", get(backlog))
        .route("/ws/{id}", get(live))
        .with_state(hub.clone());
    let addr = spawn_server(app).await;

    let client = ControlPlaneClient::new(&format!("http://{addr}"), None).unwrap();
    let mut manager = LogSessionManager::new(Arc::new(client), 100);
    manager.open("bot-7");

    let mut seen = Vec::new();
    loop {
        let update = tokio::time::timeout(WAIT, manager.next_update())
            .await
            .unwrap();
        let done = matches!(update, SessionUpdate::Appended(_));
        seen.push(update);
        if done {
            break;
        }
    }

    assert!(seen.contains(&SessionUpdate::Replaced));
    assert!(seen.contains(&SessionUpdate::Status(ConnectionStatus::Connected)));
    let console = manager.console().unwrap();
    assert_eq!(console.len(), 1);
    assert_eq!(console.entries()[0].message, "started");
    assert_eq!(console.notice(), None);

    assert!(manager.close());
    tokio::time::timeout(WAIT, hub.client_gone.notified())
        .await
        .expect("server should observe the client closing");
}
