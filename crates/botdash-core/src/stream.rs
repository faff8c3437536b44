//! WebSocket transport for `/ws/{botId}`.

use crate::config::SESSION_COOKIE;
use crate::models::StreamFrame;
use crate::session::{EventSender, SessionEvent, SessionTicket, StreamEvent, StreamHandle};
use futures_util::StreamExt;
use tokio::sync::oneshot;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, COOKIE};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};
use url::Url;

/// Closing the handle (or dropping it) stops the connection task.
pub struct WsStreamHandle {
    shutdown: Option<oneshot::Sender<()>>,
}

impl WsStreamHandle {
    /// A handle with no connection behind it.
    pub fn detached() -> Self {
        Self { shutdown: None }
    }
}

impl StreamHandle for WsStreamHandle {
    fn close(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for WsStreamHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Connect to `url` in the background and report everything through `events`.
pub fn spawn_log_stream(
    url: Url,
    session: Option<String>,
    ticket: SessionTicket,
    events: EventSender,
) -> WsStreamHandle {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(run_stream(url, session, ticket, events, shutdown_rx));
    WsStreamHandle {
        shutdown: Some(shutdown_tx),
    }
}

fn build_request(url: &Url, session: Option<&str>) -> Result<Request, String> {
    let mut request = url
        .as_str()
        .into_client_request()
        .map_err(|e| e.to_string())?;
    if let Some(session) = session {
        let cookie = HeaderValue::from_str(&format!("{SESSION_COOKIE}={session}"))
            .map_err(|e| format!("invalid session cookie: {e}"))?;
        request.headers_mut().insert(COOKIE, cookie);
    }
    Ok(request)
}

async fn run_stream(
    url: Url,
    session: Option<String>,
    ticket: SessionTicket,
    events: EventSender,
    mut shutdown: oneshot::Receiver<()>,
) {
    let emit = |event: StreamEvent| {
        let _ = events.send(SessionEvent::stream(ticket.clone(), event));
    };

    let request = match build_request(&url, session.as_deref()) {
        Ok(r) => r,
        Err(e) => {
            emit(StreamEvent::Errored(e));
            emit(StreamEvent::Closed);
            return;
        }
    };

    let connected = tokio::select! {
        res = connect_async(request) => res,
        _ = &mut shutdown => return,
    };
    let mut ws = match connected {
        Ok((ws, _)) => ws,
        Err(e) => {
            warn!(%url, "log stream connect failed: {e}");
            emit(StreamEvent::Errored(e.to_string()));
            emit(StreamEvent::Closed);
            return;
        }
    };
    debug!(%url, "log stream connected");
    emit(StreamEvent::Opened);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                let _ = ws.close(None).await;
                return;
            }
            msg = ws.next() => match msg {
                Some(Ok(Message::Text(text))) => match StreamFrame::parse(text.as_str()) {
                    Ok(frame) => emit(StreamEvent::Frame(frame)),
                    Err(e) => warn!("skipping malformed log frame: {e}"),
                },
                Some(Ok(Message::Close(_))) | None => {
                    emit(StreamEvent::Closed);
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    emit(StreamEvent::Errored(e.to_string()));
                    emit(StreamEvent::Closed);
                    return;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_session_cookie() {
        let url = Url::parse("ws://127.0.0.1:8000/ws/abc").unwrap();
        let request = build_request(&url, Some("s3cr3t")).unwrap();
        assert_eq!(request.headers().get(COOKIE).unwrap(), "session_id=s3cr3t");

        let anonymous = build_request(&url, None).unwrap();
        assert!(anonymous.headers().get(COOKIE).is_none());
    }

    #[tokio::test]
    async fn unreachable_server_reports_error_then_close() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let ticket = SessionTicket {
            subject: "bot-1".into(),
            epoch: 1,
        };
        // Port 9 (discard) is not listening on loopback in test environments.
        let url = Url::parse("ws://127.0.0.1:9/ws/bot-1").unwrap();
        let _handle = spawn_log_stream(url, None, ticket.clone(), tx);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.ticket, ticket);
        assert!(matches!(
            first.kind,
            crate::session::SessionEventKind::Stream(StreamEvent::Errored(_))
        ));
        let second = rx.recv().await.unwrap();
        assert!(matches!(
            second.kind,
            crate::session::SessionEventKind::Stream(StreamEvent::Closed)
        ));
    }
}
