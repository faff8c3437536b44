//! Live log sessions.
//!
//! A [`LogSessionManager`] owns at most one active session. Opening a session starts a
//! bounded backlog fetch and a streaming connection; both report back through one
//! channel tagged with a [`SessionTicket`], and the manager applies whatever arrives for
//! the current ticket on the caller's task. Results for any other ticket are stale and
//! dropped.

use crate::console::LogConsole;
use crate::error::AppError;
use crate::models::{LogEntry, StreamFrame};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Identifies one `open` call. Epochs are never reused, so reopening the same bot
/// still invalidates results issued for the earlier session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionTicket {
    pub subject: String,
    pub epoch: u64,
}

/// What the streaming transport reports.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Opened,
    Frame(StreamFrame),
    Errored(String),
    Closed,
}

#[derive(Debug)]
pub enum SessionEventKind {
    Backlog(Result<Vec<LogEntry>, AppError>),
    Stream(StreamEvent),
}

#[derive(Debug)]
pub struct SessionEvent {
    pub ticket: SessionTicket,
    pub kind: SessionEventKind,
}

impl SessionEvent {
    pub fn backlog(ticket: SessionTicket, result: Result<Vec<LogEntry>, AppError>) -> Self {
        Self {
            ticket,
            kind: SessionEventKind::Backlog(result),
        }
    }

    pub fn stream(ticket: SessionTicket, event: StreamEvent) -> Self {
        Self {
            ticket,
            kind: SessionEventKind::Stream(event),
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<SessionEvent>;

/// Status indicator for the streaming connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Idle,
    Connecting,
    Connected,
    Closed,
    Errored,
}

impl ConnectionStatus {
    /// Transition on a transport event. Frames leave the status alone.
    pub fn on_stream_event(self, event: &StreamEvent) -> Self {
        match event {
            StreamEvent::Opened => ConnectionStatus::Connected,
            StreamEvent::Errored(_) => ConnectionStatus::Errored,
            StreamEvent::Closed => ConnectionStatus::Closed,
            StreamEvent::Frame(_) => self,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Idle => "Idle",
            ConnectionStatus::Connecting => "Connecting",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Closed => "Disconnected",
            ConnectionStatus::Errored => "Connection Error",
        }
    }
}

/// Handle to a live streaming connection.
pub trait StreamHandle: Send {
    /// Terminate the connection. Must be safe to call more than once.
    fn close(&mut self);
}

/// Where a session gets its backlog and live entries from.
#[async_trait]
pub trait LogSource: Send + Sync + 'static {
    async fn fetch_backlog(&self, subject: &str, limit: usize) -> Result<Vec<LogEntry>, AppError>;

    /// Start streaming for `ticket.subject`, reporting through `events`. Must not block;
    /// connection failures are reported as events, not returned.
    fn connect(&self, ticket: SessionTicket, events: EventSender) -> Box<dyn StreamHandle>;
}

/// Visible change produced by applying one event.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// The buffer was replaced by a snapshot.
    Replaced,
    /// One live entry was appended.
    Appended(LogEntry),
    /// The backlog fetch failed; the buffer now shows the error notice.
    BacklogFailed(String),
    Status(ConnectionStatus),
}

struct ActiveSession {
    ticket: SessionTicket,
    handle: Box<dyn StreamHandle>,
    console: LogConsole,
}

pub struct LogSessionManager<S: LogSource> {
    source: Arc<S>,
    backlog_limit: usize,
    events_tx: EventSender,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    active: Option<ActiveSession>,
    status: ConnectionStatus,
    epoch: u64,
}

impl<S: LogSource> LogSessionManager<S> {
    pub fn new(source: Arc<S>, backlog_limit: usize) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            source,
            backlog_limit,
            events_tx,
            events_rx,
            active: None,
            status: ConnectionStatus::Idle,
            epoch: 0,
        }
    }

    /// Open a session for `subject`, closing any session that is already open.
    pub fn open(&mut self, subject: impl Into<String>) -> SessionTicket {
        self.replace(subject.into())
    }

    /// Close the current session (if any) and start a new one for `subject`.
    ///
    /// Must be called from within a Tokio runtime: the backlog fetch runs as a task.
    pub fn replace(&mut self, subject: String) -> SessionTicket {
        self.close();

        self.epoch += 1;
        let ticket = SessionTicket {
            subject,
            epoch: self.epoch,
        };
        info!(subject = %ticket.subject, epoch = ticket.epoch, "opening log session");

        let source = Arc::clone(&self.source);
        let tx = self.events_tx.clone();
        let fetch_ticket = ticket.clone();
        let limit = self.backlog_limit;
        tokio::spawn(async move {
            let result = source.fetch_backlog(&fetch_ticket.subject, limit).await;
            let _ = tx.send(SessionEvent::backlog(fetch_ticket, result));
        });

        let handle = self.source.connect(ticket.clone(), self.events_tx.clone());
        self.active = Some(ActiveSession {
            ticket: ticket.clone(),
            handle,
            console: LogConsole::loading(),
        });
        self.status = ConnectionStatus::Connecting;
        ticket
    }

    /// Close the streaming connection and forget the session. Returns whether a session
    /// was open. Calling it again is a no-op.
    pub fn close(&mut self) -> bool {
        let Some(mut session) = self.active.take() else {
            return false;
        };
        session.handle.close();
        self.status = ConnectionStatus::Closed;
        info!(subject = %session.ticket.subject, epoch = session.ticket.epoch, "closed log session");
        true
    }

    pub fn ticket(&self) -> Option<&SessionTicket> {
        self.active.as_ref().map(|s| &s.ticket)
    }

    pub fn subject(&self) -> Option<&str> {
        self.ticket().map(|t| t.subject.as_str())
    }

    pub fn console(&self) -> Option<&LogConsole> {
        self.active.as_ref().map(|s| &s.console)
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Text of the current buffer; `None` when no session is open.
    pub fn export(&self) -> Option<String> {
        self.console().map(LogConsole::export)
    }

    /// Wait for the next event that changes the view and apply it.
    ///
    /// Stale events are consumed silently. With no session open this stays pending.
    pub async fn next_update(&mut self) -> SessionUpdate {
        loop {
            // The manager holds a sender, so the channel never closes.
            let Some(event) = self.events_rx.recv().await else {
                return std::future::pending().await;
            };
            if let Some(update) = self.apply(event) {
                return update;
            }
        }
    }

    /// Apply one event to the active session. Returns `None` when the event is stale.
    pub fn apply(&mut self, event: SessionEvent) -> Option<SessionUpdate> {
        let Some(session) = self
            .active
            .as_mut()
            .filter(|s| s.ticket == event.ticket)
        else {
            debug!(
                subject = %event.ticket.subject,
                epoch = event.ticket.epoch,
                "discarding stale session result"
            );
            return None;
        };

        let update = match event.kind {
            SessionEventKind::Backlog(Ok(entries)) => {
                debug!(count = entries.len(), "backlog loaded");
                session.console.replace(entries);
                SessionUpdate::Replaced
            }
            SessionEventKind::Backlog(Err(e)) => {
                warn!(subject = %session.ticket.subject, "failed to load backlog: {e}");
                let reason = e.to_string();
                if !session.console.fail(reason.clone()) {
                    debug!("keeping streamed entries despite backlog failure");
                }
                SessionUpdate::BacklogFailed(reason)
            }
            SessionEventKind::Stream(StreamEvent::Frame(StreamFrame::Init { logs })) => {
                debug!(count = logs.len(), "stream snapshot received");
                session.console.replace(logs);
                SessionUpdate::Replaced
            }
            SessionEventKind::Stream(StreamEvent::Frame(StreamFrame::Log { data })) => {
                session.console.append(data.clone());
                SessionUpdate::Appended(data)
            }
            SessionEventKind::Stream(event) => {
                if let StreamEvent::Errored(reason) = &event {
                    warn!(subject = %session.ticket.subject, "log stream error: {reason}");
                }
                self.status = self.status.on_stream_event(&event);
                SessionUpdate::Status(self.status)
            }
        };
        Some(update)
    }
}

impl<S: LogSource> Drop for LogSessionManager<S> {
    fn drop(&mut self) {
        self.close();
    }
}
