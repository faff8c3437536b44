//! Display buffer for one bot's log view.
//!
//! The buffer always reads as "latest snapshot, in order, followed by live entries in
//! arrival order". A snapshot (historical fetch or the stream's `init` frame) clears and
//! replaces; live entries only ever append. Nothing is reordered or deduplicated.

use crate::models::LogEntry;

/// Placeholder shown in place of (or above) the entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleNotice {
    Loading,
    NoLogsYet,
    LoadFailed(String),
}

impl ConsoleNotice {
    pub fn text(&self) -> &'static str {
        match self {
            ConsoleNotice::Loading => "Loading logs...",
            ConsoleNotice::NoLogsYet => "No logs yet...",
            ConsoleNotice::LoadFailed(_) => "Failed to load logs",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogConsole {
    entries: Vec<LogEntry>,
    notice: Option<ConsoleNotice>,
}

impl LogConsole {
    /// A fresh console waiting for its first snapshot.
    pub fn loading() -> Self {
        Self {
            entries: Vec::new(),
            notice: Some(ConsoleNotice::Loading),
        }
    }

    /// Replace everything with `snapshot`. An empty snapshot shows the "no logs" notice.
    pub fn replace(&mut self, snapshot: Vec<LogEntry>) {
        self.notice = snapshot.is_empty().then_some(ConsoleNotice::NoLogsYet);
        self.entries = snapshot;
    }

    pub fn append(&mut self, entry: LogEntry) {
        self.notice = None;
        self.entries.push(entry);
    }

    /// The backlog could not be loaded. Only shown while nothing has been rendered;
    /// entries that already arrived from the stream are kept. Returns whether the error
    /// notice is now displayed.
    pub fn fail(&mut self, reason: impl Into<String>) -> bool {
        if !self.entries.is_empty() {
            return false;
        }
        self.notice = Some(ConsoleNotice::LoadFailed(reason.into()));
        true
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn notice(&self) -> Option<&ConsoleNotice> {
        self.notice.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rendered_lines(&self) -> Vec<String> {
        let notice = self.notice.iter().map(|n| n.text().to_string());
        let entries = self.entries.iter().map(render_entry);
        notice.chain(entries).collect()
    }

    /// Text blob of what is currently rendered, suitable for saving to a file.
    pub fn export(&self) -> String {
        self.rendered_lines().join("\n")
    }
}

pub fn render_entry(entry: &LogEntry) -> String {
    format!("[{}] {}", entry.local_time(), entry.message)
}
