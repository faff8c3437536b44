//! Core of botdash: the control-plane REST client, wire models, and the live log
//! session that merges a bounded backlog with a WebSocket stream.

pub mod api;
pub mod config;
pub mod console;
pub mod error;
pub mod models;
pub mod session;
pub mod stream;

pub use api::ControlPlaneClient;
pub use console::{ConsoleNotice, LogConsole};
pub use error::AppError;
pub use models::{BotStatus, BotSummary, LogEntry, LogLevel, Stats, StreamFrame};
pub use session::{ConnectionStatus, LogSessionManager, SessionUpdate};
