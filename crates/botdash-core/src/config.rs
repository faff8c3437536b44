use crate::error::AppError;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const SESSION_COOKIE: &str = "session_id";
pub const LOG_BACKLOG_LIMIT: usize = 100;
pub const REFRESH_INTERVAL_SECS: u64 = 5;
pub const RESTART_REFRESH_DELAY: Duration = Duration::from_secs(2);
pub const STOP_REFRESH_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_REQUIREMENTS_NAME: &str = "requirements.txt";

/// Resolve the app data directory: ~/.botdash/
pub fn app_dir() -> Result<PathBuf, AppError> {
    let home = dirs::home_dir().ok_or(AppError::HomeDirNotFound)?;
    Ok(home.join(".botdash"))
}

/// ~/.botdash/session
pub fn session_file() -> Result<PathBuf, AppError> {
    Ok(app_dir()?.join("session"))
}

/// Default file name for a log export, as the dashboard's download uses.
pub fn export_file_name(bot_id: &str) -> String {
    format!("bot-{bot_id}-logs.txt")
}

/// Read a stored session id from `path`. Missing or blank files mean "not logged in".
pub fn load_session_from(path: &Path) -> Result<Option<String>, AppError> {
    match std::fs::read_to_string(path) {
        Ok(raw) => {
            let trimmed = raw.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_session_to(path: &Path, session_id: &str) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, session_id)?;
    Ok(())
}

/// Remove a stored session. Removing a session that does not exist is fine.
pub fn clear_session_at(path: &Path) -> Result<(), AppError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

pub fn load_session() -> Result<Option<String>, AppError> {
    load_session_from(&session_file()?)
}

pub fn save_session(session_id: &str) -> Result<PathBuf, AppError> {
    let path = session_file()?;
    save_session_to(&path, session_id)?;
    Ok(path)
}

pub fn clear_session() -> Result<(), AppError> {
    clear_session_at(&session_file()?)
}
