use crate::notify;
use anyhow::Result;
use botdash_core::{config, ControlPlaneClient};
use std::path::Path;

pub async fn run(url: &str) -> Result<()> {
    if logout_at(url, &config::session_file()?).await? {
        notify::success("Logged out");
    } else {
        notify::info("Not logged in.");
    }
    Ok(())
}

/// Best-effort: the stored session is dropped whether or not the server can be told.
/// Returns false when there was no session to end.
async fn logout_at(url: &str, session_path: &Path) -> Result<bool> {
    let Some(session) = config::load_session_from(session_path)? else {
        return Ok(false);
    };

    match ControlPlaneClient::new(url, Some(session)) {
        Ok(client) => {
            if let Err(e) = client.logout().await {
                tracing::warn!("server logout failed: {e}");
            }
        }
        Err(e) => tracing::warn!("skipping server logout: {e}"),
    }
    config::clear_session_at(session_path)?;
    Ok(true)
}
