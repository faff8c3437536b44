use super::anonymous_client;
use crate::{notify, ui};
use anyhow::{Context, Result};
use botdash_core::config;

pub async fn run(url: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => ui::prompt_password()?,
    };

    let client = anonymous_client(url)?;
    let session = client
        .login(&password)
        .await
        .context("Login failed")?;

    let path = config::save_session(&session)?;
    notify::success(&format!("Logged in to {url}"));
    tracing::debug!(path = %path.display(), "session stored");
    Ok(())
}
