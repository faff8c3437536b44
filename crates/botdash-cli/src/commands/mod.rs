pub mod actions;
pub mod delete;
pub mod deploy;
pub mod health;
pub mod list;
pub mod login;
pub mod logout;
pub mod logs;
pub mod stats;
pub mod watch;

use anyhow::Result;
use botdash_core::{config, AppError, ControlPlaneClient};

/// Client carrying the stored session. Fails when nobody is logged in.
pub fn client(url: &str) -> Result<ControlPlaneClient> {
    let session = config::load_session()?.ok_or(AppError::NotLoggedIn)?;
    Ok(ControlPlaneClient::new(url, Some(session))?)
}

/// Anonymous client, for endpoints that do not need a session.
pub fn anonymous_client(url: &str) -> Result<ControlPlaneClient> {
    Ok(ControlPlaneClient::new(url, None)?)
}

/// Point the user at `login` when the server rejects the session.
pub fn explain(err: AppError) -> anyhow::Error {
    if err.is_unauthorized() {
        anyhow::Error::new(err).context("Session missing or expired; run `botdash login`")
    } else {
        err.into()
    }
}
