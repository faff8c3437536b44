use super::{client, explain, list};
use crate::notify;
use anyhow::Result;
use botdash_core::config::{RESTART_REFRESH_DELAY, STOP_REFRESH_DELAY};

pub async fn restart(url: &str, bot_id: &str) -> Result<()> {
    let client = client(url)?;
    if let Err(e) = client.restart_bot(bot_id).await {
        notify::error("Failed to restart bot");
        return Err(explain(e));
    }
    notify::success("Bot restarting...");

    tokio::time::sleep(RESTART_REFRESH_DELAY).await;
    list::run(url, None).await
}

pub async fn stop(url: &str, bot_id: &str) -> Result<()> {
    let client = client(url)?;
    if let Err(e) = client.stop_bot(bot_id).await {
        notify::error("Failed to stop bot");
        return Err(explain(e));
    }
    notify::success("Bot stopped");

    tokio::time::sleep(STOP_REFRESH_DELAY).await;
    list::run(url, None).await
}
