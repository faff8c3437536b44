use super::{client, explain};
use crate::ui;
use anyhow::Result;
use botdash_core::models::filter_bots;
use botdash_core::BotStatus;

/// List bots as cards, optionally keeping only one status.
pub async fn run(url: &str, status: Option<BotStatus>) -> Result<()> {
    let client = client(url)?;

    println!("Fetching bots...\n");
    let bots = client.list_bots().await.map_err(explain)?;

    if bots.is_empty() {
        println!("No bots deployed yet. Deploy one with `botdash deploy`.");
        return Ok(());
    }

    let shown = filter_bots(&bots, status.as_ref());
    ui::print_bots(&shown);
    if shown.len() != bots.len() {
        println!("  ({} of {} total)", shown.len(), bots.len());
    }
    Ok(())
}
