use super::{client, explain};
use crate::{notify, ui};
use anyhow::Result;

pub async fn run(url: &str, bot_id: &str, yes: bool) -> Result<()> {
    let client = client(url)?;

    println!("Fetching bots...");
    let bots = client.list_bots().await.map_err(explain)?;
    let bot = bots
        .into_iter()
        .find(|b| b.bot_id == bot_id)
        .ok_or_else(|| anyhow::anyhow!("No bot found with id '{bot_id}'"))?;

    println!();
    println!("Bot to delete:");
    println!("  Name:     {}", bot.name);
    println!("  ID:       {}", bot.bot_id);
    println!("  Status:   {} {}", ui::status_icon(&bot.status), bot.status);
    println!("  Messages: {}", bot.metrics.messages_total);

    if !yes && !ui::confirm("Are you sure you want to delete this bot? This cannot be undone.")? {
        println!("Cancelled.");
        return Ok(());
    }

    if let Err(e) = client.delete_bot(&bot.bot_id).await {
        notify::error("Failed to delete bot");
        return Err(explain(e));
    }
    notify::success("Bot deleted");

    super::list::run(url, None).await
}
