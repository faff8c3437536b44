use super::{client, explain};
use crate::ui;
use anyhow::Result;

pub async fn run(url: &str) -> Result<()> {
    let client = client(url)?;
    let stats = client.stats().await.map_err(explain)?;

    println!("Bots on {}:\n", client.base_url());
    ui::print_stats(&stats);
    if let Some(version) = &stats.version {
        println!("\n  Server version: {version}");
    }
    Ok(())
}
