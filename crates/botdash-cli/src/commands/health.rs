use super::anonymous_client;
use anyhow::{Context, Result};
use console::style;

pub async fn run(url: &str) -> Result<()> {
    let client = anonymous_client(url)?;
    let health = client
        .health()
        .await
        .with_context(|| format!("Control plane at {url} is unreachable"))?;

    let status = if health.status == "healthy" {
        style(&health.status).green()
    } else {
        style(&health.status).yellow()
    };
    println!(
        "{url}: {status} (version {})",
        health.version.as_deref().unwrap_or("unknown")
    );
    Ok(())
}
