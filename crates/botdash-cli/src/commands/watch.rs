use super::client;
use crate::{notify, ui};
use anyhow::Result;
use botdash_core::models::filter_bots;
use botdash_core::{BotStatus, ControlPlaneClient};
use chrono::Local;
use console::{style, Term};
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

/// Redraw stats and the bot list every `interval_secs` until Ctrl+C.
pub async fn run(url: &str, status: Option<BotStatus>, interval_secs: u64) -> Result<()> {
    let client = client(url)?;
    let term = Term::stdout();
    let period = Duration::from_secs(interval_secs.max(1));
    let mut ticks = IntervalStream::new(tokio::time::interval(period));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            tick = ticks.next() => {
                if tick.is_none() {
                    break;
                }
                refresh(&client, &term, status.as_ref(), period).await;
            }
        }
    }

    println!("\nStopped watching.");
    Ok(())
}

async fn refresh(
    client: &ControlPlaneClient,
    term: &Term,
    status: Option<&BotStatus>,
    period: Duration,
) {
    let stats = client.stats().await;
    let bots = client.list_bots().await;

    let _ = term.clear_screen();
    println!(
        "{} {}  {}\n",
        style("botdash").bold(),
        client.base_url(),
        style(format!(
            "refresh every {}s, Ctrl+C to quit",
            period.as_secs()
        ))
        .dim()
    );

    match stats {
        Ok(stats) => ui::print_stats(&stats),
        Err(e) => {
            tracing::warn!("failed to load stats: {e}");
            notify::error("Failed to load stats");
        }
    }
    println!();

    match bots {
        Ok(bots) => ui::print_bots(&filter_bots(&bots, status)),
        Err(e) => {
            tracing::warn!("failed to load bots: {e}");
            notify::error("Failed to load bots");
        }
    }

    println!(
        "\n  {}",
        style(format!("Last refresh: {}", Local::now().format("%H:%M:%S"))).dim()
    );
}
