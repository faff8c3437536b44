use super::{client, explain};
use crate::{notify, ui};
use anyhow::{Context, Result};
use botdash_core::console::ConsoleNotice;
use botdash_core::{config, LogConsole, LogSessionManager, SessionUpdate};
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct LogsParams {
    pub bot_id: String,
    pub limit: usize,
    /// File (or directory) to write the console to when the view closes.
    pub export: Option<PathBuf>,
}

/// Live console for one bot: backlog first, then streamed entries, until Ctrl+C.
pub async fn run(url: &str, params: LogsParams) -> Result<()> {
    let client = client(url)?;

    let bots = client.list_bots().await.map_err(explain)?;
    let bot = bots
        .iter()
        .find(|b| b.bot_id == params.bot_id)
        .ok_or_else(|| anyhow::anyhow!("No bot found with id '{}'", params.bot_id))?;

    println!("{} {}", style(format!("🤖 {}", bot.name)).bold(), style(format!("#{}", bot.bot_id)).dim());
    println!("{}\n", style("Press Ctrl+C to close the console.").dim());

    let mut manager = LogSessionManager::new(Arc::new(client), params.limit);
    manager.open(params.bot_id.clone());
    if let Some(console) = manager.console() {
        print_console(console);
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            update = manager.next_update() => render(&update, manager.console()),
        }
    }

    let export = manager.export();
    manager.close();
    println!();

    if let (Some(target), Some(text)) = (params.export, export) {
        let path = write_export(&target, &params.bot_id, &text)?;
        notify::success(&format!("Logs saved to {}", path.display()));
    }
    Ok(())
}

fn render(update: &SessionUpdate, console: Option<&LogConsole>) {
    match update {
        SessionUpdate::Replaced => {
            if let Some(console) = console {
                println!("{}", style(format!("── snapshot: {} entries ──", console.len())).dim());
                print_console(console);
            }
        }
        SessionUpdate::Appended(entry) => ui::print_log_entry(entry),
        SessionUpdate::BacklogFailed(reason) => {
            println!("{}", style(ConsoleNotice::LoadFailed(reason.clone()).text()).red());
            tracing::debug!("backlog failure: {reason}");
        }
        SessionUpdate::Status(status) => ui::print_connection_status(*status),
    }
}

fn print_console(console: &LogConsole) {
    if let Some(notice) = console.notice() {
        let text = style(notice.text());
        match notice {
            ConsoleNotice::LoadFailed(_) => println!("{}", text.red()),
            ConsoleNotice::Loading | ConsoleNotice::NoLogsYet => println!("{}", text.dim()),
        }
    }
    for entry in console.entries() {
        ui::print_log_entry(entry);
    }
}

/// Write `text` to `target`; a directory target gets the default export file name.
fn write_export(target: &Path, bot_id: &str, text: &str) -> Result<PathBuf> {
    let path = if target.is_dir() {
        target.join(config::export_file_name(bot_id))
    } else {
        target.to_path_buf()
    };
    std::fs::write(&path, text)
        .with_context(|| format!("Failed to write logs to {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_into_directory_uses_default_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_export(dir.path(), "a1b2", "[10:00:00] started").unwrap();
        assert_eq!(path, dir.path().join("bot-a1b2-logs.txt"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "[10:00:00] started");
    }

    #[test]
    fn export_to_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.txt");
        let path = write_export(&target, "a1b2", "No logs yet...").unwrap();
        assert_eq!(path, target);
        assert_eq!(std::fs::read_to_string(target).unwrap(), "No logs yet...");
    }

    #[test]
    fn export_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("out.txt");
        assert!(write_export(&target, "a1b2", "x").is_err());
    }
}
