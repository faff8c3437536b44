use botdash_core::console::render_entry;
use botdash_core::{BotStatus, BotSummary, ConnectionStatus, LogEntry, LogLevel, Stats};
use console::style;
use dialoguer::{Confirm, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner with a message.
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .expect("valid template"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Prompt for the dashboard password without echoing it.
pub fn prompt_password() -> Result<String, anyhow::Error> {
    let password = Password::new().with_prompt("Dashboard password").interact()?;
    Ok(password)
}

pub fn confirm(prompt: &str) -> Result<bool, anyhow::Error> {
    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;
    Ok(confirmed)
}

pub fn status_icon(status: &BotStatus) -> &'static str {
    match status {
        BotStatus::Running => "🟢",
        BotStatus::Stopped => "⚪",
        BotStatus::Error => "🔴",
        BotStatus::Initializing => "🟡",
        BotStatus::Crashed => "💀",
        BotStatus::Other(_) => "⚪",
    }
}

fn styled_status(status: &BotStatus, cell: String) -> String {
    match status {
        BotStatus::Running => style(cell).green().to_string(),
        BotStatus::Initializing => style(cell).yellow().to_string(),
        BotStatus::Stopped | BotStatus::Other(_) => style(cell).dim().to_string(),
        BotStatus::Error | BotStatus::Crashed => style(cell).red().to_string(),
    }
}

pub fn print_stats(stats: &Stats) {
    println!(
        "  Total: {}   Running: {}   Stopped: {}   Error: {}",
        style(stats.total).bold(),
        style(stats.running).green(),
        style(stats.stopped).dim(),
        style(stats.error).red()
    );
}

/// Status column, padded before any styling so escape codes do not skew alignment.
fn status_cell(status: &BotStatus) -> String {
    format!("{:<14}", format!("{} {}", status_icon(status), status.as_str().to_uppercase()))
}

fn format_row(bot: &BotSummary, status: &str) -> String {
    format!(
        "  {:<10}  {:<22}  {}  {:>8}  {:>8}  {:>6}  {:>8}",
        bot.bot_id,
        bot.name,
        status,
        bot.uptime(),
        bot.metrics.messages_total,
        bot.metrics.errors_total,
        bot.metrics.restarts_total
    )
}

fn styled_row(bot: &BotSummary) -> String {
    format_row(bot, &styled_status(&bot.status, status_cell(&bot.status)))
}

pub fn print_bots(bots: &[&BotSummary]) {
    if bots.is_empty() {
        println!("  No bots match this filter.");
        return;
    }

    println!(
        "  {:<10}  {:<22}  {:<14}  {:>8}  {:>8}  {:>6}  {:>8}",
        "ID", "Name", "Status", "Uptime", "Messages", "Errors", "Restarts"
    );
    println!("  {}", "-".repeat(90));
    for bot in bots {
        println!("{}", styled_row(bot));
    }
    println!("\n  Showing {} bot(s)", bots.len());
}

pub fn print_log_entry(entry: &LogEntry) {
    let line = render_entry(entry);
    let styled = match entry.level {
        LogLevel::Error => style(line).red(),
        LogLevel::Warning => style(line).yellow(),
        LogLevel::System => style(line).cyan(),
        LogLevel::Debug => style(line).dim(),
        LogLevel::Info | LogLevel::Output | LogLevel::Other(_) => style(line),
    };
    println!("{styled}");
}

pub fn print_connection_status(status: ConnectionStatus) {
    let dot = match status {
        ConnectionStatus::Connected => style("●").green(),
        ConnectionStatus::Errored => style("●").red(),
        ConnectionStatus::Connecting => style("●").yellow(),
        ConnectionStatus::Idle | ConnectionStatus::Closed => style("●").dim(),
    };
    eprintln!("{dot} {}", style(status.label()).dim());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named_bot(name: &str, status: &str, uptime: Option<&str>) -> BotSummary {
        serde_json::from_value(serde_json::json!({
            "bot_id": "a1b2c3d4",
            "name": name,
            "status": status,
            "uptime": uptime,
            "metrics": {"messages_total": 42, "errors_total": 3, "restarts_total": 1}
        }))
        .unwrap()
    }

    fn bot(status: &str, uptime: Option<&str>) -> BotSummary {
        named_bot("weather", status, uptime)
    }

    fn bot_row(bot: &BotSummary) -> String {
        format_row(bot, &status_cell(&bot.status))
    }

    #[test]
    fn status_styling_only_touches_status_column() {
        console::set_colors_enabled(true);
        let bot = named_bot("RUNNING-echo", "running", None);
        let row = styled_row(&bot);
        let name_at = row.find("RUNNING-echo").unwrap();
        let escape_at = row.find('\u{1b}').unwrap();
        assert!(name_at < escape_at);
        assert!(row.contains("🟢 RUNNING"));
    }

    #[test]
    fn row_shows_status_uptime_and_metrics() {
        let row = bot_row(&bot("running", Some("01:00:05")));
        assert!(row.contains("a1b2c3d4"));
        assert!(row.contains("🟢 RUNNING"));
        assert!(row.contains("01:00:05"));
        assert!(row.contains("42"));
    }

    #[test]
    fn missing_uptime_renders_zero() {
        let row = bot_row(&bot("stopped", None));
        assert!(row.contains("⚪ STOPPED"));
        assert!(row.contains("00:00:00"));
    }

    #[test]
    fn unknown_status_gets_neutral_icon() {
        assert_eq!(status_icon(&BotStatus::Other("paused".into())), "⚪");
        assert_eq!(status_icon(&BotStatus::Crashed), "💀");
    }
}
