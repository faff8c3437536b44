use crate::error::AppError;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;

// --- Log entries ---

/// One line of bot output as the orchestrator reports it. Wire shape: `{ts, level, msg}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "ts", deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub level: LogLevel,
    #[serde(rename = "msg", default)]
    pub message: String,
}

impl LogEntry {
    pub fn new(timestamp: DateTime<Utc>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            level,
            message: message.into(),
        }
    }

    /// Wall-clock time in the client's zone, as the console shows it.
    pub fn local_time(&self) -> String {
        self.timestamp
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogLevel {
    #[default]
    Info,
    Warning,
    Error,
    Debug,
    /// Lifecycle messages emitted by the orchestrator itself.
    System,
    /// Raw stdout of the bot process.
    Output,
    Other(String),
}

impl LogLevel {
    pub fn as_str(&self) -> &str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Debug => "debug",
            LogLevel::System => "system",
            LogLevel::Output => "output",
            LogLevel::Other(s) => s,
        }
    }
}

impl From<String> for LogLevel {
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warning,
            "error" => LogLevel::Error,
            "debug" => LogLevel::Debug,
            "system" => LogLevel::System,
            "output" => LogLevel::Output,
            _ => LogLevel::Other(raw),
        }
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.as_str().to_string()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Fractional(f64),
    Text(String),
}

/// Accepts epoch milliseconds, RFC 3339, or a naive ISO-8601 string read in local time.
/// Anything else is stamped with the arrival time so the line is still shown.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = RawTimestamp::deserialize(deserializer)?;
    let parsed = match &raw {
        RawTimestamp::Millis(ms) => DateTime::from_timestamp_millis(*ms),
        RawTimestamp::Fractional(ms) => DateTime::from_timestamp_millis(*ms as i64),
        RawTimestamp::Text(s) => parse_timestamp(s),
    };
    Ok(parsed.unwrap_or_else(|| {
        tracing::debug!("unparseable log timestamp; using arrival time");
        Utc::now()
    }))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// A message on the `/ws/{botId}` channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamFrame {
    /// Full backlog sent once when the channel opens.
    Init {
        #[serde(default)]
        logs: Vec<LogEntry>,
    },
    /// A single new entry.
    Log { data: LogEntry },
}

impl StreamFrame {
    pub fn parse(text: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LogsResponse {
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

// --- Bots ---

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BotStatus {
    Running,
    Stopped,
    Error,
    #[default]
    Initializing,
    Crashed,
    Other(String),
}

impl BotStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BotStatus::Running => "running",
            BotStatus::Stopped => "stopped",
            BotStatus::Error => "error",
            BotStatus::Initializing => "initializing",
            BotStatus::Crashed => "crashed",
            BotStatus::Other(s) => s,
        }
    }
}

impl From<String> for BotStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "running" => BotStatus::Running,
            "stopped" => BotStatus::Stopped,
            "error" => BotStatus::Error,
            "initializing" => BotStatus::Initializing,
            "crashed" => BotStatus::Crashed,
            _ => BotStatus::Other(raw),
        }
    }
}

impl From<BotStatus> for String {
    fn from(status: BotStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for BotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotMetrics {
    #[serde(default, alias = "messages")]
    pub messages_total: u64,
    #[serde(default, alias = "errors")]
    pub errors_total: u64,
    #[serde(default, alias = "restarts")]
    pub restarts_total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotSummary {
    pub bot_id: String,
    pub name: String,
    #[serde(default)]
    pub status: BotStatus,
    #[serde(default)]
    pub uptime: Option<String>,
    #[serde(default)]
    pub metrics: BotMetrics,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub pid: Option<u32>,
    #[serde(default)]
    pub log_count: Option<u64>,
}

impl BotSummary {
    pub fn uptime(&self) -> &str {
        match self.uptime.as_deref() {
            Some(u) if !u.is_empty() => u,
            _ => "00:00:00",
        }
    }
}

/// Keep the bots whose status matches `status`; `None` keeps everything.
pub fn filter_bots<'a>(bots: &'a [BotSummary], status: Option<&BotStatus>) -> Vec<&'a BotSummary> {
    bots.iter()
        .filter(|b| status.map_or(true, |s| &b.status == s))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub running: u64,
    #[serde(default)]
    pub stopped: u64,
    #[serde(default)]
    pub error: u64,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
}

// --- Deploy ---

/// Inputs for `POST /api/bots`.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub name: String,
    pub bot_file: PathBuf,
    pub requirements: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeployedBot {
    pub bot_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_frame_with_millis_timestamp() {
        let frame = StreamFrame::parse(
            r#"{"type":"log","data":{"ts":1700000000000,"level":"info","msg":"started"}}"#,
        )
        .unwrap();
        let StreamFrame::Log { data } = frame else {
            panic!("expected a log frame");
        };
        assert_eq!(data.timestamp.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(data.level, LogLevel::Info);
        assert_eq!(data.message, "started");
    }

    #[test]
    fn init_frame_keeps_backlog_order() {
        let frame = StreamFrame::parse(
            r#"{"type":"init","logs":[
                {"ts":"2024-05-01T10:00:00+00:00","level":"system","msg":"one"},
                {"ts":"2024-05-01T09:00:00Z","level":"warning","msg":"two"},
                {"ts":"2024-05-01T11:00:00.250","level":"output","msg":"three"}
            ]}"#,
        )
        .unwrap();
        let StreamFrame::Init { logs } = frame else {
            panic!("expected an init frame");
        };
        let messages: Vec<_> = logs.iter().map(|l| l.message.as_str()).collect();
        assert_eq!(messages, ["one", "two", "three"]);
        assert_eq!(logs[0].level, LogLevel::System);
        assert_eq!(logs[1].level, LogLevel::Warning);
        assert_eq!(logs[2].level, LogLevel::Output);
    }

    #[test]
    fn unknown_frame_type_is_rejected() {
        assert!(matches!(
            StreamFrame::parse(r#"{"type":"ping"}"#),
            Err(AppError::Json(_))
        ));
        assert!(matches!(StreamFrame::parse("not json"), Err(AppError::Json(_))));
    }

    #[test]
    fn level_aliases_and_unknown_levels() {
        assert_eq!(LogLevel::from("warn".to_string()), LogLevel::Warning);
        assert_eq!(LogLevel::from("WARNING".to_string()), LogLevel::Warning);
        let custom = LogLevel::from("trace".to_string());
        assert_eq!(custom, LogLevel::Other("trace".into()));
        assert_eq!(custom.as_str(), "trace");
    }

    #[test]
    fn rfc3339_and_naive_timestamps() {
        let utc = parse_timestamp("2024-05-01T10:00:00Z").unwrap();
        assert_eq!(utc.to_rfc3339(), "2024-05-01T10:00:00+00:00");

        let naive = parse_timestamp("2024-05-01T10:00:00.123456").unwrap();
        let expected = Local
            .with_ymd_and_hms(2024, 5, 1, 10, 0, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(naive.timestamp(), expected.timestamp());

        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn bot_summary_accepts_orchestrator_shape() {
        let bot: BotSummary = serde_json::from_str(
            r#"{"bot_id":"a1b2c3d4","name":"echo","status":"crashed","uptime":null,
                "pid":null,"metrics":{"messages":4,"errors":1,"warnings":2,"restarts":3},
                "log_count":12,"ws_clients":0}"#,
        )
        .unwrap();
        assert_eq!(bot.status, BotStatus::Crashed);
        assert_eq!(bot.uptime(), "00:00:00");
        assert_eq!(bot.metrics.messages_total, 4);
        assert_eq!(bot.metrics.errors_total, 1);
        assert_eq!(bot.metrics.restarts_total, 3);
        assert_eq!(bot.log_count, Some(12));
    }

    #[test]
    fn filter_by_status() {
        let bots: Vec<BotSummary> = serde_json::from_str(
            r#"[{"bot_id":"1","name":"a","status":"running","uptime":"00:01:00","metrics":{}},
                {"bot_id":"2","name":"b","status":"stopped","metrics":{}},
                {"bot_id":"3","name":"c","status":"running","metrics":{}}]"#,
        )
        .unwrap();
        assert_eq!(filter_bots(&bots, None).len(), 3);
        let running: Vec<_> = filter_bots(&bots, Some(&BotStatus::Running))
            .into_iter()
            .map(|b| b.bot_id.as_str())
            .collect();
        assert_eq!(running, ["1", "3"]);
        assert!(filter_bots(&bots, Some(&BotStatus::Crashed)).is_empty());
    }

    #[test]
    fn stats_missing_counts_default_to_zero() {
        let stats: Stats = serde_json::from_str(r#"{"total":2,"running":1}"#).unwrap();
        assert_eq!(stats.stopped, 0);
        assert_eq!(stats.error, 0);
        assert_eq!(stats.version, None);
    }
}
