use crate::config::{DEFAULT_REQUIREMENTS_NAME, SESSION_COOKIE};
use crate::error::AppError;
use crate::models::{
    BotSummary, DeployRequest, DeployedBot, Health, LogEntry, LogsResponse, Stats,
};
use crate::session::{EventSender, LogSource, SessionEvent, SessionTicket, StreamEvent, StreamHandle};
use crate::stream::{self, WsStreamHandle};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, SET_COOKIE};
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde::de::DeserializeOwned;
use std::path::Path;
use url::Url;

/// REST client for the bot-hosting control plane.
#[derive(Clone)]
pub struct ControlPlaneClient {
    client: reqwest::Client,
    base: Url,
    session: Option<String>,
}

impl ControlPlaneClient {
    pub fn new(base_url: &str, session: Option<String>) -> Result<Self, AppError> {
        let base = Url::parse(base_url).map_err(|e| AppError::InvalidUrl(format!("{base_url}: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(AppError::InvalidUrl(format!(
                "{base_url}: expected an http(s) URL"
            )));
        }

        let mut headers = HeaderMap::new();
        if let Some(session) = &session {
            headers.insert(
                COOKIE,
                HeaderValue::from_str(&format!("{SESSION_COOKIE}={session}"))
                    .map_err(|e| AppError::Other(format!("Invalid session id: {e}")))?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `ws(s)://host/ws/{bot_id}`, scheme following the base URL's.
    pub fn stream_url(&self, bot_id: &str) -> Result<Url, AppError> {
        let mut url = self.endpoint(&["ws", bot_id])?;
        let scheme = if self.base.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| AppError::InvalidUrl(url.to_string()))?;
        Ok(url)
    }

    /// `GET /api/stats`
    pub async fn stats(&self) -> Result<Stats, AppError> {
        let resp = self.client.get(self.endpoint(&["api", "stats"])?).send().await?;
        decode(check(resp, "Load stats failed").await?).await
    }

    /// `GET /api/bots`
    pub async fn list_bots(&self) -> Result<Vec<BotSummary>, AppError> {
        let resp = self.client.get(self.endpoint(&["api", "bots"])?).send().await?;
        decode(check(resp, "Load bots failed").await?).await
    }

    /// Upload a bot and its requirements as a multipart form (`POST /api/bots`).
    pub async fn deploy_bot(&self, req: &DeployRequest) -> Result<DeployedBot, AppError> {
        let bot_part = file_part(&req.bot_file).await?;
        let req_part = match &req.requirements {
            Some(path) => file_part(path).await?,
            None => Part::bytes(Vec::new()).file_name(DEFAULT_REQUIREMENTS_NAME),
        };
        let form = Form::new()
            .text("name", req.name.clone())
            .part("bot_file", bot_part)
            .part("req_file", req_part);

        let resp = self
            .client
            .post(self.endpoint(&["api", "bots"])?)
            .multipart(form)
            .send()
            .await?;
        decode(check(resp, "Deployment failed").await?).await
    }

    /// `POST /api/bots/{id}/restart`
    pub async fn restart_bot(&self, bot_id: &str) -> Result<(), AppError> {
        let resp = self
            .client
            .post(self.endpoint(&["api", "bots", bot_id, "restart"])?)
            .send()
            .await?;
        check(resp, "Restart failed").await?;
        Ok(())
    }

    /// `POST /api/bots/{id}/stop`
    pub async fn stop_bot(&self, bot_id: &str) -> Result<(), AppError> {
        let resp = self
            .client
            .post(self.endpoint(&["api", "bots", bot_id, "stop"])?)
            .send()
            .await?;
        check(resp, "Stop failed").await?;
        Ok(())
    }

    /// `DELETE /api/bots/{id}`
    pub async fn delete_bot(&self, bot_id: &str) -> Result<(), AppError> {
        let resp = self
            .client
            .delete(self.endpoint(&["api", "bots", bot_id])?)
            .send()
            .await?;
        check(resp, "Delete failed").await?;
        Ok(())
    }

    /// `GET /api/bots/{id}/logs?limit=N`
    pub async fn bot_logs(&self, bot_id: &str, limit: usize) -> Result<Vec<LogEntry>, AppError> {
        let mut url = self.endpoint(&["api", "bots", bot_id, "logs"])?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        let resp = self.client.get(url).send().await?;
        let parsed: LogsResponse = decode(check(resp, "Load logs failed").await?).await?;
        Ok(parsed.logs)
    }

    /// Exchange the dashboard password for a session id (`POST /api/auth/login`).
    pub async fn login(&self, password: &str) -> Result<String, AppError> {
        let resp = self
            .client
            .post(self.endpoint(&["api", "auth", "login"])?)
            .form(&[("password", password)])
            .send()
            .await?;
        let resp = check(resp, "Login failed").await?;
        session_from_cookies(resp.headers()).ok_or_else(|| {
            AppError::MalformedResponse("login succeeded without a session cookie".into())
        })
    }

    /// `POST /api/auth/logout`
    pub async fn logout(&self) -> Result<(), AppError> {
        let resp = self
            .client
            .post(self.endpoint(&["api", "auth", "logout"])?)
            .send()
            .await?;
        check(resp, "Logout failed").await?;
        Ok(())
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<Health, AppError> {
        let resp = self.client.get(self.endpoint(&["health"])?).send().await?;
        decode(check(resp, "Health check failed").await?).await
    }
}

#[async_trait]
impl LogSource for ControlPlaneClient {
    async fn fetch_backlog(&self, subject: &str, limit: usize) -> Result<Vec<LogEntry>, AppError> {
        self.bot_logs(subject, limit).await
    }

    fn connect(&self, ticket: SessionTicket, events: EventSender) -> Box<dyn StreamHandle> {
        match self.stream_url(&ticket.subject) {
            Ok(url) => Box::new(stream::spawn_log_stream(
                url,
                self.session.clone(),
                ticket,
                events,
            )),
            Err(e) => {
                let _ = events.send(SessionEvent::stream(
                    ticket.clone(),
                    StreamEvent::Errored(e.to_string()),
                ));
                let _ = events.send(SessionEvent::stream(ticket, StreamEvent::Closed));
                Box::new(WsStreamHandle::detached())
            }
        }
    }
}

// --- Helpers ---

async fn file_part(path: &Path) -> Result<Part, AppError> {
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    Ok(Part::bytes(bytes).file_name(name))
}

/// Turn a non-2xx response into a `ServerRejection`.
async fn check(resp: Response, action: &str) -> Result<Response, AppError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let text = resp.text().await.unwrap_or_default();
    Err(AppError::ServerRejection {
        status,
        message: rejection_message(&text, action),
    })
}

/// Prefer `{error}` (control plane) or `{detail}` (framework errors), then the raw body.
fn rejection_message(body: &str, fallback: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "detail"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, AppError> {
    let url = resp.url().path().to_string();
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| AppError::MalformedResponse(format!("{url}: {e}")))
}

fn session_from_cookies(headers: &HeaderMap) -> Option<String> {
    let prefix = format!("{SESSION_COOKIE}=");
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|cookie| {
            let value = cookie.strip_prefix(&prefix)?;
            let value = value.split(';').next().unwrap_or_default().trim();
            (!value.is_empty()).then(|| value.to_string())
        })
}
