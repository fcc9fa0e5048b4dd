//! Redmine REST binding.
//!
//! `RemoteClient` is the seam the cache refresh, timesheet backfill and
//! action dispatcher talk to; `RedmineClient` is the HTTP implementation.

use crate::config::Config;
use crate::data::{Issue, IssueStatus, IssueUpdate, Project, TimeEntry, User};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Local};
use once_cell::sync::Lazy;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const PAGE_SIZE: usize = 100;

pub type Result<T> = std::result::Result<T, RedmineError>;

#[derive(Debug, Error)]
pub enum RedmineError {
    #[error("http {status}: {message}")]
    Http { status: StatusCode, message: String },
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for RedmineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RedmineError::Timeout(err.to_string())
        } else if err.is_connect() {
            RedmineError::Network(err.to_string())
        } else if err.is_decode() {
            RedmineError::Decode(err.to_string())
        } else {
            RedmineError::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RedmineError {
    fn from(err: serde_json::Error) -> Self {
        RedmineError::Decode(err.to_string())
    }
}

/// Operations the launcher needs from the tracker. List operations return
/// every page, in server order.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn get_user(&self) -> Result<User>;
    async fn get_issues(&self) -> Result<Vec<Issue>>;
    async fn get_issue_statuses(&self) -> Result<Vec<IssueStatus>>;
    async fn get_projects(&self) -> Result<Vec<Project>>;
    async fn get_time_entries(&self, days_back: i64) -> Result<Vec<TimeEntry>>;
    async fn get_issue(&self, id: u64) -> Result<Issue>;
    async fn update_issue(&self, id: u64, update: &IssueUpdate) -> Result<()>;
}

/// Shared HTTP client for all API requests to enable connection pooling
static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create HTTP client")
});

fn http_client(allow_self_signed: bool) -> Result<reqwest::Client> {
    if !allow_self_signed {
        return Ok(HTTP_CLIENT.clone());
    }

    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .danger_accept_invalid_certs(true)
        .build()?)
}

#[derive(Debug, Clone)]
enum Auth {
    ApiKey(String),
    Basic { username: String, password: String },
}

#[derive(Debug, Clone)]
pub struct RedmineClient {
    http: reqwest::Client,
    base_url: String,
    auth: Auth,
}

// Envelopes for the REST responses
#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Debug, Deserialize)]
struct IssueEnvelope {
    issue: Issue,
}

#[derive(Debug, Deserialize)]
struct StatusesEnvelope {
    issue_statuses: Vec<IssueStatus>,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(alias = "issues", alias = "projects", alias = "time_entries")]
    items: Vec<T>,
    #[serde(default)]
    total_count: Option<usize>,
}

impl RedmineClient {
    pub fn new(base_url: &str, api_key: &str, allow_self_signed: bool) -> Result<Self> {
        Ok(Self {
            http: http_client(allow_self_signed)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: Auth::ApiKey(api_key.to_string()),
        })
    }

    /// Client authenticating with a username and password, used to log in
    pub fn with_credentials(
        base_url: &str,
        username: &str,
        password: &str,
        allow_self_signed: bool,
    ) -> Result<Self> {
        Ok(Self {
            http: http_client(allow_self_signed)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: Auth::Basic {
                username: username.to_string(),
                password: password.to_string(),
            },
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.server_url, &config.api_key, config.allow_self_signed_cert)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);

        let request = self.http.request(method, url);
        match &self.auth {
            Auth::ApiKey(key) => request.header("X-Redmine-API-Key", key),
            Auth::Basic { username, password } => request.basic_auth(username, Some(password)),
        }
    }

    async fn send(request: RequestBuilder) -> Result<String> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(RedmineError::Authentication(status.to_string()));
        }
        if !(status.is_success() || status.is_redirection()) {
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body.chars().take(200).collect()
            };
            return Err(RedmineError::Http { status, message });
        }

        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let body = Self::send(self.request(Method::GET, path).query(query)).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_all<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<T>> {
        let mut items: Vec<T> = Vec::new();

        loop {
            let mut params = query.to_vec();
            params.push(("limit", PAGE_SIZE.to_string()));
            params.push(("offset", items.len().to_string()));

            let page: Page<T> = self.get_json(path, &params).await?;
            let received = page.items.len();
            items.extend(page.items);

            let done = match page.total_count {
                Some(total) => items.len() >= total,
                None => true,
            };
            if received == 0 || done {
                break;
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl RemoteClient for RedmineClient {
    async fn get_user(&self) -> Result<User> {
        let envelope: UserEnvelope = self.get_json("/users/current.json", &[]).await?;
        Ok(envelope.user)
    }

    async fn get_issues(&self) -> Result<Vec<Issue>> {
        self.get_all("/issues.json", &[("watcher_id", "me".to_string())])
            .await
    }

    async fn get_issue_statuses(&self) -> Result<Vec<IssueStatus>> {
        let envelope: StatusesEnvelope = self.get_json("/issue_statuses.json", &[]).await?;
        Ok(envelope.issue_statuses)
    }

    async fn get_projects(&self) -> Result<Vec<Project>> {
        self.get_all("/projects.json", &[]).await
    }

    async fn get_time_entries(&self, days_back: i64) -> Result<Vec<TimeEntry>> {
        let today = Local::now().date_naive();
        let since = today - ChronoDuration::days(days_back);
        let spent_on = format!("><{}|{}", since.format("%Y-%m-%d"), today.format("%Y-%m-%d"));

        self.get_all(
            "/time_entries.json",
            &[("user_id", "me".to_string()), ("spent_on", spent_on)],
        )
        .await
    }

    async fn get_issue(&self, id: u64) -> Result<Issue> {
        let envelope: IssueEnvelope = self
            .get_json(&format!("/issues/{}.json", id), &[])
            .await?;
        Ok(envelope.issue)
    }

    async fn update_issue(&self, id: u64, update: &IssueUpdate) -> Result<()> {
        tracing::debug!("Updating issue {} with {:?}", id, update);
        let body = serde_json::json!({ "issue": update });
        let response = Self::send(
            self.request(Method::PUT, &format!("/issues/{}.json", id))
                .json(&body),
        )
        .await?;
        tracing::debug!("Update response: {}", response);
        Ok(())
    }
}
