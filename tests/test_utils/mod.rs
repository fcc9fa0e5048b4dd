//! Test utilities and fixtures for redmine-launcher tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use redmine_launcher::config::Config;
use redmine_launcher::data::{
    Issue, IssueId, IssueStatus, IssueUpdate, NamedRef, Project, TimeEntry, User,
};
use redmine_launcher::integrations::cache::{Cache, CacheStore};
use redmine_launcher::integrations::redmine::{RedmineError, RemoteClient, Result};
use redmine_launcher::launcher::Workflow;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Fixed "today" for listings: a Wednesday
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 13).unwrap()
}

pub fn user() -> User {
    User {
        id: 5,
        login: "jo".to_string(),
        api_key: "secret".to_string(),
        ..Default::default()
    }
}

pub fn status(id: u64, name: &str, is_closed: bool) -> IssueStatus {
    IssueStatus {
        id,
        name: name.to_string(),
        is_default: id == 1,
        is_closed,
    }
}

pub fn statuses() -> Vec<IssueStatus> {
    vec![status(1, "New", false), status(2, "Closed", true)]
}

pub fn project(id: u64, name: &str) -> Project {
    Project {
        id,
        name: name.to_string(),
        identifier: name.to_lowercase(),
        ..Default::default()
    }
}

pub fn issue(id: u64, subject: &str, project: &Project, status_id: u64) -> Issue {
    Issue {
        id,
        subject: subject.to_string(),
        project: NamedRef::new(project.id, project.name.clone()),
        status: NamedRef::new(status_id, ""),
        priority: NamedRef::new(2, "Normal"),
        ..Default::default()
    }
}

pub fn time_entry(
    id: u64,
    project: &Project,
    issue_id: Option<u64>,
    spent_on: &str,
    hours: f64,
) -> TimeEntry {
    TimeEntry {
        id,
        hours,
        spent_on: spent_on.to_string(),
        user: NamedRef::new(5, "Jo"),
        project: NamedRef::new(project.id, project.name.clone()),
        activity: NamedRef::new(9, "Development"),
        issue: issue_id.map(|id| IssueId { id }),
        ..Default::default()
    }
}

pub fn logged_in_config() -> Config {
    Config {
        server_url: "https://redmine.example.com".to_string(),
        api_key: "secret".to_string(),
        ..Config::default()
    }
}

/// A cache that is not stale, so listings do not try to refresh
pub fn fresh_cache(issues: Vec<Issue>, projects: Vec<Project>, entries: Vec<TimeEntry>) -> Cache {
    Cache {
        last_refreshed: Utc::now(),
        user: user(),
        issues,
        issue_statuses: statuses(),
        projects,
        time_entries: entries,
        ..Default::default()
    }
}

/// Workflow over an in-memory cache, with URL opening recorded instead of run
pub fn workflow(cache: Cache, client: Arc<FakeClient>) -> (Workflow, Arc<Mutex<Vec<String>>>) {
    let opened = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&opened);
    let wf = Workflow::new(logged_in_config(), CacheStore::in_memory(cache), client)
        .with_today(today())
        .with_opener(move |url| {
            sink.lock().unwrap().push(url.to_string());
            Ok(())
        });
    (wf, opened)
}

// =============================================================================
// Scripted remote client
// =============================================================================

/// In-memory `RemoteClient` whose responses and failures are set up front
#[derive(Default)]
pub struct FakeClient {
    pub user: User,
    pub issues: Vec<Issue>,
    pub statuses: Vec<IssueStatus>,
    pub projects: Vec<Project>,
    pub time_entries: Vec<TimeEntry>,
    /// Issues only reachable through `get_issue`
    pub remote_issues: Mutex<HashMap<u64, Issue>>,
    /// Operation names that fail
    pub failing: Vec<&'static str>,
    /// Per-operation delay
    pub delays: HashMap<&'static str, Duration>,
    /// Operation names in call order
    pub calls: Mutex<Vec<String>>,
    pub updates: Mutex<Vec<(u64, IssueUpdate)>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self {
            user: user(),
            statuses: statuses(),
            ..Default::default()
        }
    }

    pub fn failing(mut self, op: &'static str) -> Self {
        self.failing.push(op);
        self
    }

    pub fn delayed(mut self, op: &'static str, delay: Duration) -> Self {
        self.delays.insert(op, delay);
        self
    }

    pub fn with_remote_issue(self, issue: Issue) -> Self {
        self.remote_issues.lock().unwrap().insert(issue.id, issue);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == op).count()
    }

    async fn enter(&self, op: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(op.to_string());
        if let Some(delay) = self.delays.get(op) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(&op) {
            return Err(RedmineError::Network(format!("{} failed", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteClient for FakeClient {
    async fn get_user(&self) -> Result<User> {
        self.enter("get_user").await?;
        Ok(self.user.clone())
    }

    async fn get_issues(&self) -> Result<Vec<Issue>> {
        self.enter("get_issues").await?;
        Ok(self.issues.clone())
    }

    async fn get_issue_statuses(&self) -> Result<Vec<IssueStatus>> {
        self.enter("get_issue_statuses").await?;
        Ok(self.statuses.clone())
    }

    async fn get_projects(&self) -> Result<Vec<Project>> {
        self.enter("get_projects").await?;
        Ok(self.projects.clone())
    }

    async fn get_time_entries(&self, _days_back: i64) -> Result<Vec<TimeEntry>> {
        self.enter("get_time_entries").await?;
        Ok(self.time_entries.clone())
    }

    async fn get_issue(&self, id: u64) -> Result<Issue> {
        self.enter("get_issue").await?;
        let remote = self.remote_issues.lock().unwrap().get(&id).cloned();
        remote
            .or_else(|| self.issues.iter().find(|i| i.id == id).cloned())
            .ok_or_else(|| RedmineError::Other(format!("No issue {}", id)))
    }

    async fn update_issue(&self, id: u64, update: &IssueUpdate) -> Result<()> {
        self.enter("update_issue").await?;
        self.updates.lock().unwrap().push((id, update.clone()));

        let mut remote = self.remote_issues.lock().unwrap();
        let current = remote
            .get(&id)
            .cloned()
            .or_else(|| self.issues.iter().find(|i| i.id == id).cloned());
        if let (Some(mut issue), Some(status_id)) = (current, update.status_id) {
            issue.status = NamedRef::new(status_id, "");
            remote.insert(id, issue);
        }
        Ok(())
    }
}
