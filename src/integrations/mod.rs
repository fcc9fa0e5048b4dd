pub mod cache;
pub mod redmine;

use crate::data::timesheet::missing_issue_ids;
use crate::data::{Issue, IssueStatus, Project, TimeEntry, User};
use anyhow::{Context, Result};
use cache::{CacheStore, Snapshot};
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use redmine::{RedmineError, RemoteClient};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;

/// One completed refresh fetch
#[derive(Debug)]
enum Fetched {
    User(User),
    Issues(Vec<Issue>),
    Statuses(Vec<IssueStatus>),
    Projects(Vec<Project>),
    TimeEntries(Vec<TimeEntry>),
}

const FETCH_COUNT: usize = 5;

fn spawn_fetch<F>(tx: &mpsc::Sender<redmine::Result<Fetched>>, what: &'static str, fetch: F)
where
    F: Future<Output = redmine::Result<Fetched>> + Send + 'static,
{
    let tx = tx.clone();
    tokio::spawn(async move {
        tracing::debug!("Getting {}...", what);
        let result = fetch.await;
        crate::util::send_or_log(&tx, result, what).await;
    });
}

/// Fetch the five cached resources concurrently.
///
/// Results are consumed in completion order. The first failure is returned
/// right away; fetches still in flight run to completion and their results
/// are dropped.
pub async fn fetch_snapshot(
    client: Arc<dyn RemoteClient>,
    time_entry_days: i64,
) -> redmine::Result<Snapshot> {
    let (tx, mut rx) = mpsc::channel(FETCH_COUNT);

    let c = Arc::clone(&client);
    spawn_fetch(&tx, "user", async move { c.get_user().await.map(Fetched::User) });
    let c = Arc::clone(&client);
    spawn_fetch(&tx, "issues", async move { c.get_issues().await.map(Fetched::Issues) });
    let c = Arc::clone(&client);
    spawn_fetch(&tx, "statuses", async move {
        c.get_issue_statuses().await.map(Fetched::Statuses)
    });
    let c = Arc::clone(&client);
    spawn_fetch(&tx, "projects", async move { c.get_projects().await.map(Fetched::Projects) });
    let c = Arc::clone(&client);
    spawn_fetch(&tx, "time entries", async move {
        c.get_time_entries(time_entry_days)
            .await
            .map(Fetched::TimeEntries)
    });
    drop(tx);

    let mut user = None;
    let mut issues = None;
    let mut statuses = None;
    let mut projects = None;
    let mut time_entries = None;

    for _ in 0..FETCH_COUNT {
        match rx.recv().await {
            Some(Ok(Fetched::User(value))) => {
                tracing::debug!("Got user");
                user = Some(value);
            }
            Some(Ok(Fetched::Issues(value))) => {
                tracing::debug!("Got {} issues", value.len());
                issues = Some(value);
            }
            Some(Ok(Fetched::Statuses(value))) => {
                tracing::debug!("Got {} issue statuses", value.len());
                statuses = Some(value);
            }
            Some(Ok(Fetched::Projects(value))) => {
                tracing::debug!("Got {} projects", value.len());
                projects = Some(value);
            }
            Some(Ok(Fetched::TimeEntries(value))) => {
                tracing::debug!("Got {} time entries", value.len());
                time_entries = Some(value);
            }
            Some(Err(e)) => return Err(e),
            None => break,
        }
    }

    match (user, issues, statuses, projects, time_entries) {
        (Some(user), Some(issues), Some(issue_statuses), Some(projects), Some(time_entries)) => {
            Ok(Snapshot {
                user,
                issues,
                issue_statuses,
                projects,
                time_entries,
            })
        }
        _ => Err(RedmineError::Other(
            "refresh ended without all results".to_string(),
        )),
    }
}

/// Refresh the whole cache. On failure the store is left untouched.
pub async fn refresh(
    client: Arc<dyn RemoteClient>,
    store: &mut CacheStore,
    time_entry_days: i64,
) -> Result<()> {
    tracing::info!("Refreshing cache...");
    let snapshot = fetch_snapshot(client, time_entry_days)
        .await
        .context("Error refreshing cache")?;

    store.replace(snapshot, Utc::now());
    tracing::info!("Cache refreshed");
    Ok(())
}

/// Refresh if the cache is older than the staleness window.
/// Returns whether a refresh ran.
pub async fn check_refresh(
    client: Arc<dyn RemoteClient>,
    store: &mut CacheStore,
    time_entry_days: i64,
    now: DateTime<Utc>,
) -> Result<bool> {
    if !store.is_stale(now) {
        return Ok(false);
    }

    if let Err(e) = refresh(client, store, time_entry_days).await {
        tracing::warn!("{:#}", e);
        return Err(e);
    }
    Ok(true)
}

/// Fetch issues referenced by cached time entries but missing from the
/// cached issues, and append them to the cache.
///
/// Unlike a refresh, any failure aborts the whole backfill: outstanding
/// requests are cancelled and nothing is appended.
pub async fn backfill_missing_issues(
    client: &dyn RemoteClient,
    store: &mut CacheStore,
) -> redmine::Result<usize> {
    let missing = missing_issue_ids(&store.cache().time_entries, &store.cache().issues);
    if missing.is_empty() {
        return Ok(0);
    }

    tracing::debug!("Fetching {} missing issues", missing.len());
    let mut pending: FuturesUnordered<_> = missing.iter().map(|&id| client.get_issue(id)).collect();

    let mut fetched = Vec::with_capacity(missing.len());
    while let Some(result) = pending.next().await {
        let issue = result?;
        tracing::debug!("Fetched missing issue {}", issue.id);
        fetched.push(issue);
    }

    let count = fetched.len();
    store.append_issues(fetched);
    Ok(count)
}
