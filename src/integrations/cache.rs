//! Local snapshot of server state.
//!
//! The cache is stored as JSON and carries the time of the last successful
//! refresh. It is loaded best-effort at startup, replaced wholesale by a
//! refresh, patched one issue at a time after updates, and written back to
//! disk after every mutation.

use crate::data::{Issue, IssueStatus, Project, TimeEntry, User};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const CACHE_VERSION: u32 = 1;

/// Age after which a query triggers a refresh
pub const STALE_AFTER_MINUTES: i64 = 10;

// =============================================================================
// Cache Data Structure
// =============================================================================

/// Cache file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cache {
    /// Schema version for forward compatibility
    pub version: u32,

    /// Last successful refresh
    pub last_refreshed: DateTime<Utc>,

    pub user: User,
    pub issues: Vec<Issue>,
    pub issue_statuses: Vec<IssueStatus>,
    pub projects: Vec<Project>,
    pub time_entries: Vec<TimeEntry>,
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            version: CACHE_VERSION,
            last_refreshed: DateTime::UNIX_EPOCH,
            user: User::default(),
            issues: Vec::new(),
            issue_statuses: Vec::new(),
            projects: Vec::new(),
            time_entries: Vec::new(),
        }
    }
}

impl Cache {
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.last_refreshed) > Duration::minutes(STALE_AFTER_MINUTES)
    }

    pub fn closed_status_ids(&self) -> HashSet<u64> {
        crate::data::closed_status_ids(&self.issue_statuses)
    }

    pub fn issue(&self, id: u64) -> Option<&Issue> {
        self.issues.iter().find(|i| i.id == id)
    }
}

/// The five collections produced by one refresh
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub user: User,
    pub issues: Vec<Issue>,
    pub issue_statuses: Vec<IssueStatus>,
    pub projects: Vec<Project>,
    pub time_entries: Vec<TimeEntry>,
}

// =============================================================================
// File Operations
// =============================================================================

/// Load cache from a specific path
pub fn load_cache_from_path(path: &Path) -> Result<Option<Cache>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read cache from {}", path.display()))?;

    let cache: Cache = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse cache from {}", path.display()))?;

    if cache.version != CACHE_VERSION {
        tracing::warn!(
            "Cache version mismatch (expected {}, got {}), ignoring cache",
            CACHE_VERSION,
            cache.version
        );
        return Ok(None);
    }

    Ok(Some(cache))
}

/// Save cache to a specific path
pub fn save_cache_to_path(path: &Path, cache: &Cache) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(cache).context("Failed to serialize cache")?;

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write cache to {}", path.display()))?;

    Ok(())
}

// =============================================================================
// Store
// =============================================================================

/// Owner of the process's cache. Without a path it never touches disk.
#[derive(Debug, Default)]
pub struct CacheStore {
    cache: Cache,
    path: Option<PathBuf>,
}

impl CacheStore {
    /// Open the cache at `path`. A missing or unreadable file starts empty.
    pub fn open(path: PathBuf) -> Self {
        let cache = match load_cache_from_path(&path) {
            Ok(Some(cache)) => cache,
            Ok(None) => Cache::default(),
            Err(e) => {
                tracing::warn!("Error loading cache: {:#}", e);
                Cache::default()
            }
        };

        Self {
            cache,
            path: Some(path),
        }
    }

    pub fn in_memory(cache: Cache) -> Self {
        Self { cache, path: None }
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.cache.is_stale(now)
    }

    /// Swap in a complete refresh result
    pub fn replace(&mut self, snapshot: Snapshot, now: DateTime<Utc>) {
        self.cache = Cache {
            version: CACHE_VERSION,
            last_refreshed: now,
            user: snapshot.user,
            issues: snapshot.issues,
            issue_statuses: snapshot.issue_statuses,
            projects: snapshot.projects,
            time_entries: snapshot.time_entries,
        };
        self.persist();
    }

    /// Replace the cached issue with the same id, keeping its position.
    /// Returns false (and changes nothing) if the issue is not cached.
    pub fn patch_issue(&mut self, issue: Issue) -> bool {
        let Some(pos) = self.cache.issues.iter().position(|i| i.id == issue.id) else {
            tracing::debug!("Issue {} not cached, nothing to patch", issue.id);
            return false;
        };

        self.cache.issues[pos] = issue;
        self.persist();
        true
    }

    /// Add issues fetched outside a refresh
    pub fn append_issues(&mut self, issues: Vec<Issue>) {
        if issues.is_empty() {
            return;
        }
        self.cache.issues.extend(issues);
        self.persist();
    }

    /// Write the cache to disk. Failures are logged; memory stays authoritative.
    pub fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };

        if let Err(e) = save_cache_to_path(path, &self.cache) {
            tracing::warn!("Error saving cache: {:#}", e);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
