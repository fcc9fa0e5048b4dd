pub mod dates;
pub mod sorting;
pub mod span;
pub mod timesheet;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A denormalized id/name pair as Redmine embeds it in other resources
/// (project, status, priority, assignee, activity...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NamedRef {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

impl NamedRef {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// The account the API key belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub mail: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub last_login_on: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub updated_on: Option<String>,
}

/// One of the statuses configured on the server. `is_closed` defines the
/// open/closed partition used by every listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IssueStatus {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_closed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Issue {
    pub id: u64,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project: NamedRef,
    #[serde(default)]
    pub status: NamedRef,
    #[serde(default)]
    pub priority: NamedRef,
    #[serde(default)]
    pub tracker: Option<NamedRef>,
    #[serde(default)]
    pub author: Option<NamedRef>,
    #[serde(default)]
    pub assigned_to: Option<NamedRef>,
    /// ISO `yyyy-mm-dd`; zero-padded so plain string ordering is date ordering
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub spent_hours: Option<f64>,
    #[serde(default)]
    pub done_ratio: u32,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub updated_on: Option<String>,
}

impl Issue {
    /// Whether the issue is assigned to the given user
    pub fn is_assigned_to(&self, user_id: u64) -> bool {
        self.assigned_to.as_ref().is_some_and(|a| a.id == user_id)
    }

    /// Due date, treating an empty string the same as an unset one
    pub fn due(&self) -> Option<&str> {
        self.due_date.as_deref().filter(|d| !d.is_empty())
    }
}

/// Time entries only carry the id of their issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IssueId {
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TimeEntry {
    pub id: u64,
    pub hours: f64,
    /// ISO `yyyy-mm-dd`
    pub spent_on: String,
    #[serde(default)]
    pub user: NamedRef,
    #[serde(default)]
    pub project: NamedRef,
    #[serde(default)]
    pub activity: NamedRef,
    #[serde(default)]
    pub issue: Option<IssueId>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub updated_on: Option<String>,
}

impl TimeEntry {
    pub fn issue_id(&self) -> Option<u64> {
        self.issue.map(|i| i.id)
    }
}

/// Partial issue update sent to the server. Unset fields are left alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IssueUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_ratio: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl IssueUpdate {
    pub fn status(status_id: u64) -> Self {
        Self {
            status_id: Some(status_id),
            ..Default::default()
        }
    }
}

/// Ids of every status flagged as closed
pub fn closed_status_ids(statuses: &[IssueStatus]) -> HashSet<u64> {
    statuses
        .iter()
        .filter(|s| s.is_closed)
        .map(|s| s.id)
        .collect()
}
