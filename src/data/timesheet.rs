//! Time entry aggregation into a project -> issue hierarchy.

use super::span::Span;
use super::{Issue, Project, TimeEntry};
use std::collections::HashMap;

pub const NO_ISSUE_NAME: &str = "(no issue)";

#[derive(Debug, Clone, PartialEq)]
pub struct IssueBucket<'a> {
    pub issue_id: Option<u64>,
    pub name: String,
    pub issue: Option<&'a Issue>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectBucket<'a> {
    pub id: u64,
    pub name: String,
    pub project: Option<&'a Project>,
    pub total: f64,
    /// First-seen order
    pub issues: Vec<IssueBucket<'a>>,
}

/// Hours within a span, grouped by project then issue. Borrowed from the
/// cache and rebuilt for every query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Timesheet<'a> {
    pub total: f64,
    /// First-seen order
    pub projects: Vec<ProjectBucket<'a>>,
}

impl<'a> Timesheet<'a> {
    pub fn build(
        entries: &'a [TimeEntry],
        issues: &'a [Issue],
        projects: &'a [Project],
        span: &Span,
    ) -> Self {
        let mut sheet = Timesheet::default();
        let mut project_index: HashMap<u64, usize> = HashMap::new();
        let mut issue_index: HashMap<(u64, Option<u64>), usize> = HashMap::new();

        for entry in entries.iter().filter(|e| span.contains(&e.spent_on)) {
            let project_id = entry.project.id;

            let p = *project_index.entry(project_id).or_insert_with(|| {
                let project = projects.iter().find(|p| p.id == project_id);
                if project.is_none() {
                    tracing::debug!("Missing project {}", project_id);
                }
                sheet.projects.push(ProjectBucket {
                    id: project_id,
                    name: entry.project.name.clone(),
                    project,
                    total: 0.0,
                    issues: Vec::new(),
                });
                sheet.projects.len() - 1
            });
            let bucket = &mut sheet.projects[p];

            let issue_id = entry.issue_id();
            let i = *issue_index.entry((project_id, issue_id)).or_insert_with(|| {
                let issue = issue_id.and_then(|id| issues.iter().find(|i| i.id == id));
                let name = match (issue, issue_id) {
                    (Some(issue), _) => issue.subject.clone(),
                    (None, Some(id)) => format!("#{}", id),
                    (None, None) => NO_ISSUE_NAME.to_string(),
                };
                bucket.issues.push(IssueBucket {
                    issue_id,
                    name,
                    issue,
                    total: 0.0,
                });
                bucket.issues.len() - 1
            });

            bucket.issues[i].total += entry.hours;
            bucket.total += entry.hours;
            sheet.total += entry.hours;
        }

        sheet
    }

    pub fn project(&self, id: u64) -> Option<&ProjectBucket<'a>> {
        self.projects.iter().find(|p| p.id == id)
    }
}

/// Issue ids referenced by time entries but absent from `issues`, deduplicated
/// in first-seen order.
pub fn missing_issue_ids(entries: &[TimeEntry], issues: &[Issue]) -> Vec<u64> {
    let mut missing = Vec::new();
    for id in entries.iter().filter_map(TimeEntry::issue_id) {
        if !issues.iter().any(|i| i.id == id) && !missing.contains(&id) {
            missing.push(id);
        }
    }
    missing
}
