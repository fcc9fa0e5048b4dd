//! Projects with open issues, then projects whose issues are all closed.

use super::actions::Action;
use super::issues::IssuesState;
use super::search::FuzzySearch;
use super::{Item, ItemArg, Workflow};
use crate::data::dates::human_date_str;
use crate::data::sorting::compare_due_dates;
use crate::data::Project;
use crate::integrations::cache::Cache;
use anyhow::Result;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::HashMap;

const KEYWORD: &str = "projects";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveProject<'a> {
    pub project: &'a Project,
    pub open_issues: usize,
    /// Soonest due date among the open issues
    pub next_due: Option<&'a str>,
}

/// Projects split by whether they have open work
#[derive(Debug, Default)]
pub struct ProjectPartition<'a> {
    pub active: Vec<ActiveProject<'a>>,
    pub recently_active: Vec<&'a Project>,
}

#[derive(Default)]
struct Tally<'a> {
    total: usize,
    open: usize,
    next_due: Option<&'a str>,
}

/// Partition projects in their stored order. Projects without any cached
/// issue are left out.
pub fn partition(cache: &Cache) -> ProjectPartition<'_> {
    let closed = cache.closed_status_ids();
    let mut tallies: HashMap<u64, Tally> = HashMap::new();

    for issue in &cache.issues {
        let tally = tallies.entry(issue.project.id).or_default();
        tally.total += 1;
        if closed.contains(&issue.status.id) {
            continue;
        }
        tally.open += 1;
        if compare_due_dates(issue.due(), tally.next_due) == Ordering::Less {
            tally.next_due = issue.due();
        }
    }

    let mut result = ProjectPartition::default();
    for project in &cache.projects {
        match tallies.get(&project.id) {
            Some(t) if t.open > 0 => result.active.push(ActiveProject {
                project,
                open_issues: t.open,
                next_due: t.next_due,
            }),
            Some(t) if t.total > 0 => result.recently_active.push(project),
            _ => {}
        }
    }
    result
}

fn project_item(project: &Project, base_url: &str) -> Item {
    let state = IssuesState {
        project_id: Some(project.id),
    };
    Item::new(project.name.clone())
        .uid(format!("redmineproject-{}", project.id))
        .arg(ItemArg::items(super::Command::Issues.keyword(), &state))
        .alt(
            "Open this project on Redmine",
            ItemArg::action(
                KEYWORD,
                &Action::open(format!("{}/projects/{}", base_url, project.id)),
            ),
        )
}

fn active_subtitle(active: &ActiveProject, today: NaiveDate) -> String {
    let mut subtitle = match active.open_issues {
        1 => "1 open issue".to_string(),
        n => format!("{} open issues", n),
    };
    if let Some(due) = active.next_due {
        subtitle.push_str(&format!(", first is due {}", human_date_str(due, today)));
    }
    subtitle
}

pub async fn items(wf: &mut Workflow, arg: &str) -> Result<Vec<Item>> {
    let refresh_error = wf.check_refresh().await;

    let mut items = Vec::new();
    if let Some(e) = &refresh_error {
        items.push(Item::error("Error syncing with Redmine", e));
    }

    let query = arg.trim();
    let base_url = wf.base_url();
    let today = wf.today();
    let partition = partition(wf.store.cache());
    let mut search = FuzzySearch::new();

    for active in &partition.active {
        if search.matches(&active.project.name, query) {
            items.push(project_item(active.project, base_url).subtitle(active_subtitle(active, today)));
        }
    }
    for project in &partition.recently_active {
        if search.matches(&project.name, query) {
            items.push(project_item(project, base_url).subtitle("Recently active"));
        }
    }

    Ok(items)
}
