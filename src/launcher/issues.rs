//! Open issue listing, single-issue detail and issue rendering.

use super::actions::Action;
use super::search::FuzzySearch;
use super::{decode_state, Icon, Item, ItemArg, Workflow};
use crate::config::Config;
use crate::data::dates::human_date_str;
use crate::data::sorting::sort_issues;
use crate::data::{Issue, IssueUpdate};
use crate::integrations::cache::Cache;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const KEYWORD: &str = "issues";

/// Prebuilt "assigned to me, open" query with the usual columns
const VIEW_ALL_QUERY: &str = "/issues?utf8=%E2%9C%93&set_filter=1\
&f[]=assigned_to_id&op[assigned_to_id]=%3D&v[assigned_to_id][]=me\
&f[]=status_id&op[status_id]=o&f[]=\
&c[]=project&c[]=status&c[]=priority&c[]=subject&c[]=updated_on\
&c[]=due_date&c[]=estimated_hours&c[]=spent_hours&c[]=done_ratio&group_by=";

/// State carried between issue listings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IssuesState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
}

/// Issue fields a query is matched against. An issue matches if any
/// enabled field does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchFields {
    pub subject: bool,
    pub id: bool,
    pub project_subject: bool,
}

impl Default for MatchFields {
    fn default() -> Self {
        Self {
            subject: true,
            id: true,
            project_subject: false,
        }
    }
}

impl MatchFields {
    pub fn from_config(config: &Config) -> Self {
        Self {
            subject: true,
            id: config.match_issue_id,
            project_subject: config.match_project_name,
        }
    }

    fn matches(&self, search: &mut FuzzySearch, issue: &Issue, query: &str) -> bool {
        (self.subject && search.matches(&issue.subject, query))
            || (self.id && search.matches(&issue.id.to_string(), query))
            || (self.project_subject
                && search.matches(&format!("{} {}", issue.project.name, issue.subject), query))
    }
}

/// Open issues matching `query`, optionally limited to one project,
/// in display order.
pub fn open_issues<'a>(
    cache: &'a Cache,
    query: &str,
    project_id: Option<u64>,
    fields: MatchFields,
) -> Vec<&'a Issue> {
    let closed = cache.closed_status_ids();
    let mut search = FuzzySearch::new();

    let mut issues: Vec<&Issue> = cache
        .issues
        .iter()
        .filter(|i| !closed.contains(&i.status.id))
        .filter(|i| project_id.map_or(true, |p| i.project.id == p))
        .filter(|i| fields.matches(&mut search, i, query))
        .collect();

    sort_issues(&mut issues, cache.user.id);
    issues
}

/// Link to the server's own filtered list of my open issues
pub fn view_all_url(base_url: &str) -> String {
    format!("{}{}", base_url, VIEW_ALL_QUERY)
}

pub fn issue_url(base_url: &str, id: u64) -> String {
    format!("{}/issues/{}", base_url, id)
}

pub fn issue_subtitle(issue: &Issue, today: NaiveDate) -> String {
    let mut subtitle = format!("{} [{}]", issue.id, issue.project.name);
    if let Some(due) = issue.due() {
        subtitle.push_str(&format!(" Due {},", human_date_str(due, today)));
    }
    subtitle.push_str(&format!(" {}", issue.priority.name));
    subtitle
}

/// Result item for one issue
pub fn issue_item(issue: &Issue, user_id: u64, base_url: &str, today: NaiveDate) -> Item {
    let mut item = Item::new(issue.subject.clone())
        .uid(format!("redmineissue-{}", issue.id))
        .subtitle(issue_subtitle(issue, today))
        .autocomplete(format!("{}: ", issue.id))
        .arg(ItemArg::action(
            KEYWORD,
            &Action::open(issue_url(base_url, issue.id)),
        ));

    if issue.is_assigned_to(user_id) {
        item = item.icon(Icon::Mine);
    }
    item
}

pub async fn items(wf: &mut Workflow, arg: &str, data: &str) -> Result<Vec<Item>> {
    let state: IssuesState = decode_state(data, KEYWORD);
    let refresh_error = wf.check_refresh().await;

    let mut items = Vec::new();
    if let Some(e) = &refresh_error {
        items.push(Item::error("Error syncing with Redmine", e));
    }

    if let Some((id, facet)) = detail_query(arg) {
        items.extend(detail_items(wf, id, facet)?);
        return Ok(items);
    }

    let base_url = wf.base_url();
    let query = arg.trim();

    if query.is_empty() && state.project_id.is_none() {
        items.push(
            Item::new("View all on Redmine")
                .subtitle("Open your issue list in the browser")
                .arg(ItemArg::action(KEYWORD, &Action::open(view_all_url(base_url)))),
        );
    }

    let cache = wf.store.cache();
    let fields = MatchFields::from_config(&wf.config);
    items.extend(
        open_issues(cache, query, state.project_id, fields)
            .into_iter()
            .map(|issue| issue_item(issue, cache.user.id, base_url, wf.today())),
    );

    Ok(items)
}

/// Split `{id}: {facet}`. Queries whose prefix is not a number are
/// plain subject searches.
fn detail_query(arg: &str) -> Option<(u64, &str)> {
    let (id, facet) = arg.split_once(':')?;
    let id = id.trim().parse::<u64>().ok()?;
    Some((id, facet.trim()))
}

/// Items for `{id}: {facet}` queries
fn detail_items(wf: &Workflow, id: u64, facet: &str) -> Result<Vec<Item>> {
    let cache = wf.store.cache();
    let issue = cache
        .issue(id)
        .with_context(|| format!("Invalid ID {}", id))?;

    if facet == "status" {
        return Ok(status_choices(wf, issue));
    }

    let today = wf.today();
    let mut search = FuzzySearch::new();
    let mut items = Vec::new();

    if search.matches("subject", facet) {
        items.push(
            Item::new(issue.subject.clone())
                .subtitle("Subject")
                .autocomplete(format!("{}: subject", issue.id))
                .arg(ItemArg::action(
                    KEYWORD,
                    &Action::open(issue_url(wf.base_url(), issue.id)),
                )),
        );
    }
    if search.matches("status", facet) {
        items.push(
            Item::new(format!("Status: {}", issue.status.name))
                .subtitle(issue_subtitle(issue, today))
                .autocomplete(format!("{}: status", issue.id)),
        );
    }

    Ok(items)
}

/// Every known status as an update action for `issue`
fn status_choices(wf: &Workflow, issue: &Issue) -> Vec<Item> {
    wf.store
        .cache()
        .issue_statuses
        .iter()
        .map(|status| {
            let mut item = Item::new(status.name.clone()).arg(ItemArg::action(
                KEYWORD,
                &Action::UpdateIssue {
                    id: issue.id,
                    update: IssueUpdate::status(status.id),
                },
            ));
            if status.id == issue.status.id {
                item = item.subtitle("Current status").icon(Icon::Checked);
            }
            item
        })
        .collect()
}
