//! Timesheet listing: pick a span, then drill from projects into issues.

use super::actions::Action;
use super::search::FuzzySearch;
use super::{decode_state, Item, ItemArg, Workflow};
use crate::data::span::Span;
use crate::data::timesheet::Timesheet;
use crate::integrations::backfill_missing_issues;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const KEYWORD: &str = "timesheet";

/// Span choices offered before a span is selected
const SPAN_CHOICES: [&str; 3] = ["today", "yesterday", "week"];

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimesheetState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
}

pub fn report_url(base_url: &str, span: &Span, user_id: u64) -> String {
    format!(
        "{}/timesheet/report?timesheet[date_from]={}&timesheet[date_to]={}\
         &timesheet[sort]=project&timesheet[users][]={}",
        base_url, span.from, span.to, user_id
    )
}

pub fn format_hours(hours: f64) -> String {
    format!("{:.2}", hours)
}

pub async fn items(wf: &mut Workflow, arg: &str, data: &str) -> Result<Vec<Item>> {
    let state: TimesheetState = decode_state(data, KEYWORD);
    let refresh_error = wf.check_refresh().await;

    let mut items = Vec::new();
    if let Some(e) = &refresh_error {
        items.push(Item::error("Error syncing with Redmine", e));
    }

    match state.span {
        None => items.extend(span_items(wf, arg.trim())?),
        Some(span) => {
            backfill_missing_issues(wf.client.as_ref(), &mut wf.store)
                .await
                .context("Error fetching issues for timesheet")?;
            items.extend(timesheet_items(wf, &span, state.project_id, arg.trim())?);
        }
    }

    Ok(items)
}

fn span_item(wf: &Workflow, span: Span) -> Item {
    let report = report_url(wf.base_url(), &span, wf.store.cache().user.id);
    let subtitle = if span.from == span.to {
        span.from.clone()
    } else {
        format!("{} to {}", span.from, span.to)
    };

    Item::new(span.label().to_string())
        .subtitle(subtitle)
        .autocomplete(span.name.clone())
        .alt("Open the report on Redmine", ItemArg::action(KEYWORD, &Action::open(report)))
        .arg(ItemArg::items(
            KEYWORD,
            &TimesheetState {
                span: Some(span),
                project_id: None,
            },
        ))
}

fn span_items(wf: &Workflow, query: &str) -> Result<Vec<Item>> {
    let today = wf.today();
    let order = wf.config.date_order();
    let mut search = FuzzySearch::new();
    let mut items = Vec::new();

    for name in SPAN_CHOICES {
        if search.matches(name, query) {
            let span = Span::parse(name, today, order)?;
            items.push(span_item(wf, span));
        }
    }

    if query.starts_with(|c: char| c.is_ascii_digit()) {
        let span = Span::parse(query, today, order)?;
        items.push(span_item(wf, span));
    }

    Ok(items)
}

fn timesheet_items(
    wf: &Workflow,
    span: &Span,
    project_id: Option<u64>,
    query: &str,
) -> Result<Vec<Item>> {
    let cache = wf.store.cache();
    let sheet = Timesheet::build(&cache.time_entries, &cache.issues, &cache.projects, span);
    let mut search = FuzzySearch::new();
    let mut items = Vec::new();
    let mut total = 0.0;

    match project_id {
        None => {
            let mut projects: Vec<_> = sheet
                .projects
                .iter()
                .filter(|p| search.matches(&p.name, query))
                .collect();
            projects.sort_by(|a, b| a.name.cmp(&b.name));

            for bucket in projects {
                total += bucket.total;
                let state = TimesheetState {
                    span: Some(span.clone()),
                    project_id: Some(bucket.id),
                };
                items.push(
                    Item::new(bucket.name.clone())
                        .subtitle(format_hours(bucket.total))
                        .arg(ItemArg::items(KEYWORD, &state)),
                );
            }
        }
        Some(id) => {
            let bucket = sheet
                .project(id)
                .with_context(|| format!("Unknown project {}", id))?;

            for issue in bucket.issues.iter().filter(|i| search.matches(&i.name, query)) {
                total += issue.total;
                let mut item = Item::new(issue.name.clone()).subtitle(format_hours(issue.total));
                if let Some(issue_id) = issue.issue_id {
                    item = item.arg(ItemArg::action(
                        KEYWORD,
                        &Action::open(super::issues::issue_url(wf.base_url(), issue_id)),
                    ));
                }
                items.push(item);
            }
        }
    }

    if items.is_empty() {
        return Ok(vec![Item::new("No entries").subtitle(span.label().to_string())]);
    }

    let report = report_url(wf.base_url(), span, cache.user.id);
    let total_item = Item::new(format!("Total: {}", format_hours(total)))
        .subtitle(span.label().to_string())
        .arg(ItemArg::action(KEYWORD, &Action::open(report)));
    items.insert(0, total_item);

    Ok(items)
}
