use super::issues::{issue_item, open_issues, MatchFields};
use super::{Item, Workflow};
use anyhow::Result;

/// Sync state, or the open issues assigned to me
pub async fn items(wf: &mut Workflow) -> Result<Vec<Item>> {
    if let Some(e) = wf.check_refresh().await {
        return Ok(vec![Item::error("Error syncing with Redmine", &e)]);
    }

    let cache = wf.store.cache();
    let user_id = cache.user.id;
    let items = open_issues(cache, "", None, MatchFields::default())
        .into_iter()
        .filter(|issue| issue.is_assigned_to(user_id))
        .map(|issue| issue_item(issue, user_id, wf.base_url(), wf.today()))
        .collect();

    Ok(items)
}
