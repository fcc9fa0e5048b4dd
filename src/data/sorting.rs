//! Ordering rules for issue listings.
//!
//! Issues are ordered by three keys, highest precedence first:
//! assignment (mine first), priority (higher id first), due date (earlier
//! first, undated last), falling back to the incoming order. Each key is a
//! separate stable pass, applied lowest precedence first.

use super::Issue;
use std::cmp::Ordering;

/// Compare two optional ISO due dates. A date always sorts before no date.
pub fn compare_due_dates(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sort issues for display relative to the current user.
pub fn sort_issues(issues: &mut [&Issue], user_id: u64) {
    issues.sort_by(|a, b| compare_due_dates(a.due(), b.due()));
    issues.sort_by(|a, b| b.priority.id.cmp(&a.priority.id));
    issues.sort_by_key(|issue| !issue.is_assigned_to(user_id));
}
