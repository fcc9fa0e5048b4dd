//! Tests for timesheet span selection and aggregation listings

mod test_utils;

use redmine_launcher::data::span::Span;
use redmine_launcher::data::timesheet::NO_ISSUE_NAME;
use redmine_launcher::launcher::actions::Action;
use redmine_launcher::launcher::timesheet::TimesheetState;
use redmine_launcher::launcher::{Item, Mode};
use std::sync::Arc;
use test_utils::*;

fn titles(items: &[Item]) -> Vec<&str> {
    items.iter().map(|i| i.title.as_str()).collect()
}

fn subtitles(items: &[Item]) -> Vec<&str> {
    items.iter().map(|i| i.subtitle.as_str()).collect()
}

fn span(from: &str, to: &str) -> Span {
    Span {
        name: format!("{}..{}", from, to),
        label: None,
        from: from.to_string(),
        to: to.to_string(),
    }
}

fn state(span: Span, project_id: Option<u64>) -> String {
    serde_json::to_string(&TimesheetState {
        span: Some(span),
        project_id,
    })
    .unwrap()
}

/// Two projects, three issues, entries on three consecutive days
fn sample_cache() -> redmine_launcher::integrations::cache::Cache {
    let a = project(1, "Alpha");
    let b = project(2, "Beta");
    fresh_cache(
        vec![
            issue(10, "Issue X", &a, 1),
            issue(11, "Issue Y", &a, 1),
            issue(12, "Issue Z", &b, 1),
        ],
        vec![a.clone(), b.clone()],
        vec![
            time_entry(1, &a, Some(10), "2024-01-01", 2.0),
            time_entry(2, &a, Some(11), "2024-01-02", 3.0),
            time_entry(3, &b, Some(12), "2024-01-03", 1.0),
        ],
    )
}

mod spans {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_empty_query_offers_keyword_spans() {
        let (mut wf, _) = workflow(sample_cache(), Arc::new(FakeClient::new()));

        let items = wf.items("timesheet", "", "").await.unwrap();

        assert_eq!(titles(&items), vec!["today", "yesterday", "this week"]);
        assert_eq!(
            subtitles(&items),
            vec!["2024-03-13", "2024-03-12", "2024-03-11 to 2024-03-13"]
        );
    }

    #[tokio::test]
    async fn test_query_filters_keyword_spans() {
        let (mut wf, _) = workflow(sample_cache(), Arc::new(FakeClient::new()));

        let items = wf.items("timesheet", "yest", "").await.unwrap();
        assert_eq!(titles(&items), vec!["yesterday"]);
    }

    #[tokio::test]
    async fn test_digit_query_parses_a_span() {
        let (mut wf, _) = workflow(sample_cache(), Arc::new(FakeClient::new()));

        let items = wf
            .items("timesheet", "2024-1-1..2024-1-2", "")
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        let arg = items[0].arg.clone().unwrap();
        assert_eq!(arg.mode, Mode::Items);
        let state: TimesheetState = serde_json::from_str(&arg.data).unwrap();
        let span = state.span.unwrap();
        assert_eq!((span.from.as_str(), span.to.as_str()), ("2024-01-01", "2024-01-02"));
        assert!(items[0].alt.is_some());
    }

    #[tokio::test]
    async fn test_bad_span_is_an_error() {
        let (mut wf, _) = workflow(sample_cache(), Arc::new(FakeClient::new()));

        let err = wf.items("timesheet", "31/31", "").await.unwrap_err();
        assert!(err.to_string().contains("31/31"));
    }
}

mod aggregation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_project_totals_within_span() {
        let (mut wf, _) = workflow(sample_cache(), Arc::new(FakeClient::new()));

        let items = wf
            .items("timesheet", "", &state(span("2024-01-01", "2024-01-02"), None))
            .await
            .unwrap();

        assert_eq!(titles(&items), vec!["Total: 5.00", "Alpha"]);
        assert_eq!(items[1].subtitle, "5.00");
    }

    #[tokio::test]
    async fn test_projects_sorted_by_name_and_filtered() {
        let (mut wf, _) = workflow(sample_cache(), Arc::new(FakeClient::new()));
        let whole = span("2024-01-01", "2024-01-03");

        let items = wf
            .items("timesheet", "", &state(whole.clone(), None))
            .await
            .unwrap();
        assert_eq!(titles(&items), vec!["Total: 6.00", "Alpha", "Beta"]);

        let items = wf
            .items("timesheet", "bet", &state(whole, None))
            .await
            .unwrap();
        assert_eq!(titles(&items), vec!["Total: 1.00", "Beta"]);
    }

    #[tokio::test]
    async fn test_selected_project_lists_issue_buckets() {
        let (mut wf, _) = workflow(sample_cache(), Arc::new(FakeClient::new()));

        let items = wf
            .items("timesheet", "", &state(span("2024-01-01", "2024-01-02"), Some(1)))
            .await
            .unwrap();

        assert_eq!(titles(&items), vec!["Total: 5.00", "Issue X", "Issue Y"]);
        assert_eq!(subtitles(&items)[1..].to_vec(), vec!["2.00", "3.00"]);
    }

    #[tokio::test]
    async fn test_total_links_to_report() {
        let (mut wf, opened) = workflow(sample_cache(), Arc::new(FakeClient::new()));

        let items = wf
            .items("timesheet", "", &state(span("2024-01-01", "2024-01-02"), None))
            .await
            .unwrap();
        let arg = items[0].arg.clone().unwrap();
        wf.run(&arg.keyword, &arg.data).await.unwrap();

        assert_eq!(
            opened.lock().unwrap()[0],
            "https://redmine.example.com/timesheet/report?timesheet[date_from]=2024-01-01\
             &timesheet[date_to]=2024-01-02&timesheet[sort]=project&timesheet[users][]=5"
        );
    }

    #[tokio::test]
    async fn test_empty_span_shows_no_entries() {
        let (mut wf, _) = workflow(sample_cache(), Arc::new(FakeClient::new()));

        let items = wf
            .items("timesheet", "", &state(span("2023-01-01", "2023-01-31"), None))
            .await
            .unwrap();

        assert_eq!(titles(&items), vec!["No entries"]);
        assert!(!items[0].is_valid());
    }

    #[tokio::test]
    async fn test_entries_without_issue() {
        let a = project(1, "Alpha");
        let cache = fresh_cache(
            vec![],
            vec![a.clone()],
            vec![time_entry(1, &a, None, "2024-01-01", 1.5)],
        );
        let (mut wf, _) = workflow(cache, Arc::new(FakeClient::new()));

        let items = wf
            .items("timesheet", "", &state(span("2024-01-01", "2024-01-01"), Some(1)))
            .await
            .unwrap();

        assert_eq!(titles(&items), vec!["Total: 1.50", NO_ISSUE_NAME]);
    }

    #[tokio::test]
    async fn test_unknown_project_is_an_error() {
        let (mut wf, _) = workflow(sample_cache(), Arc::new(FakeClient::new()));

        let err = wf
            .items("timesheet", "", &state(span("2024-01-01", "2024-01-02"), Some(2)))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown project 2");
    }
}

mod backfill {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_missing_issues_are_fetched_before_aggregating() {
        let a = project(1, "Alpha");
        let cache = fresh_cache(
            vec![],
            vec![a.clone()],
            vec![time_entry(1, &a, Some(30), "2024-01-01", 1.0)],
        );
        let client = Arc::new(FakeClient::new().with_remote_issue(issue(30, "Fetched", &a, 1)));
        let (mut wf, _) = workflow(cache, client.clone());

        let items = wf
            .items("timesheet", "", &state(span("2024-01-01", "2024-01-01"), Some(1)))
            .await
            .unwrap();

        assert_eq!(titles(&items), vec!["Total: 1.00", "Fetched"]);
        assert_eq!(client.call_count("get_issue"), 1);
        assert!(wf.store.cache().issue(30).is_some());
    }

    #[tokio::test]
    async fn test_failed_fetch_aborts_listing() {
        let a = project(1, "Alpha");
        let cache = fresh_cache(
            vec![],
            vec![a.clone()],
            vec![time_entry(1, &a, Some(30), "2024-01-01", 1.0)],
        );
        let client = Arc::new(FakeClient::new().failing("get_issue"));
        let (mut wf, _) = workflow(cache, client);

        let result = wf
            .items("timesheet", "", &state(span("2024-01-01", "2024-01-01"), None))
            .await;

        assert!(result.is_err());
        assert!(wf.store.cache().issues.is_empty());
    }

    #[tokio::test]
    async fn test_issue_buckets_open_the_issue() {
        let (mut wf, opened) = workflow(sample_cache(), Arc::new(FakeClient::new()));

        let items = wf
            .items("timesheet", "x", &state(span("2024-01-01", "2024-01-02"), Some(1)))
            .await
            .unwrap();
        let arg = items[1].arg.clone().unwrap();
        assert!(matches!(Action::decode(&arg.data).unwrap(), Action::Open { .. }));

        wf.run(&arg.keyword, &arg.data).await.unwrap();
        assert_eq!(
            opened.lock().unwrap()[0],
            "https://redmine.example.com/issues/10"
        );
    }
}
