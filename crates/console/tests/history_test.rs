mod common;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rstest::rstest;
use schooldesk_console::history::{Filter, FilterKey, HistoryController};
use schooldesk_console::pagination::RefreshOutcome;
use schooldesk_core::errors::DeskError;
use schooldesk_store::mock::MockBackend;
use serde_json::{Value, json};

use common::client;

fn entry(id: u64, date: &str) -> Value {
    json!({
        "id": id,
        "date": format!("{}T00:00:00.000Z", date),
        "time": format!("{}T07:05:00.000Z", date),
        "method": "scan",
        "status": "present"
    })
}

/// 2024-05-01 is a Wednesday, 2024-05-06 and 2024-05-13 are Mondays.
fn history_backend() -> MockBackend {
    let mut backend = MockBackend::new();
    backend
        .expect_fetch()
        .withf(|path| path == "attendances/history/7")
        .returning(|_| {
            Ok(json!({
                "attendance": [
                    entry(1, "2024-05-01"),
                    entry(2, "2024-05-02"),
                    entry(3, "2024-05-06"),
                    entry(4, "2024-05-13"),
                ],
                "user": {"name": "Siti Aminah", "email": "siti@school.test"}
            }))
        });
    backend
}

fn ids(view: &HistoryController) -> Vec<u64> {
    view.view_page().rows.iter().map(|e| e.id).collect()
}

#[tokio::test]
async fn test_date_filter_keeps_matching_day() {
    let mut view = HistoryController::new(client(history_backend()), 7, 5);
    assert_eq!(view.reload().await, RefreshOutcome::Applied);

    view.set_filter(Filter::Date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()));

    assert_eq!(ids(&view), vec![1]);
    assert_eq!(view.count(), 1);
    assert_eq!(view.owner().map(|o| o.name.as_str()), Some("Siti Aminah"));
}

#[rstest]
#[case("Monday")]
#[case("monday")]
#[case("MONDAY")]
#[tokio::test]
async fn test_weekday_filter_ignores_case(#[case] day: &str) {
    let mut view = HistoryController::new(client(history_backend()), 7, 5);
    view.reload().await;

    view.set_filter(Filter::Weekday(day.to_string()));

    assert_eq!(ids(&view), vec![3, 4]);
}

#[tokio::test]
async fn test_filters_apply_before_paging() {
    let mut view = HistoryController::new(client(history_backend()), 7, 1);
    view.reload().await;
    view.set_page(3);
    assert_eq!(view.page(), 3);

    view.set_filter(Filter::parse("monday"));
    assert_eq!(view.page(), 0);
    assert_eq!(ids(&view), vec![3]);

    assert_eq!(view.set_page(5), 1);
    assert_eq!(ids(&view), vec![4]);
    assert_eq!(view.view_page().total, 2);
}

#[tokio::test]
async fn test_clearing_a_filter_restores_rows() {
    let mut view = HistoryController::new(client(history_backend()), 7, 10);
    view.reload().await;
    view.set_filter(Filter::parse("2024-05-02"));
    view.set_filter(Filter::parse("Thursday"));
    assert_eq!(ids(&view), vec![2]);

    view.clear_filter(FilterKey::Date);
    view.clear_filter(FilterKey::Weekday);

    assert_eq!(view.count(), 4);
    assert!(view.filters().is_empty());
}

#[test]
fn test_setting_a_filter_replaces_same_key() {
    let mut view = HistoryController::new(client(MockBackend::new()), 7, 5);
    view.set_filter(Filter::parse("Monday"));
    view.set_filter(Filter::parse("Friday"));

    assert_eq!(view.filters(), &[Filter::Weekday("Friday".to_string())]);
}

#[tokio::test]
async fn test_failed_history_load_is_retained() {
    let mut backend = MockBackend::new();
    backend.expect_fetch().times(1).returning(|_| {
        Err(DeskError::Rejected {
            status: 404,
            message: "User not found".into(),
        })
    });
    let mut view = HistoryController::new(client(backend), 7, 5);

    assert_eq!(view.reload().await, RefreshOutcome::Retained);
    assert_eq!(view.last_error(), Some("User not found"));
    assert_eq!(view.count(), 0);
}
