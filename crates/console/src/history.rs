//! Per-student attendance history, filtered and paged on the client.

use async_trait::async_trait;
use chrono::NaiveDate;
use schooldesk_core::models::RecordId;
use schooldesk_core::models::attendance::{HistoryEntry, HistoryOwner, weekday_name};
use schooldesk_core::models::page::ViewPage;
use schooldesk_store::RecordClient;
use tracing::{debug, warn};

use crate::pagination::{PageState, Refresh, RefreshOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Exact calendar date.
    Date(NaiveDate),
    /// English weekday name, compared case-insensitively.
    Weekday(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKey {
    Date,
    Weekday,
}

impl Filter {
    pub fn key(&self) -> FilterKey {
        match self {
            Filter::Date(_) => FilterKey::Date,
            Filter::Weekday(_) => FilterKey::Weekday,
        }
    }

    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        match self {
            Filter::Date(date) => entry.date == *date,
            Filter::Weekday(day) => weekday_name(entry.date).eq_ignore_ascii_case(day.trim()),
        }
    }

    /// Parses `YYYY-MM-DD` as a date filter and anything else as a weekday.
    pub fn parse(raw: &str) -> Self {
        match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
            Ok(date) => Filter::Date(date),
            Err(_) => Filter::Weekday(raw.trim().to_string()),
        }
    }
}

/// The whole history is fetched once; filters and paging are applied
/// locally, filter first and slice second.
pub struct HistoryController {
    client: RecordClient,
    user_id: RecordId,
    entries: Vec<HistoryEntry>,
    owner: Option<HistoryOwner>,
    filters: Vec<Filter>,
    state: PageState,
    last_error: Option<String>,
}

impl HistoryController {
    pub fn new(client: RecordClient, user_id: RecordId, page_size: usize) -> Self {
        Self {
            client,
            user_id,
            entries: Vec::new(),
            owner: None,
            filters: Vec::new(),
            state: PageState::new(page_size),
            last_error: None,
        }
    }

    pub fn owner(&self) -> Option<&HistoryOwner> {
        self.owner.as_ref()
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn page(&self) -> usize {
        self.state.page()
    }

    /// Replaces any filter with the same key and returns to the first page.
    pub fn set_filter(&mut self, filter: Filter) {
        self.filters.retain(|f| f.key() != filter.key());
        self.filters.push(filter);
        self.state.reset();
    }

    pub fn clear_filter(&mut self, key: FilterKey) {
        self.filters.retain(|f| f.key() != key);
        self.state.reset();
    }

    pub fn set_page(&mut self, page: usize) -> usize {
        let total = self.filtered().len() as u64;
        self.state.set_page(page, total)
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.state.set_page_size(page_size);
    }

    /// Number of entries passing every filter.
    pub fn count(&self) -> usize {
        self.filtered().len()
    }

    pub fn view_page(&self) -> ViewPage<HistoryEntry> {
        let rows = self.filtered().into_iter().cloned().collect();
        ViewPage::slice(rows, self.state.query())
    }

    pub async fn reload(&mut self) -> RefreshOutcome {
        match self.client.attendance_history(self.user_id).await {
            Ok(history) => {
                debug!(
                    user_id = self.user_id,
                    entries = history.attendance.len(),
                    "Loaded attendance history"
                );
                self.entries = history.attendance;
                self.owner = history.user;
                self.last_error = None;
                let total = self.count() as u64;
                let page = self.state.page();
                if self.state.set_page(page, total) != page {
                    return RefreshOutcome::Relocated {
                        page: self.state.page(),
                    };
                }
                RefreshOutcome::Applied
            }
            Err(e) => {
                warn!(user_id = self.user_id, error = %e, "Failed to load attendance history");
                self.last_error = Some(e.user_message());
                RefreshOutcome::Retained
            }
        }
    }

    fn filtered(&self) -> Vec<&HistoryEntry> {
        self.entries
            .iter()
            .filter(|entry| self.filters.iter().all(|f| f.matches(entry)))
            .collect()
    }
}

#[async_trait]
impl Refresh for HistoryController {
    async fn refresh(&mut self) -> RefreshOutcome {
        self.reload().await
    }
}
