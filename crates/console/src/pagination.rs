//! Server-paged list views.
//!
//! A [`ListController`] owns the page, the page size and the rows last
//! fetched for one collection. Every state change issues a fresh fetch
//! through the [`RecordClient`]; responses are tagged with a generation so
//! only the answer to the latest request is applied.

use async_trait::async_trait;
use schooldesk_core::errors::DeskResult;
use schooldesk_core::models::page::{PageQuery, ViewPage, last_page_index};
use schooldesk_core::models::{ListScope, Record, RecordId};
use schooldesk_store::RecordClient;
use tracing::{debug, warn};

use crate::selection::SelectionLedger;

/// Page size used until the operator picks another one.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// What happened to the view after a fetch came back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New rows are displayed.
    Applied,
    /// The fetch failed and the previous rows are still displayed.
    Retained,
    /// A newer request was issued meanwhile; this response was dropped.
    Stale,
    /// The page fell past the end of the collection and was moved back.
    Relocated { page: usize },
}

/// Anything a mutation can ask to reload its rows.
#[async_trait]
pub trait Refresh: Send {
    async fn refresh(&mut self) -> RefreshOutcome;
}

/// Page index and size of a view, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    page: usize,
    page_size: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PageState {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Moves to `page`, clamped to the last page of `total` rows.
    pub fn set_page(&mut self, page: usize, total: u64) -> usize {
        self.page = page.min(last_page_index(total, self.page_size));
        self.page
    }

    /// Changes the page size and returns to the first page.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 0;
    }

    pub fn reset(&mut self) {
        self.page = 0;
    }

    pub fn query(&self) -> PageQuery {
        PageQuery::new(self.page, self.page_size)
    }
}

/// Identifies one issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub query: PageQuery,
}

pub struct ListController<T> {
    client: RecordClient,
    scope: ListScope,
    state: PageState,
    rows: Vec<T>,
    total: u64,
    generation: u64,
    selection: SelectionLedger<RecordId>,
    last_error: Option<String>,
}

impl<T: Record> ListController<T> {
    pub fn new(client: RecordClient, scope: ListScope, page_size: usize) -> Self {
        Self {
            client,
            scope,
            state: PageState::new(page_size),
            rows: Vec::new(),
            total: 0,
            generation: 0,
            selection: SelectionLedger::new(),
            last_error: None,
        }
    }

    pub fn scope(&self) -> ListScope {
        self.scope
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn page(&self) -> usize {
        self.state.page()
    }

    pub fn page_size(&self) -> usize {
        self.state.page_size()
    }

    pub fn last_page(&self) -> usize {
        last_page_index(self.total, self.state.page_size())
    }

    pub fn selection(&self) -> &SelectionLedger<RecordId> {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionLedger<RecordId> {
        &mut self.selection
    }

    /// Message of the most recent failed fetch, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Snapshot of what the view currently displays.
    pub fn view_page(&self) -> ViewPage<T> {
        ViewPage {
            rows: self.rows.clone(),
            total: self.total,
            page: self.state.page(),
            page_size: self.state.page_size(),
        }
    }

    /// Starts a fetch for the current state, superseding any in flight.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        FetchTicket {
            generation: self.generation,
            query: self.state.query(),
        }
    }

    /// Applies the response to `ticket` if it is still the latest fetch.
    pub fn apply(&mut self, ticket: FetchTicket, result: DeskResult<ViewPage<T>>) -> RefreshOutcome {
        if ticket.generation != self.generation {
            debug!(
                scope = %self.scope.path(),
                generation = ticket.generation,
                latest = self.generation,
                "Dropping stale page response"
            );
            return RefreshOutcome::Stale;
        }

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                warn!(scope = %self.scope.path(), error = %e, "Failed to fetch page, keeping previous rows");
                self.last_error = Some(e.user_message());
                return RefreshOutcome::Retained;
            }
        };

        self.last_error = None;
        self.total = page.total;
        if !page.is_in_range() {
            let page = self.state.set_page(page.page, page.total);
            debug!(scope = %self.scope.path(), page, "Page out of range, moving to last page");
            return RefreshOutcome::Relocated { page };
        }

        self.rows = page.rows;
        self.selection.sync_rows(self.rows.iter().map(Record::id));
        RefreshOutcome::Applied
    }

    /// Fetches the current page.
    ///
    /// When the collection shrank below the current page, the controller
    /// relocates to the new last page and fetches once more. If that fetch
    /// does not land, the page and total the displayed rows came from are
    /// put back.
    pub async fn reload(&mut self) -> RefreshOutcome {
        let (shown_state, shown_total) = (self.state, self.total);
        match self.fetch_once().await {
            RefreshOutcome::Relocated { page } => match self.fetch_once().await {
                RefreshOutcome::Applied => RefreshOutcome::Relocated { page },
                RefreshOutcome::Relocated { .. } => {
                    self.state = shown_state;
                    self.total = shown_total;
                    warn!(scope = %self.scope.path(), "Collection kept shrinking, keeping previous rows");
                    RefreshOutcome::Retained
                }
                other => {
                    self.state = shown_state;
                    self.total = shown_total;
                    other
                }
            },
            other => other,
        }
    }

    pub async fn set_page(&mut self, page: usize) -> RefreshOutcome {
        self.state.set_page(page, self.total);
        self.reload().await
    }

    pub async fn set_page_size(&mut self, page_size: usize) -> RefreshOutcome {
        self.state.set_page_size(page_size);
        self.reload().await
    }

    async fn fetch_once(&mut self) -> RefreshOutcome {
        let ticket = self.begin_fetch();
        debug!(
            scope = %self.scope.path(),
            page = ticket.query.page,
            limit = ticket.query.limit,
            "Fetching page"
        );
        let result = self.client.list::<T>(self.scope, ticket.query).await;
        self.apply(ticket, result)
    }
}

#[async_trait]
impl<T: Record> Refresh for ListController<T> {
    async fn refresh(&mut self) -> RefreshOutcome {
        self.reload().await
    }
}
