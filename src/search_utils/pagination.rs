//! Cursor based (relay style) paging over github search results.
//!
//! [`PaginationController`] owns the cursor, the displayed page and its own
//! loading flag. Every fetch it decides on is handed out as a [`FetchTicket`]
//! tagged with a monotonic id; results are fed back through
//! [`PaginationController::resolve`] and anything that is not the answer to
//! the latest ticket is dropped.

use std::fmt;

use crate::github_api_utils::search_repo_api_response::{RepositoryEdge, SearchPage};

use super::search_query::SearchQuery;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Opaque cursor token issued by the server. Never parsed, only echoed back.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Cursor(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Position of the displayed page. Only one side can ever be set; moving to
/// one side drops the other, which keeps the remote cache from merging pages
/// fetched with different variable shapes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageCursor {
    #[default]
    Start,
    After(Cursor),
    Before(Cursor),
}

impl PageCursor {
    pub fn after(&self) -> Option<&Cursor> {
        match self {
            PageCursor::After(cursor) => Some(cursor),
            _ => None,
        }
    }

    pub fn before(&self) -> Option<&Cursor> {
        match self {
            PageCursor::Before(cursor) => Some(cursor),
            _ => None,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            PageCursor::Before(_) => Direction::Backward,
            _ => Direction::Forward,
        }
    }
}

/// What to fetch next. Flattened to `{query, first, last, after, before}`
/// only when it reaches the graphql client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    Reset {
        query: SearchQuery,
        first: u32,
    },
    Forward {
        query: SearchQuery,
        after: Cursor,
        first: u32,
    },
    Backward {
        query: SearchQuery,
        before: Cursor,
        last: u32,
    },
}

impl PageRequest {
    pub fn query(&self) -> &SearchQuery {
        match self {
            PageRequest::Reset { query, .. }
            | PageRequest::Forward { query, .. }
            | PageRequest::Backward { query, .. } => query,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            PageRequest::Backward { .. } => Direction::Backward,
            _ => Direction::Forward,
        }
    }

    /// Cursor describing the page this request produces.
    pub fn page_cursor(&self) -> PageCursor {
        match self {
            PageRequest::Reset { .. } => PageCursor::Start,
            PageRequest::Forward { after, .. } => PageCursor::After(after.clone()),
            PageRequest::Backward { before, .. } => PageCursor::Before(before.clone()),
        }
    }
}

/// A fetch the caller must run and report back with the same `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub id: u64,
    pub request: PageRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationState {
    Idle,
    Loading(Direction),
    Error(String),
}

/// Outcome of feeding a fetch result back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The page is now displayed.
    Applied(PageRequest),
    /// The fetch failed; the previous page stays on screen.
    Failed(PageRequest),
    /// A newer fetch was issued meanwhile; the result was dropped.
    Stale,
}

#[derive(Debug)]
pub struct PaginationController {
    page_size: u32,
    query: SearchQuery,
    cursor: PageCursor,
    state: PaginationState,
    loading: bool,
    displayed: Option<SearchPage>,
    /// Query the displayed page was fetched for; differs from `query` after
    /// a failed search.
    displayed_query: Option<SearchQuery>,
    next_request_id: u64,
    in_flight: Option<FetchTicket>,
}

impl PaginationController {
    /// Creates the controller and the ticket for the first page. The
    /// controller starts out loading: there is no idle state before the
    /// first page arrives.
    pub fn mount(query: SearchQuery, cursor: PageCursor, page_size: u32) -> (Self, FetchTicket) {
        let mut pagination = PaginationController {
            page_size,
            query,
            cursor,
            state: PaginationState::Idle,
            loading: false,
            displayed: None,
            displayed_query: None,
            next_request_id: 0,
            in_flight: None,
        };
        let request = match pagination.cursor.clone() {
            PageCursor::Start => PageRequest::Reset {
                query: pagination.query.clone(),
                first: page_size,
            },
            PageCursor::After(after) => PageRequest::Forward {
                query: pagination.query.clone(),
                after,
                first: page_size,
            },
            PageCursor::Before(before) => PageRequest::Backward {
                query: pagination.query.clone(),
                before,
                last: page_size,
            },
        };
        let ticket = pagination.issue(request);
        (pagination, ticket)
    }

    fn issue(&mut self, request: PageRequest) -> FetchTicket {
        self.next_request_id += 1;
        let ticket = FetchTicket {
            id: self.next_request_id,
            request,
        };
        self.loading = true;
        self.state = PaginationState::Loading(ticket.request.direction());
        if let Some(previous) = self.in_flight.replace(ticket.clone()) {
            debug!(
                "Request {} supersedes in-flight request {}",
                ticket.id, previous.id
            );
        }
        debug!("Issuing request {}: {:?}", ticket.id, ticket.request);
        ticket
    }

    /// Advances to the page after the displayed one.
    /// No-op unless a next page exists and nothing is loading.
    pub fn next(&mut self) -> Option<FetchTicket> {
        if !self.can_go_next() {
            return None;
        }
        let after = self.current_page()?.page_info.end_cursor.clone()?;
        Some(self.issue(PageRequest::Forward {
            query: self.query.clone(),
            after,
            first: self.page_size,
        }))
    }

    /// Steps back to the page before the displayed one.
    /// No-op unless a previous page exists and nothing is loading.
    pub fn previous(&mut self) -> Option<FetchTicket> {
        if !self.can_go_previous() {
            return None;
        }
        let before = self.current_page()?.page_info.start_cursor.clone()?;
        Some(self.issue(PageRequest::Backward {
            query: self.query.clone(),
            before,
            last: self.page_size,
        }))
    }

    /// Starts over with a new query. Always accepted, even while loading:
    /// the in-flight fetch is superseded and its result will be dropped.
    pub fn search(&mut self, query: SearchQuery) -> FetchTicket {
        self.query = query;
        self.cursor = PageCursor::Start;
        self.issue(PageRequest::Reset {
            query: self.query.clone(),
            first: self.page_size,
        })
    }

    /// Feeds back the outcome of the fetch identified by `id`.
    pub fn resolve<E: fmt::Display>(&mut self, id: u64, outcome: Result<SearchPage, E>) -> Resolution {
        let ticket = match self.in_flight.take() {
            Some(ticket) if ticket.id == id => ticket,
            other => {
                warn!("Discarding stale result of request {}", id);
                self.in_flight = other;
                return Resolution::Stale;
            }
        };

        self.loading = false;
        match outcome {
            Ok(page) => {
                info!(
                    "Request {} returned {} repositories (next: {}, previous: {})",
                    id,
                    page.edges.len(),
                    page.page_info.has_next_page,
                    page.page_info.has_previous_page
                );
                self.cursor = ticket.request.page_cursor();
                self.displayed = Some(page);
                self.displayed_query = Some(ticket.request.query().clone());
                self.state = PaginationState::Idle;
                Resolution::Applied(ticket.request)
            }
            Err(err) => {
                error!("Request {} failed: {}", id, err);
                self.state = PaginationState::Error(err.to_string());
                Resolution::Failed(ticket.request)
            }
        }
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn displayed(&self) -> Option<&SearchPage> {
        self.displayed.as_ref()
    }

    pub fn rows(&self) -> &[RepositoryEdge] {
        self.displayed
            .as_ref()
            .map(|page| page.edges.as_slice())
            .unwrap_or_default()
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            PaginationState::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Displayed page, if it belongs to the current query. Its cursors are
    /// only ever sent back along with that query.
    fn current_page(&self) -> Option<&SearchPage> {
        self.displayed
            .as_ref()
            .filter(|_| self.displayed_query.as_ref() == Some(&self.query))
    }

    pub fn can_go_next(&self) -> bool {
        !self.loading
            && self.current_page().is_some_and(|page| {
                page.page_info.has_next_page && page.page_info.end_cursor.is_some()
            })
    }

    pub fn can_go_previous(&self) -> bool {
        !self.loading
            && self.current_page().is_some_and(|page| {
                page.page_info.has_previous_page && page.page_info.start_cursor.is_some()
            })
    }

    /// An empty page is a result, not an error; the two never show together.
    pub fn has_no_results(&self) -> bool {
        !self.loading
            && self.error().is_none()
            && self.displayed.as_ref().is_some_and(|page| page.edges.is_empty())
    }
}
