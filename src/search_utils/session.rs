//! One search page view: wires the debounced search field, the pagination
//! state machine, url sync and the graphql client to a tokio event loop.

use std::{collections::HashMap, sync::Arc};

use tokio::{
    sync::mpsc,
    task::{self, JoinError, JoinSet},
    time::{sleep_until, Instant},
};
use url::Url;

use crate::config::Config;
use crate::github_api_utils::{
    fetch_error::FetchError, github_api_helper::RepositorySearch,
    search_repo_api_response::SearchPage,
};
use crate::render::SearchView;

use super::{
    debounce::SearchController,
    pagination::{FetchTicket, PageRequest, PaginationController, Resolution},
    search_query::SearchQuery,
    url_sync::{page_token, read_initial_state, write_state, History, HistoryMode},
};

/// Input coming from the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// New content of the search field.
    Input(String),
    Next,
    Previous,
    Quit,
}

pub type FetchOutcome = Result<SearchPage, FetchError>;

pub struct SearchSession<S> {
    client: Arc<S>,
    search: SearchController,
    pagination: PaginationController,
    history: History,
    page_history: HistoryMode,
    in_flight: JoinSet<FetchOutcome>,
    /// Request id of every task still in `in_flight`.
    requests: HashMap<task::Id, u64>,
}

impl<S: RepositorySearch + 'static> SearchSession<S> {
    /// Restores state from `location` and issues the first page fetch.
    /// Must be called from within a tokio runtime.
    pub fn mount(client: Arc<S>, config: &Config, location: Url) -> Self {
        let initial = read_initial_state(&location);
        info!(
            "Mounting search at {} (query '{}', cursor {:?})",
            location, initial.query, initial.page_cursor
        );
        let search = SearchController::with_initial(&initial.query, config.debounce);
        let (pagination, ticket) = PaginationController::mount(
            SearchQuery::from_user_input(&initial.query),
            initial.page_cursor,
            config.page_size,
        );
        let mut session = SearchSession {
            client,
            search,
            pagination,
            history: History::new(location),
            page_history: config.page_history,
            in_flight: JoinSet::new(),
            requests: HashMap::new(),
        };
        session.spawn(ticket);
        session
    }

    fn spawn(&mut self, ticket: FetchTicket) {
        let client = Arc::clone(&self.client);
        let id = ticket.id;
        let handle = self
            .in_flight
            .spawn(async move { client.search(&ticket.request).await });
        self.requests.insert(handle.id(), id);
    }

    /// Maps a finished task back to the request it ran.
    fn joined(&mut self, joined: Result<(task::Id, FetchOutcome), JoinError>) -> Option<(u64, FetchOutcome)> {
        match joined {
            Ok((task, outcome)) => Some((self.requests.remove(&task)?, outcome)),
            Err(err) => {
                error!("Search task failed: {}", err);
                let id = self.requests.remove(&err.id())?;
                Some((id, Err(FetchError::Task(err.to_string()))))
            }
        }
    }

    /// Applies a front end event. Returns `false` once the session should end.
    pub fn handle(&mut self, event: SessionEvent, now: Instant) -> bool {
        match event {
            SessionEvent::Input(text) => self.search.input(&text, now),
            SessionEvent::Next => match self.pagination.next() {
                Some(ticket) => self.spawn(ticket),
                None => debug!("Next ignored"),
            },
            SessionEvent::Previous => match self.pagination.previous() {
                Some(ticket) => self.spawn(ticket),
                None => debug!("Previous ignored"),
            },
            SessionEvent::Quit => return false,
        }
        true
    }

    /// Turns a settled search field into a new search. Returns whether a
    /// fetch was issued.
    pub fn settle(&mut self, now: Instant) -> bool {
        let Some(query) = self.search.poll(now) else {
            return false;
        };
        write_state(&mut self.history, query.user_text(), None, HistoryMode::Push);
        let ticket = self.pagination.search(query);
        self.spawn(ticket);
        true
    }

    /// Feeds a fetch result back and mirrors page moves into the url.
    /// A search that failed without leaving a page of its own can be
    /// retried by settling the same text again.
    pub fn apply(&mut self, id: u64, outcome: FetchOutcome) -> Resolution {
        let resolution = self.pagination.resolve(id, outcome);
        match &resolution {
            Resolution::Applied(PageRequest::Forward { .. } | PageRequest::Backward { .. }) => {
                let token = page_token(self.pagination.cursor(), self.pagination.displayed()).cloned();
                let query = self.pagination.query().user_text().to_owned();
                write_state(&mut self.history, &query, token.as_ref(), self.page_history);
            }
            Resolution::Failed(request)
                if matches!(request, PageRequest::Reset { .. })
                    || self.pagination.displayed().is_none() =>
            {
                self.search.forget_emitted();
            }
            _ => {}
        }
        resolution
    }

    /// Waits for the next fetch to finish and applies it.
    /// Returns `None` when nothing is in flight.
    pub async fn next_outcome(&mut self) -> Option<Resolution> {
        loop {
            let joined = self.in_flight.join_next_with_id().await?;
            if let Some((id, outcome)) = self.joined(joined) {
                return Some(self.apply(id, outcome));
            }
        }
    }

    /// Drives the session until `events` closes or a quit arrives, calling
    /// `on_change` after every state change.
    pub async fn run<F>(&mut self, mut events: mpsc::Receiver<SessionEvent>, mut on_change: F)
    where
        F: FnMut(&Self),
    {
        loop {
            let deadline = self.search.deadline();
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    if !self.handle(event, Instant::now()) {
                        break;
                    }
                    on_change(self);
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if self.settle(Instant::now()) {
                        on_change(self);
                    }
                }
                Some(joined) = self.in_flight.join_next_with_id(), if !self.in_flight.is_empty() => {
                    let Some((id, outcome)) = self.joined(joined) else { continue };
                    if self.apply(id, outcome) != Resolution::Stale {
                        on_change(self);
                    }
                }
            }
        }
        self.in_flight.abort_all();
        self.requests.clear();
    }

    pub fn view(&self) -> SearchView {
        SearchView::from_pagination(self.search.text(), &self.pagination)
    }

    pub fn pagination(&self) -> &PaginationController {
        &self.pagination
    }

    pub fn search_controller(&self) -> &SearchController {
        &self.search
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn location(&self) -> &Url {
        self.history.current()
    }
}
