//! Fixtures and a scripted search backend for unit tests.
//!
//! Only available when compiled with `cfg(test)`.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::github_api_utils::{
    fetch_error::FetchError,
    github_api_helper::{BoxFuture, RepositorySearch},
    search_repo_api_response::{GithubPageInfo, Repository, RepositoryEdge, SearchPage, TotalCount},
};
use crate::search_utils::pagination::{Cursor, PageRequest};

pub fn repository(name: &str, url: &str, stars: u64, forks: u64) -> RepositoryEdge {
    RepositoryEdge {
        node: Repository {
            id: Some(format!("id-{}", name)),
            name: name.to_owned(),
            url: url.to_owned(),
            stargazers: TotalCount { total_count: stars },
            forks: TotalCount { total_count: forks },
        },
    }
}

pub fn edge(name: &str) -> RepositoryEdge {
    repository(name, &format!("https://github.com/example/{}", name), 1, 0)
}

pub fn page(names: &[&str], start: &str, end: &str, has_next: bool, has_previous: bool) -> SearchPage {
    SearchPage {
        edges: names.iter().map(|name| edge(name)).collect(),
        page_info: GithubPageInfo {
            start_cursor: Some(Cursor::new(start)),
            end_cursor: Some(Cursor::new(end)),
            has_next_page: has_next,
            has_previous_page: has_previous,
        },
    }
}

/// One canned answer: resolves after `delay` with `outcome`, or panics.
pub struct Scripted {
    pub delay: Duration,
    pub outcome: Result<SearchPage, String>,
    pub panics: bool,
}

impl Scripted {
    pub fn ok(page: SearchPage) -> Self {
        Scripted {
            delay: Duration::ZERO,
            outcome: Ok(page),
            panics: false,
        }
    }

    pub fn err(message: &str) -> Self {
        Scripted {
            delay: Duration::ZERO,
            outcome: Err(message.to_owned()),
            panics: false,
        }
    }

    pub fn panic() -> Self {
        Scripted {
            panics: true,
            ..Scripted::err("panicked")
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Answers searches from a queue, in call order, and records every request.
/// An exhausted queue answers with an empty page.
#[derive(Default)]
pub struct ScriptedSearch {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<PageRequest>>,
}

impl ScriptedSearch {
    pub fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(ScriptedSearch {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl RepositorySearch for ScriptedSearch {
    fn search<'a>(&'a self, request: &'a PageRequest) -> BoxFuture<'a, Result<SearchPage, FetchError>> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        Box::pin(async move {
            let Scripted { delay, outcome, panics } =
                next.unwrap_or_else(|| Scripted::ok(SearchPage::default()));
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if panics {
                panic!("scripted search panicked");
            }
            outcome.map_err(|message| FetchError::GraphQl(vec![message]))
        })
    }
}
