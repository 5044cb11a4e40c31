//! Mirrors the search text and page cursor into the location query string,
//! so a search can be bookmarked, shared and restored on the next launch.
//!
//! Policy: a settled search writes `query` as a new history entry and drops
//! `page`; page navigation writes `page` replacing the current entry unless
//! configured to push.

use std::str::FromStr;

use url::Url;

use crate::github_api_utils::search_repo_api_response::SearchPage;

use super::pagination::{Cursor, PageCursor};

pub const QUERY_PARAM: &str = "query";
pub const PAGE_PARAM: &str = "page";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
    Push,
    #[default]
    Replace,
}

impl FromStr for HistoryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "push" => Ok(HistoryMode::Push),
            "replace" => Ok(HistoryMode::Replace),
            other => Err(format!("unknown history mode '{}'", other)),
        }
    }
}

/// State recovered from a location on mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialState {
    /// Trimmed user text, empty when absent.
    pub query: String,
    pub page_cursor: PageCursor,
}

/// Reads `query` and `page` from `location`. A present `page` seeds the
/// `before` side of the cursor; it only affects the initial fetch.
pub fn read_initial_state(location: &Url) -> InitialState {
    let mut query = String::new();
    let mut page_cursor = PageCursor::Start;
    for (key, value) in location.query_pairs() {
        match &*key {
            QUERY_PARAM => query = value.trim().to_owned(),
            PAGE_PARAM if !value.is_empty() => {
                page_cursor = PageCursor::Before(Cursor::new(value.into_owned()))
            }
            _ => {}
        }
    }
    InitialState { query, page_cursor }
}

/// Writes `query` and `page` onto the current location of `history`.
/// Empty or absent values remove the key; other parameters are kept.
pub fn write_state(history: &mut History, query: &str, page: Option<&Cursor>, mode: HistoryMode) {
    let mut location = history.current().clone();
    let kept: Vec<(String, String)> = location
        .query_pairs()
        .filter(|(key, _)| key != QUERY_PARAM && key != PAGE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut pairs = kept;
    let query = query.trim();
    if !query.is_empty() {
        pairs.push((QUERY_PARAM.to_owned(), query.to_owned()));
    }
    if let Some(page) = page.filter(|page| !page.as_str().is_empty()) {
        pairs.push((PAGE_PARAM.to_owned(), page.as_str().to_owned()));
    }

    if pairs.is_empty() {
        location.set_query(None);
    } else {
        location.query_pairs_mut().clear().extend_pairs(pairs);
    }

    match mode {
        HistoryMode::Push => history.push(location),
        HistoryMode::Replace => history.replace(location),
    }
}

/// Token written to `page` for the page displayed at `cursor`.
///
/// The token is read back as a `before` cursor. A backward page is
/// reproduced exactly by its own `before`; for the first page nothing is
/// written; for a forward page the displayed `endCursor` is the closest
/// `before` the server hands out.
pub fn page_token<'a>(cursor: &'a PageCursor, displayed: Option<&'a SearchPage>) -> Option<&'a Cursor> {
    match cursor {
        PageCursor::Start => None,
        PageCursor::Before(before) => Some(before),
        PageCursor::After(_) => displayed.and_then(|page| page.page_info.end_cursor.as_ref()),
    }
}

/// In-memory model of browser history: a list of locations and a position.
/// Pushing drops any entries ahead of the position.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Url>,
    index: usize,
}

impl History {
    pub fn new(initial: Url) -> Self {
        History {
            entries: vec![initial],
            index: 0,
        }
    }

    pub fn current(&self) -> &Url {
        &self.entries[self.index]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, location: Url) {
        debug!("history push {}", location);
        self.entries.truncate(self.index + 1);
        self.entries.push(location);
        self.index += 1;
    }

    pub fn replace(&mut self, location: Url) {
        debug!("history replace {}", location);
        self.entries[self.index] = location;
    }

    pub fn back(&mut self) -> Option<&Url> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    pub fn forward(&mut self) -> Option<&Url> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::page;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn reads_decoded_trimmed_query() {
        let state = read_initial_state(&url("http://localhost:3000/?query=%20%40tanstack%2Ftable%20"));
        assert_eq!(state.query, "@tanstack/table");
        assert_eq!(state.page_cursor, PageCursor::Start);
    }

    #[test]
    fn plus_decodes_to_space() {
        let state = read_initial_state(&url("http://localhost:3000/?query=react+table"));
        assert_eq!(state.query, "react table");
    }

    #[test]
    fn page_seeds_before_cursor() {
        let state = read_initial_state(&url("http://localhost:3000/?page=Y3Vyc29yOjEw"));
        assert_eq!(state.query, "");
        assert_eq!(state.page_cursor, PageCursor::Before(Cursor::new("Y3Vyc29yOjEw")));
    }

    #[test]
    fn empty_page_is_ignored() {
        let state = read_initial_state(&url("http://localhost:3000/?query=x&page="));
        assert_eq!(state.page_cursor, PageCursor::Start);
    }

    #[test]
    fn search_write_pushes_and_clears_page() {
        let mut history = History::new(url("http://localhost:3000/?page=abc"));
        write_state(&mut history, "hooks ui", None, HistoryMode::Push);

        assert_eq!(history.len(), 2);
        assert_eq!(history.current().as_str(), "http://localhost:3000/?query=hooks+ui");
        assert_eq!(history.back().map(Url::as_str), Some("http://localhost:3000/?page=abc"));
    }

    #[test]
    fn empty_values_remove_keys() {
        let mut history = History::new(url("http://localhost:3000/?query=old&page=abc"));
        write_state(&mut history, "  ", None, HistoryMode::Replace);
        assert_eq!(history.len(), 1);
        assert_eq!(history.current().as_str(), "http://localhost:3000/");
        assert_eq!(history.current().query(), None);
    }

    #[test]
    fn page_write_replaces_and_keeps_query() {
        let mut history = History::new(url("http://localhost:3000/?query=hooks"));
        write_state(&mut history, "hooks", Some(&Cursor::new("c/20=")), HistoryMode::Replace);

        assert_eq!(history.len(), 1);
        let state = read_initial_state(history.current());
        assert_eq!(state.query, "hooks");
        assert_eq!(state.page_cursor, PageCursor::Before(Cursor::new("c/20=")));
    }

    #[test]
    fn unrelated_params_survive() {
        let mut history = History::new(url("http://localhost:3000/?theme=dark"));
        write_state(&mut history, "x", None, HistoryMode::Push);
        assert_eq!(history.current().as_str(), "http://localhost:3000/?theme=dark&query=x");
    }

    #[test]
    fn push_after_back_drops_forward_entries() {
        let mut history = History::new(url("http://localhost:3000/"));
        history.push(url("http://localhost:3000/?query=a"));
        history.push(url("http://localhost:3000/?query=b"));
        history.back();
        history.push(url("http://localhost:3000/?query=c"));
        assert_eq!(history.len(), 3);
        assert!(history.forward().is_none());
    }

    #[test]
    fn page_token_by_cursor_side() {
        let displayed = page(&["a"], "s1", "e1", true, true);
        assert_eq!(page_token(&PageCursor::Start, Some(&displayed)), None);
        assert_eq!(
            page_token(&PageCursor::Before(Cursor::new("b")), Some(&displayed)),
            Some(&Cursor::new("b"))
        );
        assert_eq!(
            page_token(&PageCursor::After(Cursor::new("x")), Some(&displayed)),
            Some(&Cursor::new("e1"))
        );
    }

    #[test]
    fn history_mode_parses() {
        assert_eq!("PUSH".parse::<HistoryMode>(), Ok(HistoryMode::Push));
        assert_eq!("replace".parse::<HistoryMode>(), Ok(HistoryMode::Replace));
        assert!("sideways".parse::<HistoryMode>().is_err());
    }
}
