//! Plain-text rendering of the search page.
//!
//! [`SearchView`] is everything a front end needs to draw: the rows, which
//! navigation buttons are actionable and which message regions are visible.
//! Its `Display` impl is the terminal rendering used by the binary.

use std::fmt;

use crate::search_utils::pagination::PaginationController;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRow {
    pub key: String,
    pub name: String,
    pub url: String,
    pub stars: u64,
    pub forks: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchView {
    pub search_text: String,
    /// `None` until a page was displayed; the table is absent then.
    pub rows: Option<Vec<RepositoryRow>>,
    pub loading: bool,
    pub error: Option<String>,
    pub no_results: bool,
    pub next_enabled: bool,
    pub previous_enabled: bool,
}

impl SearchView {
    pub fn from_pagination(search_text: &str, pagination: &PaginationController) -> Self {
        let rows = pagination.displayed().map(|page| {
            page.edges
                .iter()
                .map(|edge| RepositoryRow {
                    key: edge.node.key().to_owned(),
                    name: edge.node.name.clone(),
                    url: edge.node.url.clone(),
                    stars: edge.node.stargazers_count(),
                    forks: edge.node.forks_count(),
                })
                .collect()
        });
        SearchView {
            search_text: search_text.to_owned(),
            rows,
            loading: pagination.is_loading(),
            error: pagination.error().map(str::to_owned),
            no_results: pagination.has_no_results(),
            next_enabled: pagination.can_go_next(),
            previous_enabled: pagination.can_go_previous(),
        }
    }
}

const NAME_HEADER: &str = "Name";
const STARS_HEADER: &str = "Stars";
const FORKS_HEADER: &str = "Forks";

fn button(label: &str, enabled: bool) -> String {
    if enabled {
        format!("[{}]", label)
    } else {
        format!("({})", label)
    }
}

impl fmt::Display for SearchView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Search: {}", self.search_text)?;

        if let Some(rows) = self.rows.as_ref().filter(|rows| !rows.is_empty()) {
            let names: Vec<String> = rows
                .iter()
                .map(|row| format!("{} <{}>", row.name, row.url))
                .collect();
            let name_width = names
                .iter()
                .map(|name| name.chars().count())
                .chain(std::iter::once(NAME_HEADER.len()))
                .max()
                .unwrap_or_default();
            let stars_width = rows
                .iter()
                .map(|row| row.stars.to_string().len())
                .chain(std::iter::once(STARS_HEADER.len()))
                .max()
                .unwrap_or_default();
            let forks_width = rows
                .iter()
                .map(|row| row.forks.to_string().len())
                .chain(std::iter::once(FORKS_HEADER.len()))
                .max()
                .unwrap_or_default();

            writeln!(
                f,
                "{:<nw$}  {:>sw$}  {:>fw$}",
                NAME_HEADER,
                STARS_HEADER,
                FORKS_HEADER,
                nw = name_width,
                sw = stars_width,
                fw = forks_width
            )?;
            for (row, name) in rows.iter().zip(&names) {
                writeln!(
                    f,
                    "{:<nw$}  {:>sw$}  {:>fw$}",
                    name,
                    row.stars,
                    row.forks,
                    nw = name_width,
                    sw = stars_width,
                    fw = forks_width
                )?;
            }
        }

        if self.loading {
            writeln!(f, "Loading")?;
        }
        if let Some(error) = &self.error {
            writeln!(f, "Error: {}", error)?;
        }
        if self.no_results {
            writeln!(f, "No results found")?;
        }
        write!(
            f,
            "{} {}",
            button("Back", self.previous_enabled),
            button("Next", self.next_enabled)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github_api_utils::search_repo_api_response::SearchPage;
    use crate::search_utils::{pagination::PageCursor, search_query::SearchQuery};
    use crate::testing::{page, repository};

    fn mounted(outcome: Result<SearchPage, &str>) -> PaginationController {
        let (mut pagination, ticket) =
            PaginationController::mount(SearchQuery::default(), PageCursor::Start, 10);
        pagination.resolve(ticket.id, outcome);
        pagination
    }

    #[test]
    fn renders_repository_row() {
        let mut displayed = page(&[], "s", "e", false, false);
        displayed.edges = vec![repository("React Repo 1", "http://example.com/repo1", 100, 50)];
        let view = SearchView::from_pagination("", &mounted(Ok(displayed)));

        let rows = view.rows.as_ref().unwrap();
        assert_eq!(rows[0].name, "React Repo 1");
        assert_eq!(rows[0].url, "http://example.com/repo1");
        assert_eq!(rows[0].key, "id-React Repo 1");

        let text = view.to_string();
        assert!(text.contains("React Repo 1 <http://example.com/repo1>"));
        assert!(text.contains("100"));
        assert!(text.contains("50"));
        assert!(!text.contains("Loading"));
        assert!(!text.contains("No results"));
    }

    #[test]
    fn loading_view_disables_buttons() {
        let (pagination, _) =
            PaginationController::mount(SearchQuery::default(), PageCursor::Start, 10);
        let view = SearchView::from_pagination("hooks", &pagination);
        assert!(view.loading);
        assert_eq!(view.rows, None);
        assert!(view.to_string().contains("Loading"));
        assert!(view.to_string().ends_with("(Back) (Next)"));
    }

    #[test]
    fn buttons_follow_page_info() {
        let view = SearchView::from_pagination("", &mounted(Ok(page(&["a"], "s", "e", true, false))));
        assert!(view.next_enabled);
        assert!(!view.previous_enabled);
        assert!(view.to_string().ends_with("(Back) [Next]"));
    }

    #[test]
    fn error_and_no_results_are_disjoint() {
        let failed = SearchView::from_pagination("", &mounted(Err("Network error")));
        assert_eq!(failed.error.as_deref(), Some("Network error"));
        assert!(!failed.no_results);
        assert_eq!(failed.rows, None);
        let text = failed.to_string();
        assert!(text.contains("Error: Network error"));
        assert!(!text.contains("No results"));
        assert!(!text.contains("Name"));

        let empty = SearchView::from_pagination("", &mounted(Ok(SearchPage::default())));
        assert!(empty.no_results);
        assert_eq!(empty.error, None);
        let text = empty.to_string();
        assert!(text.contains("No results found"));
        assert!(!text.contains("Error"));
    }
}
