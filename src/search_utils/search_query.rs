use std::fmt;

/// Filter every search is scoped to.
pub const BASE_FILTER: &str = "topic:react";

/// Search string sent to the github `search` field.
/// Always starts with [`BASE_FILTER`]; the user part is kept trimmed so two
/// inputs differing only in surrounding whitespace compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SearchQuery {
    user_text: String,
}

impl SearchQuery {
    pub fn from_user_input(raw: &str) -> Self {
        SearchQuery {
            user_text: raw.trim().to_owned(),
        }
    }

    /// Trimmed text the user typed, empty when only the base filter applies.
    pub fn user_text(&self) -> &str {
        &self.user_text
    }

    pub fn is_base_only(&self) -> bool {
        self.user_text.is_empty()
    }

    /// Full query string as github expects it.
    pub fn as_graphql_query(&self) -> String {
        if self.user_text.is_empty() {
            BASE_FILTER.to_owned()
        } else {
            format!("{} {}", BASE_FILTER, self.user_text)
        }
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_graphql_query())
    }
}
