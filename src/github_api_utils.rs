pub mod fetch_error;
pub mod github_api_helper;

pub mod search_repo_api_response {
    use crate::search_utils::pagination::Cursor;

    #[derive(serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TotalCount {
        #[serde(rename = "totalCount")]
        pub total_count: u64,
    }

    #[derive(serde::Deserialize, Debug, Clone, PartialEq, Eq)]
    pub struct Repository {
        /// Global node id, used as the row key when present.
        #[serde(default)]
        pub id: Option<String>,
        pub name: String,
        pub url: String,
        #[serde(default)]
        pub stargazers: TotalCount,
        #[serde(default)]
        pub forks: TotalCount,
    }

    impl Repository {
        pub fn stargazers_count(&self) -> u64 {
            self.stargazers.total_count
        }

        pub fn forks_count(&self) -> u64 {
            self.forks.total_count
        }

        /// Server id when available, the name otherwise.
        pub fn key(&self) -> &str {
            self.id.as_deref().unwrap_or(&self.name)
        }
    }

    #[derive(serde::Deserialize, Debug, Clone, PartialEq, Eq)]
    pub struct RepositoryEdge {
        pub node: Repository,
    }

    #[derive(serde::Deserialize, Debug, Clone, PartialEq, Eq, Default)]
    pub struct GithubPageInfo {
        #[serde(rename = "startCursor")]
        pub start_cursor: Option<Cursor>,
        #[serde(rename = "endCursor")]
        pub end_cursor: Option<Cursor>,
        #[serde(rename = "hasNextPage")]
        pub has_next_page: bool,
        #[serde(rename = "hasPreviousPage")]
        pub has_previous_page: bool,
    }

    /// One window of search results, replaced wholesale on every fetch.
    #[derive(serde::Deserialize, Debug, Clone, PartialEq, Eq, Default)]
    pub struct SearchPage {
        pub edges: Vec<RepositoryEdge>,
        #[serde(rename = "pageInfo")]
        pub page_info: GithubPageInfo,
    }

    #[derive(serde::Deserialize, Debug)]
    pub struct GraphqlError {
        pub message: String,
    }

    #[derive(serde::Deserialize, Debug)]
    pub struct ResponseData {
        pub search: SearchPage,
    }

    #[derive(serde::Deserialize, Debug)]
    pub struct GetRepoResponse {
        pub data: Option<ResponseData>,
        #[serde(default)]
        pub errors: Option<Vec<GraphqlError>>,
    }
}
