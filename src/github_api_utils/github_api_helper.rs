use std::{future::Future, pin::Pin, sync::Arc};

use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};

use super::fetch_error::FetchError;
use super::search_repo_api_response::{GetRepoResponse, SearchPage};
use crate::config::Config;
use crate::search_utils::pagination::{Cursor, PageRequest};

pub const GITHUB_API_VERSION: &str = "2022-11-28";

pub const SEARCH_REPOSITORIES_QUERY: &str = "query SearchRepositories(
    $query: String!, $first: Int, $last: Int, $after: String, $before: String
) {
    search(query: $query, type: REPOSITORY, first: $first, last: $last, after: $after, before: $before) {
        edges {
            node {
                ... on Repository {
                    id
                    name
                    url
                    stargazers { totalCount }
                    forks { totalCount }
                }
            }
        }
        pageInfo {
            startCursor
            endCursor
            hasNextPage
            hasPreviousPage
        }
    }
}";

/// Boxed future returned by dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Flat variables of the search operation. Exactly one of `first + after`
/// or `last + before` is in use; the other pair is sent as explicit nulls.
#[derive(serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchVariables {
    pub query: String,
    pub first: Option<u32>,
    pub last: Option<u32>,
    pub after: Option<Cursor>,
    pub before: Option<Cursor>,
}

impl From<&PageRequest> for SearchVariables {
    fn from(request: &PageRequest) -> Self {
        let query = request.query().as_graphql_query();
        match request {
            PageRequest::Reset { first, .. } => SearchVariables {
                query,
                first: Some(*first),
                last: None,
                after: None,
                before: None,
            },
            PageRequest::Forward { after, first, .. } => SearchVariables {
                query,
                first: Some(*first),
                last: None,
                after: Some(after.clone()),
                before: None,
            },
            PageRequest::Backward { before, last, .. } => SearchVariables {
                query,
                first: None,
                last: Some(*last),
                after: None,
                before: Some(before.clone()),
            },
        }
    }
}

/// Executes repository searches. The session only talks to this trait, so
/// the transport can be swapped (tests use a scripted implementation).
pub trait RepositorySearch: Send + Sync {
    fn search<'a>(&'a self, request: &'a PageRequest) -> BoxFuture<'a, Result<SearchPage, FetchError>>;
}

/// Creates and sets standard github api request headers:
/// 1. **authorization**, bearer token from the configuration.
/// 2. **X-GitHub-Api-Version**, github api version.
/// 3. **user-agent**, from the configuration.
fn get_requests_headers(config: &Config) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = &config.api_key {
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| FetchError::Parse(format!("invalid api key header: {}", e)))?,
        );
    }
    headers.insert("x-github-api-version", HeaderValue::from_static(GITHUB_API_VERSION));
    headers.insert(
        "user-agent",
        HeaderValue::from_str(&config.user_agent)
            .map_err(|e| FetchError::Parse(format!("invalid user agent header: {}", e)))?,
    );
    Ok(headers)
}

fn header_i64(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers.get(name)?.to_str().ok()?.trim().parse::<i64>().ok()
}

/// Uses github response headers to detect exhausted rate limits:
/// returns the moment requests are accepted again, if we are limited.
/// Nothing is retried; the reset time only ends up in the error message.
fn rate_limit_reset(headers: &HeaderMap, status: StatusCode, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if status.is_success() {
        return None;
    }
    if header_i64(headers, "x-ratelimit-remaining") == Some(0) {
        let reset = header_i64(headers, "x-ratelimit-reset")?;
        return Utc.timestamp_opt(reset, 0).single();
    }
    // secondary rate limits, retry-after is in seconds
    let retry_after = header_i64(headers, "retry-after")?;
    Some(now + chrono::TimeDelta::try_seconds(retry_after)?)
}

/// Turns a decoded graphql body into a page, failing on any `errors[]`.
fn page_from_response(response: GetRepoResponse) -> Result<SearchPage, FetchError> {
    if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
        return Err(FetchError::GraphQl(
            errors.into_iter().map(|error| error.message).collect(),
        ));
    }
    response
        .data
        .map(|data| data.search)
        .ok_or_else(|| FetchError::Parse("response has neither data nor errors".to_owned()))
}

/// `reqwest`-backed implementation of [`RepositorySearch`] against
/// `https://api.github.com/graphql`.
#[derive(Debug, Clone)]
pub struct GithubGraphqlClient {
    http: Client,
    config: Arc<Config>,
}

impl GithubGraphqlClient {
    pub fn new(http: Client, config: Arc<Config>) -> Self {
        GithubGraphqlClient { http, config }
    }

    async fn post_search(&self, request: &PageRequest) -> Result<SearchPage, FetchError> {
        let variables = SearchVariables::from(request);
        debug!("POST {} with {:?}", self.config.graphql_url, variables);

        let response = self
            .http
            .post(self.config.graphql_url.as_str())
            .headers(get_requests_headers(&self.config)?)
            .json(&serde_json::json!({
                "query": SEARCH_REPOSITORIES_QUERY,
                "variables": variables,
            }))
            .send()
            .await?;

        let status = response.status();
        if let Some(reset) = rate_limit_reset(response.headers(), status, Utc::now()) {
            warn!("Rate limited until {}", reset);
            return Err(FetchError::RateLimited { reset });
        }

        let body = response.text().await?;
        if !status.is_success() {
            error!("Request failed: {}", status);
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        info!("Request successful: {}", status);

        let decoded: GetRepoResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))?;
        page_from_response(decoded)
    }
}

impl RepositorySearch for GithubGraphqlClient {
    fn search<'a>(&'a self, request: &'a PageRequest) -> BoxFuture<'a, Result<SearchPage, FetchError>> {
        Box::pin(self.post_search(request))
    }
}
