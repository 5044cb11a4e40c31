//! Searches github repositories tagged `react` through the graphql api and
//! drives a debounced, cursor paginated, url synchronized result view.

#[macro_use]
extern crate log;

pub mod config;
pub mod github_api_utils;
pub mod render;
pub mod search_utils;

#[cfg(test)]
pub(crate) mod testing;
