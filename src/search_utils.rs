pub mod debounce;
pub mod pagination;
pub mod search_query;
pub mod session;
pub mod url_sync;
