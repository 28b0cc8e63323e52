//! Remote contact source abstraction.
//!
//! This module provides:
//! - `ContactSource` trait for anything that can serve a page of contacts
//! - `HttpContactSource` talking to the paginated JSON endpoint
//! - `FetchWorker` running requests off the UI thread
//! - Request/response types exchanged with the contact cache

pub mod http;
pub mod worker;

use reqwest::Url;

use crate::contact::Page;
use crate::error::FetchError;

/// Anything that can resolve a page URL to a page of contacts.
pub trait ContactSource: Send + Sync {
    fn fetch_page(&self, url: &str) -> Result<Page, FetchError>;
}

/// Whether a request replaces the accumulated data or appends to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Reset,
    Append,
}

/// A page request issued by the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Cache generation the request belongs to
    pub generation: u64,
    pub kind: FetchKind,
    pub url: String,
}

/// A completed request, routed back to the cache.
#[derive(Debug)]
pub struct FetchResponse {
    pub generation: u64,
    pub kind: FetchKind,
    pub result: Result<Page, FetchError>,
}

/// Run a request against a source synchronously.
pub fn execute(source: &dyn ContactSource, request: FetchRequest) -> FetchResponse {
    tracing::debug!(url = %request.url, kind = ?request.kind, generation = request.generation, "fetching page");
    let result = source.fetch_page(&request.url);
    match &result {
        Ok(page) => tracing::info!(
            url = %request.url,
            results = page.results.len(),
            has_next = page.next.is_some(),
            "page fetched"
        ),
        Err(err) => tracing::warn!(url = %request.url, error = %err, "page fetch failed"),
    }
    FetchResponse {
        generation: request.generation,
        kind: request.kind,
        result,
    }
}

/// URL of the first page for a search term.
///
/// An empty (or whitespace-only) term leaves the endpoint unchanged;
/// otherwise `search=<term>` is appended to the existing query string.
pub fn first_page_url(endpoint: &str, query: &str) -> Result<String, FetchError> {
    let mut url = Url::parse(endpoint).map_err(|err| FetchError::InvalidUrl {
        url: endpoint.to_string(),
        reason: err.to_string(),
    })?;
    if query.trim().is_empty() {
        return Ok(url.into());
    }
    url.query_pairs_mut().append_pair("search", query);
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENDPOINT: &str = "https://contact.example.test/api/contacts/?format=json";

    #[test]
    fn empty_query_uses_endpoint() {
        assert_eq!(first_page_url(ENDPOINT, "").unwrap(), ENDPOINT);
        assert_eq!(first_page_url(ENDPOINT, "   ").unwrap(), ENDPOINT);
    }

    #[test]
    fn query_is_appended_and_encoded() {
        assert_eq!(
            first_page_url(ENDPOINT, "abc").unwrap(),
            "https://contact.example.test/api/contacts/?format=json&search=abc"
        );
        assert_eq!(
            first_page_url(ENDPOINT, "a b&c").unwrap(),
            "https://contact.example.test/api/contacts/?format=json&search=a+b%26c"
        );
    }

    #[test]
    fn endpoint_without_query_gets_one() {
        assert_eq!(
            first_page_url("http://127.0.0.1:8080/contacts", "x").unwrap(),
            "http://127.0.0.1:8080/contacts?search=x"
        );
    }

    #[test]
    fn relative_endpoint_is_rejected() {
        assert!(matches!(
            first_page_url("/api/contacts", ""),
            Err(FetchError::InvalidUrl { .. })
        ));
    }
}
