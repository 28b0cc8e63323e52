//! Contact data cache.
//!
//! Accumulates pages for one query session. The cache never talks to the
//! network itself: `reset` and `load_more` hand back the request to run and
//! `apply` folds the finished response in. Every `reset` starts a new
//! generation so a response from a superseded session is dropped.

use crate::contact::{Contact, DedupIndex};
use crate::error::FetchError;
use crate::remote::{first_page_url, FetchKind, FetchRequest, FetchResponse};

#[derive(Debug)]
pub struct ContactCache {
    endpoint: String,
    contacts: Vec<Contact>,
    index: DedupIndex,
    loading: bool,
    in_flight: bool,
    next: Option<String>,
    committed: String,
    generation: u64,
    last_error: Option<FetchError>,
    // Set by a failed append; cleared only by `reset`
    stalled: bool,
}

impl ContactCache {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::starting_at(endpoint, 0)
    }

    /// A cache whose generations continue after `generation`, so responses
    /// still addressed to an earlier cache can never match this one.
    pub fn starting_at(endpoint: impl Into<String>, generation: u64) -> Self {
        Self {
            endpoint: endpoint.into(),
            contacts: Vec::new(),
            index: DedupIndex::default(),
            loading: false,
            in_flight: false,
            next: None,
            committed: String::new(),
            generation,
            last_error: None,
            stalled: false,
        }
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Visible loading indicator; only set while a reset is pending.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn next_cursor(&self) -> Option<&str> {
        self.next.as_deref()
    }

    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }

    pub fn committed_query(&self) -> &str {
        &self.committed
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    /// True after a failed append, until the next `reset`.
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Discard everything and request the first page for `query`.
    ///
    /// Returns `None` only when the endpoint cannot produce a valid URL; the
    /// failure is recorded in `last_error`.
    pub fn reset(&mut self, query: &str) -> Option<FetchRequest> {
        self.generation += 1;
        self.contacts.clear();
        self.index.clear();
        self.next = None;
        self.committed = query.to_string();
        self.last_error = None;
        self.stalled = false;

        match first_page_url(&self.endpoint, query) {
            Ok(url) => {
                self.loading = true;
                self.in_flight = true;
                tracing::debug!(query, generation = self.generation, "cache reset");
                Some(FetchRequest {
                    generation: self.generation,
                    kind: FetchKind::Reset,
                    url,
                })
            }
            Err(err) => {
                tracing::warn!(error = %err, "cannot build first page url");
                self.loading = false;
                self.in_flight = false;
                self.last_error = Some(err);
                None
            }
        }
    }

    /// Request the next page in the background.
    ///
    /// No-op when the cursor is exhausted, a request is already in flight or
    /// an earlier append failed.
    pub fn load_more(&mut self) -> Option<FetchRequest> {
        if self.in_flight || self.stalled {
            return None;
        }
        let url = self.next.clone()?;
        self.in_flight = true;
        Some(FetchRequest {
            generation: self.generation,
            kind: FetchKind::Append,
            url,
        })
    }

    /// Fold a completed request into the cache.
    ///
    /// Returns false when the response belongs to a superseded generation and
    /// was ignored.
    pub fn apply(&mut self, response: FetchResponse) -> bool {
        if response.generation != self.generation {
            tracing::debug!(
                stale = response.generation,
                current = self.generation,
                "discarding stale response"
            );
            return false;
        }

        self.in_flight = false;
        if response.kind == FetchKind::Reset {
            self.loading = false;
        }

        match response.result {
            Ok(page) => {
                if response.kind == FetchKind::Reset {
                    self.contacts.clear();
                    self.index.clear();
                }
                let exhausted = page.results.is_empty();
                let added = self.index.extend_unique(&mut self.contacts, page.results);
                self.next = if exhausted { None } else { page.next };
                self.last_error = None;
                tracing::debug!(
                    added,
                    total = self.contacts.len(),
                    has_next = self.next.is_some(),
                    "page applied"
                );
            }
            Err(err) => {
                tracing::warn!(error = %err, kind = ?response.kind, "keeping previous contacts");
                if response.kind == FetchKind::Append {
                    self.stalled = true;
                }
                self.last_error = Some(err);
            }
        }
        true
    }
}
