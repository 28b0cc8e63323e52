//! Scroll-triggered pagination.

use crate::cache::ContactCache;
use crate::remote::FetchRequest;

/// Position of a scrollable region, in rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollMetrics {
    pub offset: usize,
    pub visible: usize,
    pub total: usize,
}

impl ScrollMetrics {
    /// Metrics of a table viewport showing `rows` rows.
    ///
    /// Content shorter than the viewport still spans the whole viewport, so
    /// an unfilled table counts as scrolled to the bottom. The table widget
    /// may leave its offset past the last full page; that is clamped.
    pub fn for_table(offset: usize, viewport: usize, rows: usize) -> Self {
        let total = rows.max(viewport);
        Self {
            offset: offset.min(total - viewport),
            visible: viewport,
            total,
        }
    }

    pub fn at_bottom(&self) -> bool {
        self.offset + self.visible == self.total
    }
}

/// Ask the cache for the next page when the region is scrolled to the end.
///
/// Safe to call on every scroll event; the cache's in-flight flag keeps it
/// to one request at a time.
pub fn on_scroll(cache: &mut ContactCache, metrics: ScrollMetrics) -> Option<FetchRequest> {
    if cache.in_flight() || !metrics.at_bottom() {
        return None;
    }
    cache.load_more()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::{Contact, Page};
    use crate::remote::{FetchKind, FetchResponse};

    fn cache_with_cursor() -> ContactCache {
        let mut cache = ContactCache::new("https://contact.example.test/api/contacts/?format=json");
        let request = cache.reset("").unwrap();
        cache.apply(FetchResponse {
            generation: request.generation,
            kind: request.kind,
            result: Ok(Page {
                results: (1..=20).map(|i| Contact::new(i, "555", "Canada")).collect(),
                next: Some("https://next.test/2".to_string()),
            }),
        });
        cache
    }

    #[test]
    fn bottom_detection() {
        assert!(ScrollMetrics { offset: 80, visible: 20, total: 100 }.at_bottom());
        assert!(!ScrollMetrics { offset: 79, visible: 20, total: 100 }.at_bottom());
        assert!(ScrollMetrics::for_table(0, 20, 5).at_bottom());
        assert!(!ScrollMetrics::for_table(0, 20, 50).at_bottom());
        assert!(ScrollMetrics::for_table(45, 20, 50).at_bottom());
    }

    #[test]
    fn loads_next_page_at_bottom_only() {
        let mut cache = cache_with_cursor();
        assert!(on_scroll(&mut cache, ScrollMetrics::for_table(3, 10, 20)).is_none());

        let request = on_scroll(&mut cache, ScrollMetrics::for_table(10, 10, 20)).unwrap();
        assert_eq!(request.kind, FetchKind::Append);
        assert_eq!(request.url, "https://next.test/2");
    }

    #[test]
    fn repeated_scroll_events_issue_one_request() {
        let mut cache = cache_with_cursor();
        let bottom = ScrollMetrics::for_table(10, 10, 20);
        let issued = (0..5).filter_map(|_| on_scroll(&mut cache, bottom)).count();
        assert_eq!(issued, 1);
    }
}
