//! State of the contact modal: one cache, one query controller and the
//! table it drives. Owned by the app while the modal is open.

use std::time::{Duration, Instant};

use ratatui::widgets::TableState;
use tui_widgets::popup::PopupState;

use crate::cache::ContactCache;
use crate::contact::Contact;
use crate::pager::{self, ScrollMetrics};
use crate::query::QueryController;
use crate::remote::{FetchRequest, FetchResponse};
use crate::view::{visible_contacts, ViewMode};

use super::edit::TextField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserFocus {
    Search,
    Results,
}

pub struct ContactBrowser {
    pub cache: ContactCache,
    pub query: QueryController,
    pub search: TextField,
    pub focus: BrowserFocus,
    pub mode: ViewMode,
    pub only_even: bool,
    pub table: TableState,
    /// Table rows that fit the viewport, set during rendering
    pub viewport_rows: usize,
    pub detail: Option<Contact>,
    pub popup: PopupState,
    pub detail_popup: PopupState,
    country: String,
}

impl ContactBrowser {
    pub fn new(endpoint: &str, debounce: Duration, country: &str, mode: ViewMode) -> Self {
        Self::after_generation(endpoint, debounce, country, mode, 0)
    }

    /// Browser for a re-opened modal; see `ContactCache::starting_at`.
    pub fn after_generation(
        endpoint: &str,
        debounce: Duration,
        country: &str,
        mode: ViewMode,
        generation: u64,
    ) -> Self {
        Self {
            cache: ContactCache::starting_at(endpoint, generation),
            query: QueryController::new(debounce),
            search: TextField::new("Search"),
            focus: BrowserFocus::Search,
            mode,
            only_even: false,
            table: TableState::default(),
            viewport_rows: 0,
            detail: None,
            popup: PopupState::default(),
            detail_popup: PopupState::default(),
            country: country.to_string(),
        }
    }

    /// Initial unfiltered load.
    pub fn open(&mut self) -> Option<FetchRequest> {
        self.cache.reset("")
    }

    /// Tear down: a pending search will never fire.
    pub fn close(&mut self) {
        self.query.teardown();
    }

    pub fn visible(&self) -> Vec<&Contact> {
        visible_contacts(self.cache.contacts(), self.mode, self.only_even, &self.country)
    }

    pub fn visible_len(&self) -> usize {
        self.visible().len()
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        if self.mode != mode {
            self.mode = mode;
            self.clamp_selection();
        }
    }

    pub fn toggle_even(&mut self) {
        self.only_even = !self.only_even;
        self.clamp_selection();
    }

    /// Record the search field's current value as a keystroke.
    pub fn search_changed(&mut self, now: Instant) {
        self.query.input(self.search.value(), now);
    }

    /// Explicit commit (Enter).
    pub fn commit_search(&mut self) -> Option<FetchRequest> {
        let query = self.query.commit()?;
        self.start_query(&query)
    }

    /// Fire the debounced search if its quiet period is over.
    pub fn tick(&mut self, now: Instant) -> Option<FetchRequest> {
        let query = self.query.poll(now)?;
        self.start_query(&query)
    }

    /// Re-run the committed query from the first page.
    pub fn refresh(&mut self) -> Option<FetchRequest> {
        let query = self.cache.committed_query().to_string();
        self.start_query(&query)
    }

    fn start_query(&mut self, query: &str) -> Option<FetchRequest> {
        self.table = TableState::default();
        self.cache.reset(query)
    }

    pub fn apply(&mut self, response: FetchResponse) {
        if self.cache.apply(response) {
            self.clamp_selection();
        }
    }

    /// Pager check against the last rendered viewport.
    pub fn check_scroll(&mut self) -> Option<FetchRequest> {
        if self.viewport_rows == 0 || self.cache.is_loading() {
            return None;
        }
        let metrics =
            ScrollMetrics::for_table(self.table.offset(), self.viewport_rows, self.visible_len());
        pager::on_scroll(&mut self.cache, metrics)
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.visible_len();
        if len == 0 {
            self.table.select(None);
            return;
        }
        let next = match self.table.selected() {
            None => 0,
            Some(current) => (current as isize + delta).clamp(0, len as isize - 1) as usize,
        };
        self.table.select(Some(next));
    }

    pub fn page(&mut self, direction: isize) {
        let step = self.viewport_rows.max(1) as isize;
        self.move_selection(direction * step);
    }

    pub fn selected_contact(&self) -> Option<&Contact> {
        let index = self.table.selected()?;
        self.visible().get(index).copied()
    }

    pub fn open_detail(&mut self) -> bool {
        match self.selected_contact().cloned() {
            Some(contact) => {
                self.detail_popup = PopupState::default();
                self.detail = Some(contact);
                true
            }
            None => false,
        }
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_len();
        match self.table.selected() {
            _ if len == 0 => self.table.select(None),
            Some(index) if index >= len => self.table.select(Some(len - 1)),
            None if self.focus == BrowserFocus::Results => self.table.select(Some(0)),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::Page;
    use crate::remote::FetchKind;

    const ENDPOINT: &str = "https://contact.example.test/api/contacts/?format=json";

    fn browser() -> ContactBrowser {
        ContactBrowser::new(ENDPOINT, Duration::from_millis(500), "United States", ViewMode::All)
    }

    fn respond(browser: &mut ContactBrowser, request: &FetchRequest, results: Vec<Contact>, next: Option<&str>) {
        browser.apply(FetchResponse {
            generation: request.generation,
            kind: request.kind,
            result: Ok(Page {
                results,
                next: next.map(str::to_string),
            }),
        });
    }

    fn contacts(range: std::ops::RangeInclusive<i64>) -> Vec<Contact> {
        range
            .map(|i| {
                let country = if i % 3 == 0 { "Canada" } else { "United States" };
                Contact::new(i, format!("555-{:04}", i), country)
            })
            .collect()
    }

    #[test]
    fn short_page_triggers_next_page_after_render() {
        let mut b = browser();
        let first = b.open().unwrap();
        respond(&mut b, &first, contacts(1..=3), Some("https://next.test/2"));

        // Nothing rendered yet.
        assert!(b.check_scroll().is_none());

        b.viewport_rows = 10;
        let more = b.check_scroll().unwrap();
        assert_eq!(more.kind, FetchKind::Append);
        assert!(b.check_scroll().is_none());

        respond(&mut b, &more, contacts(4..=6), None);
        assert_eq!(b.cache.contacts().len(), 6);
        assert!(b.check_scroll().is_none());
    }

    #[test]
    fn filled_viewport_waits_for_scroll() {
        let mut b = browser();
        let first = b.open().unwrap();
        respond(&mut b, &first, contacts(1..=30), Some("https://next.test/2"));
        b.viewport_rows = 10;
        assert!(b.check_scroll().is_none());

        *b.table.offset_mut() = 20;
        assert!(b.check_scroll().is_some());
    }

    #[test]
    fn debounced_search_resets_cache() {
        let start = Instant::now();
        let mut b = browser();
        let first = b.open().unwrap();
        respond(&mut b, &first, contacts(1..=5), None);

        b.search.set_value("55");
        b.search_changed(start);
        assert!(b.tick(start + Duration::from_millis(100)).is_none());

        let request = b.tick(start + Duration::from_millis(500)).unwrap();
        assert_eq!(request.kind, FetchKind::Reset);
        assert!(request.url.ends_with("&search=55"));
        assert!(b.cache.contacts().is_empty());
        assert!(b.cache.is_loading());
    }

    #[test]
    fn close_cancels_pending_search() {
        let start = Instant::now();
        let mut b = browser();
        b.open();
        b.search.set_value("abc");
        b.search_changed(start);
        b.close();
        assert!(b.tick(start + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn mode_and_even_toggle_do_not_refetch() {
        let mut b = browser();
        let first = b.open().unwrap();
        respond(&mut b, &first, contacts(1..=6), None);
        let generation = b.cache.generation();

        b.toggle_even();
        assert_eq!(b.visible_len(), 3);
        b.set_mode(ViewMode::Us);
        // Even positions 2, 4, 6 hold ids 2, 4, 6; id 6 is Canadian.
        assert_eq!(b.visible_len(), 2);
        assert_eq!(b.cache.generation(), generation);
    }

    #[test]
    fn selection_and_detail() {
        let mut b = browser();
        let first = b.open().unwrap();
        respond(&mut b, &first, contacts(1..=4), None);
        b.focus = BrowserFocus::Results;
        b.move_selection(1);
        b.move_selection(1);
        assert!(b.open_detail());
        assert_eq!(b.detail.as_ref().unwrap().id.to_string(), "2");
        b.close_detail();
        assert!(b.detail.is_none());

        b.move_selection(100);
        assert_eq!(b.table.selected(), Some(3));
        b.toggle_even();
        assert_eq!(b.table.selected(), Some(1));
    }

    #[test]
    fn failed_append_is_not_retried_until_refresh() {
        let mut b = browser();
        let first = b.open().unwrap();
        respond(&mut b, &first, contacts(1..=3), Some("https://next.test/2"));
        b.viewport_rows = 10;

        let mut issued = 0;
        for _ in 0..5 {
            if let Some(request) = b.check_scroll() {
                issued += 1;
                b.apply(FetchResponse {
                    generation: request.generation,
                    kind: request.kind,
                    result: Err(crate::error::FetchError::malformed("missing `next`")),
                });
            }
        }
        assert_eq!(issued, 1);
        assert_eq!(b.cache.contacts().len(), 3);
        assert!(b.cache.last_error().is_some());
        assert!(b.cache.is_stalled());

        let again = b.refresh().unwrap();
        assert_eq!(again.kind, FetchKind::Reset);
        respond(&mut b, &again, contacts(1..=3), Some("https://next.test/2"));
        assert!(b.cache.last_error().is_none());
        assert_eq!(b.check_scroll().map(|r| r.kind), Some(FetchKind::Append));
    }
}
