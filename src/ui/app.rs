use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::config::{Config, UiColors};
use crate::remote::worker::FetchWorker;
use crate::remote::FetchRequest;
use crate::view::ViewMode;

use super::board::TaskBoard;
use super::browser::{BrowserFocus, ContactBrowser};
use super::draw;
use super::panes::{HomeEntry, StatusTab};

const IDLE_POLL: Duration = Duration::from_millis(250);
const BUSY_POLL: Duration = Duration::from_millis(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Tasks,
    Contacts,
}

/// Navigation target. The last path segment of a contacts route selects
/// the view mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Tasks,
    Contacts(ViewMode),
}

impl Route {
    pub fn parse(path: &str) -> Self {
        let first = path
            .split('/')
            .find(|segment| !segment.is_empty())
            .map(|segment| segment.to_ascii_lowercase());
        match first.as_deref() {
            Some("tasks") => Route::Tasks,
            Some("contacts") => Route::Contacts(ViewMode::from_path(path)),
            _ => Route::Home,
        }
    }
}

pub struct App<'a> {
    config: &'a Config,
    worker: FetchWorker,
    pub screen: Screen,
    pub home_selected: usize,
    pub browser: Option<ContactBrowser>,
    pub board: TaskBoard,
    pub status: Option<String>,
    // Highest generation handed out by a closed browser
    last_generation: u64,
}

impl<'a> App<'a> {
    pub fn new(config: &'a Config, worker: FetchWorker) -> Self {
        Self {
            config,
            worker,
            screen: Screen::Home,
            home_selected: 0,
            browser: None,
            board: TaskBoard::default(),
            status: None,
            last_generation: 0,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        self.close_browser();
        result
    }

    fn event_loop<B>(&mut self, terminal: &mut Terminal<B>) -> Result<()>
    where
        B: ratatui::backend::Backend,
    {
        loop {
            draw::render(terminal, self)?;
            self.after_render();

            let timeout = self.poll_timeout(Instant::now());
            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if self.handle_key(key, Instant::now())? {
                            break;
                        }
                    }
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }

            self.pump(Instant::now());
        }
        Ok(())
    }

    pub fn navigate(&mut self, route: Route) {
        tracing::debug!(?route, "navigate");
        self.status = None;
        match route {
            Route::Home => {
                self.close_browser();
                self.screen = Screen::Home;
            }
            Route::Tasks => {
                self.close_browser();
                self.screen = Screen::Tasks;
            }
            Route::Contacts(mode) => {
                match self.browser.as_mut() {
                    Some(browser) => browser.set_mode(mode),
                    None => {
                        let mut browser = ContactBrowser::after_generation(
                            &self.config.endpoint,
                            self.config.debounce,
                            &self.config.country,
                            mode,
                            self.last_generation,
                        );
                        submit(&self.worker, browser.open());
                        self.browser = Some(browser);
                    }
                }
                self.screen = Screen::Contacts;
            }
        }
    }

    fn close_browser(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            browser.close();
            self.last_generation = browser.cache.generation();
        }
    }

    /// Fold finished fetches in and fire a due debounced search.
    pub fn pump(&mut self, now: Instant) {
        while let Some(response) = self.worker.try_recv() {
            match self.browser.as_mut() {
                Some(browser) => browser.apply(response),
                None => tracing::debug!(generation = response.generation, "response for closed view dropped"),
            }
        }
        if let Some(browser) = self.browser.as_mut() {
            submit(&self.worker, browser.tick(now));
        }
    }

    /// Pager check once the table has been laid out.
    fn after_render(&mut self) {
        if let Some(browser) = self.browser.as_mut() {
            submit(&self.worker, browser.check_scroll());
        }
    }

    fn poll_timeout(&self, now: Instant) -> Duration {
        let Some(browser) = self.browser.as_ref() else {
            return IDLE_POLL;
        };
        let base = if browser.cache.in_flight() { BUSY_POLL } else { IDLE_POLL };
        browser
            .query
            .time_until_deadline(now)
            .map_or(base, |left| left.min(base))
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Result<bool> {
        // Ctrl+C always quits
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return Ok(true);
        }

        match self.screen {
            Screen::Home => self.handle_home_key(key),
            Screen::Tasks => self.handle_tasks_key(key),
            Screen::Contacts => self.handle_browser_key(key, now),
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent) -> Result<bool> {
        let config = self.config;
        let keys = &config.keys.global;

        if key_matches_any(&key, &keys.quit) {
            return Ok(true);
        }
        let count = HomeEntry::ALL.len();
        if key_matches_any(&key, &keys.next) {
            self.home_selected = (self.home_selected + 1) % count;
            return Ok(false);
        }
        if key_matches_any(&key, &keys.prev) {
            self.home_selected = (self.home_selected + count - 1) % count;
            return Ok(false);
        }
        if key_matches_any(&key, &keys.confirm) {
            let entry = HomeEntry::ALL[self.home_selected];
            self.navigate(Route::parse(&entry.route()));
            return Ok(false);
        }
        if let KeyCode::Char(c) = key.code {
            if let Some(index) = c.to_digit(10).map(|d| d as usize) {
                if (1..=count).contains(&index) {
                    self.home_selected = index - 1;
                    self.navigate(Route::parse(&HomeEntry::ALL[index - 1].route()));
                }
            }
        }
        Ok(false)
    }

    fn handle_tasks_key(&mut self, key: KeyEvent) -> Result<bool> {
        let config = self.config;
        let keys = &config.keys.tasks;

        if key_matches_any(&key, &keys.back) {
            self.navigate(Route::Home);
            return Ok(false);
        }
        if key_matches_any(&key, &keys.next_field) || key_matches_any(&key, &keys.prev_field) {
            self.board.focus = self.board.focus.toggle();
            return Ok(false);
        }
        if key_matches_any(&key, &keys.submit) {
            match self.board.submit() {
                Ok(()) => self.set_status(format!("Added task #{}", self.board.list.len())),
                Err(message) => self.set_status(message),
            }
            return Ok(false);
        }
        for (bindings, tab) in [
            (&keys.show_all, StatusTab::All),
            (&keys.show_active, StatusTab::Active),
            (&keys.show_completed, StatusTab::Completed),
        ] {
            if key_matches_any(&key, bindings) {
                self.board.tab = tab;
                return Ok(false);
            }
        }

        self.board.focused_field_mut().handle_key_event(key);
        Ok(false)
    }

    fn handle_browser_key(&mut self, key: KeyEvent, now: Instant) -> Result<bool> {
        let config = self.config;
        let keys = &config.keys.browser;
        let global = &config.keys.global;

        let Some(browser) = self.browser.as_mut() else {
            self.screen = Screen::Home;
            return Ok(false);
        };

        // Nested detail dialog swallows everything but its close keys.
        if browser.detail.is_some() {
            if key_matches_any(&key, &keys.close)
                || key_matches_any(&key, &global.confirm)
                || matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
            {
                browser.close_detail();
            }
            return Ok(false);
        }

        if key_matches_any(&key, &keys.close) {
            self.navigate(Route::Home);
            return Ok(false);
        }
        if key_matches_any(&key, &keys.only_even) {
            browser.toggle_even();
            return Ok(false);
        }
        if key_matches_any(&key, &keys.view_all) {
            browser.set_mode(ViewMode::All);
            return Ok(false);
        }
        if key_matches_any(&key, &keys.view_us) {
            browser.set_mode(ViewMode::Us);
            return Ok(false);
        }
        if key_matches_any(&key, &keys.refresh) {
            submit(&self.worker, browser.refresh());
            return Ok(false);
        }

        match browser.focus {
            BrowserFocus::Search => {
                if key_matches_any(&key, &global.confirm) {
                    submit(&self.worker, browser.commit_search());
                } else if key_matches_any(&key, &keys.focus_results) {
                    browser.focus = BrowserFocus::Results;
                    if browser.table.selected().is_none() {
                        browser.move_selection(0);
                    }
                } else if browser.search.handle_key_event(key) {
                    browser.search_changed(now);
                }
            }
            BrowserFocus::Results => {
                if key_matches_any(&key, &global.quit) {
                    return Ok(true);
                }
                if key_matches_any(&key, &keys.focus_search) {
                    browser.focus = BrowserFocus::Search;
                } else if key_matches_any(&key, &global.next) {
                    browser.move_selection(1);
                } else if key_matches_any(&key, &global.prev) {
                    browser.move_selection(-1);
                } else if key_matches_any(&key, &keys.page_down) {
                    browser.page(1);
                } else if key_matches_any(&key, &keys.page_up) {
                    browser.page(-1);
                } else if key_matches_any(&key, &global.confirm) && !browser.open_detail() {
                    self.status = Some("No contact selected".to_string());
                }
            }
        }
        Ok(false)
    }

    fn set_status<S: Into<String>>(&mut self, message: S) {
        self.status = Some(message.into());
    }

    pub fn ui_colors(&self) -> &'a UiColors {
        &self.config.ui.colors
    }
}

fn submit(worker: &FetchWorker, request: Option<FetchRequest>) {
    if let Some(request) = request {
        worker.submit(request);
    }
}

/// Check if the key event matches any of the bindings in the list
pub fn key_matches_any(event: &KeyEvent, bindings: &[String]) -> bool {
    bindings.iter().any(|b| key_matches_single(event, b))
}

/// Check if the key event matches a single binding string
fn key_matches_single(event: &KeyEvent, binding: &str) -> bool {
    let trimmed = binding.trim();
    if trimmed.is_empty() {
        return false;
    }

    // Ctrl/Alt/Super combinations are never bound
    let disallowed = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER;
    if event.modifiers.intersects(disallowed) {
        return false;
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "enter" => matches!(event.code, KeyCode::Enter),
        "tab" => matches!(event.code, KeyCode::Tab),
        "backtab" | "shift+tab" => matches!(event.code, KeyCode::BackTab),
        "backspace" => matches!(event.code, KeyCode::Backspace),
        "esc" | "escape" => matches!(event.code, KeyCode::Esc),
        "space" => matches!(event.code, KeyCode::Char(' ')),
        "up" => matches!(event.code, KeyCode::Up),
        "down" => matches!(event.code, KeyCode::Down),
        "left" => matches!(event.code, KeyCode::Left),
        "right" => matches!(event.code, KeyCode::Right),
        "pageup" | "page_up" => matches!(event.code, KeyCode::PageUp),
        "pagedown" | "page_down" => matches!(event.code, KeyCode::PageDown),
        "home" => matches!(event.code, KeyCode::Home),
        "end" => matches!(event.code, KeyCode::End),
        name if name.len() > 1 && name.starts_with('f') => match name[1..].parse::<u8>() {
            Ok(n) if (1..=12).contains(&n) => matches!(event.code, KeyCode::F(k) if k == n),
            _ => false,
        },
        // Single character - case-sensitive (m != M, since M requires Shift)
        _ => {
            let mut chars = trimmed.chars();
            if let (Some(first), None) = (chars.next(), chars.next()) {
                matches!(event.code, KeyCode::Char(c) if c == first)
            } else {
                false
            }
        }
    }
}
