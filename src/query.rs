//! Debounced search query controller.
//!
//! Keystrokes update the raw buffer and re-arm a single deadline. The
//! committed value changes when the deadline passes or on an explicit
//! commit. Time is passed in by the caller so the event loop owns the clock.

use std::time::{Duration, Instant};

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct QueryController {
    raw: String,
    committed: String,
    quiet: Duration,
    deadline: Option<Instant>,
    torn_down: bool,
}

impl QueryController {
    pub fn new(quiet: Duration) -> Self {
        Self {
            raw: String::new(),
            committed: String::new(),
            quiet,
            deadline: None,
            torn_down: false,
        }
    }

    pub fn committed(&self) -> &str {
        &self.committed
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Record a new raw value; replaces any pending deadline.
    pub fn input(&mut self, value: impl Into<String>, now: Instant) {
        if self.torn_down {
            return;
        }
        self.raw = value.into();
        self.deadline = Some(now + self.quiet);
    }

    /// Commit the current raw value immediately, cancelling the deadline.
    pub fn commit(&mut self) -> Option<String> {
        self.deadline = None;
        self.emit()
    }

    /// Emit the raw value if the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.emit()
            }
            _ => None,
        }
    }

    /// Time left before the pending deadline fires.
    pub fn time_until_deadline(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Drop any pending deadline; nothing is emitted afterwards.
    pub fn teardown(&mut self) {
        self.deadline = None;
        self.torn_down = true;
    }

    // An unchanged value does not start a new query session.
    fn emit(&mut self) -> Option<String> {
        if self.torn_down || self.raw == self.committed {
            return None;
        }
        self.committed = self.raw.clone();
        Some(self.committed.clone())
    }
}

impl Default for QueryController {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn rapid_input_emits_latest_once() {
        let start = Instant::now();
        let mut query = QueryController::default();
        let mut emitted = Vec::new();

        for (i, value) in ["a", "ab", "abc"].iter().enumerate() {
            let now = start + ms(100 * i as u64);
            query.input(*value, now);
            emitted.extend(query.poll(now));
        }
        // Still inside the quiet period of the last keystroke.
        emitted.extend(query.poll(start + ms(600)));
        assert!(emitted.is_empty());

        emitted.extend(query.poll(start + ms(700)));
        emitted.extend(query.poll(start + ms(2000)));
        assert_eq!(emitted, vec!["abc".to_string()]);
        assert_eq!(query.committed(), "abc");
    }

    #[test]
    fn commit_emits_immediately_and_cancels_timer() {
        let start = Instant::now();
        let mut query = QueryController::default();
        query.input("xyz", start);
        assert!(query.is_pending());

        assert_eq!(query.commit(), Some("xyz".to_string()));
        assert!(!query.is_pending());
        assert_eq!(query.poll(start + ms(1000)), None);
    }

    #[test]
    fn unchanged_value_is_not_reemitted() {
        let start = Instant::now();
        let mut query = QueryController::default();
        query.input("abc", start);
        assert_eq!(query.poll(start + ms(500)), Some("abc".to_string()));

        query.input("abc", start + ms(600));
        assert_eq!(query.poll(start + ms(1200)), None);
        assert_eq!(query.commit(), None);
    }

    #[test]
    fn clearing_the_input_emits_empty_query() {
        let start = Instant::now();
        let mut query = QueryController::default();
        query.input("a", start);
        query.commit();
        query.input("", start + ms(10));
        assert_eq!(query.poll(start + ms(510)), Some(String::new()));
    }

    #[test]
    fn teardown_suppresses_pending_emission() {
        let start = Instant::now();
        let mut query = QueryController::default();
        query.input("abc", start);
        query.teardown();
        assert_eq!(query.poll(start + ms(1000)), None);
        assert_eq!(query.commit(), None);
        query.input("late", start + ms(1100));
        assert!(!query.is_pending());
    }

    #[test]
    fn reports_time_until_deadline() {
        let start = Instant::now();
        let mut query = QueryController::new(ms(300));
        assert_eq!(query.time_until_deadline(start), None);
        query.input("a", start);
        assert_eq!(query.time_until_deadline(start + ms(100)), Some(ms(200)));
        assert_eq!(query.time_until_deadline(start + ms(400)), Some(Duration::ZERO));
    }
}
