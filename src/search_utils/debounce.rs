use std::time::Duration;

use tokio::time::Instant;

use super::search_query::SearchQuery;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Owns the text of the search field and coalesces keystroke bursts.
///
/// Keystrokes are fed with [`SearchController::input`]; once no further input
/// arrived for the debounce window, [`SearchController::poll`] releases the
/// settled query exactly once. Settled values equal to the last emitted (or
/// seeded) query are swallowed here, so callers never need to dedupe. When
/// the search for that query failed, [`SearchController::forget_emitted`]
/// lets the same text through again.
#[derive(Debug)]
pub struct SearchController {
    delay: Duration,
    text: String,
    pending_since: Option<Instant>,
    last_emitted: Option<SearchQuery>,
}

impl SearchController {
    pub fn new(delay: Duration) -> Self {
        SearchController::with_initial("", delay)
    }

    /// Seeds the field from a persisted value (the url `query` parameter).
    /// Seeding never produces an emission: the initial fetch is the
    /// pagination controller's job.
    pub fn with_initial(initial: &str, delay: Duration) -> Self {
        let seeded = SearchQuery::from_user_input(initial);
        SearchController {
            delay,
            text: seeded.user_text().to_owned(),
            pending_since: None,
            last_emitted: Some(seeded),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Raw text currently in the field.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Last query handed out by `poll` (or the seed), unless forgotten.
    pub fn last_emitted(&self) -> Option<&SearchQuery> {
        self.last_emitted.as_ref()
    }

    /// Drops the dedupe baseline, so the next settle emits even when the
    /// text is unchanged.
    pub fn forget_emitted(&mut self) {
        if let Some(query) = self.last_emitted.take() {
            debug!("Forgetting emitted query '{}'", query);
        }
    }

    /// Records a keystroke; restarts the debounce window.
    pub fn input(&mut self, text: &str, now: Instant) {
        self.text = text.to_owned();
        self.pending_since = Some(now);
    }

    pub fn has_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    /// Moment the pending burst settles, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending_since.map(|since| since + self.delay)
    }

    /// Releases the settled query once the window elapsed.
    /// Returns `None` while still typing, when nothing is pending, or when
    /// the settled value is unchanged from the previous emission.
    pub fn poll(&mut self, now: Instant) -> Option<SearchQuery> {
        let deadline = self.deadline()?;
        if now < deadline {
            return None;
        }
        self.pending_since = None;

        let settled = SearchQuery::from_user_input(&self.text);
        if self.last_emitted.as_ref() == Some(&settled) {
            debug!("Search settled on unchanged query '{}', skipping", settled);
            return None;
        }
        info!("Search settled on '{}'", settled);
        self.last_emitted = Some(settled.clone());
        Some(settled)
    }
}

impl Default for SearchController {
    fn default() -> Self {
        SearchController::new(DEFAULT_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn burst_emits_only_final_value() {
        let start = Instant::now();
        let mut search = SearchController::new(ms(250));

        search.input("a", start);
        assert_eq!(search.poll(start + ms(100)), None);
        search.input("ap", start + ms(100));
        assert_eq!(search.poll(start + ms(200)), None);
        search.input("app", start + ms(200));
        assert_eq!(search.poll(start + ms(400)), None);

        let emitted = search.poll(start + ms(450)).unwrap();
        assert_eq!(emitted.user_text(), "app");
        assert_eq!(search.poll(start + ms(2000)), None);
    }

    #[test]
    fn window_is_measured_from_last_keystroke() {
        let start = Instant::now();
        let mut search = SearchController::new(ms(1000));
        search.input("r", start);
        search.input("re", start + ms(900));
        assert_eq!(search.deadline(), Some(start + ms(1900)));
        assert_eq!(search.poll(start + ms(1000)), None);
        assert!(search.poll(start + ms(1900)).is_some());
    }

    #[test]
    fn seeding_does_not_emit() {
        let start = Instant::now();
        let mut search = SearchController::with_initial("  hooks ", ms(250));
        assert_eq!(search.text(), "hooks");
        assert!(!search.has_pending());
        assert_eq!(search.poll(start + ms(10_000)), None);
        assert_eq!(search.last_emitted().map(SearchQuery::user_text), Some("hooks"));
    }

    #[test]
    fn unchanged_settled_value_is_swallowed() {
        let start = Instant::now();
        let mut search = SearchController::with_initial("hooks", ms(250));

        search.input("hooks ", start);
        assert_eq!(search.poll(start + ms(300)), None);
        assert!(!search.has_pending());

        search.input("hook", start + ms(400));
        search.input("hooks", start + ms(500));
        assert_eq!(search.poll(start + ms(800)), None);
    }

    #[test]
    fn forgotten_query_settles_again() {
        let start = Instant::now();
        let mut search = SearchController::with_initial("hooks", ms(250));
        search.forget_emitted();
        assert_eq!(search.last_emitted(), None);

        search.input("hook", start);
        search.input("hooks", start + ms(50));
        let emitted = search.poll(start + ms(300)).unwrap();
        assert_eq!(emitted.user_text(), "hooks");

        search.input("hooks", start + ms(400));
        assert_eq!(search.poll(start + ms(700)), None);
    }

    #[test]
    fn clearing_the_field_emits_base_query() {
        let start = Instant::now();
        let mut search = SearchController::with_initial("redux", ms(250));
        search.input("", start);
        let emitted = search.poll(start + ms(250)).unwrap();
        assert!(emitted.is_base_only());
    }
}
