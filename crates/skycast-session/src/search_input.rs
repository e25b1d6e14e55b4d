//! Search input controller: keystroke debounce and keyboard navigation over
//! the result dropdown.
//!
//! Keystrokes are debounced on the trailing edge: each new input aborts the
//! pending emission and arms a fresh one, so a typing burst produces a single
//! search with the final text. The highlight cursor clamps at the list bounds
//! and never wraps.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::session::WeatherSession;

/// Trailing-edge debounce window for keystrokes.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Keys the dropdown reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKey {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
}

#[derive(Default)]
struct InputState {
    query: String,
    /// `None` means no row is highlighted.
    highlighted: Option<usize>,
    dropdown_open: bool,
    pending: Option<JoinHandle<()>>,
}

pub struct SearchInputController {
    session: Arc<WeatherSession>,
    debounce: Duration,
    input: Mutex<InputState>,
}

impl SearchInputController {
    pub fn new(session: Arc<WeatherSession>) -> Self {
        Self::with_debounce(session, SEARCH_DEBOUNCE)
    }

    pub fn with_debounce(session: Arc<WeatherSession>, debounce: Duration) -> Self {
        Self {
            session,
            debounce,
            input: Mutex::new(InputState::default()),
        }
    }

    /// The user edited the input field.
    ///
    /// Arms (or re-arms) the debounced search; blank text still goes through
    /// so the session clears its results.
    pub fn on_input(&self, text: &str) {
        let mut input = self.input.lock();
        input.query = text.to_string();
        input.highlighted = None;
        input.dropdown_open = !text.trim().is_empty();

        if let Some(pending) = input.pending.take() {
            pending.abort();
        }

        let session = Arc::clone(&self.session);
        let query = text.to_string();
        let delay = self.debounce;
        input.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            session.search_locations(&query).await;
        }));
    }

    /// A key event on the focused input.
    pub async fn on_key(&self, key: SearchKey) {
        match key {
            SearchKey::ArrowDown => self.move_highlight(1),
            SearchKey::ArrowUp => self.move_highlight(-1),
            SearchKey::Enter => self.select_highlighted().await,
            SearchKey::Escape => {
                // Close the dropdown but keep the typed text.
                self.input.lock().dropdown_open = false;
            }
        }
    }

    /// Focus resets the highlight; an open dropdown stays visible when text
    /// is present.
    pub fn on_focus(&self) {
        self.input.lock().highlighted = None;
    }

    /// Clicking outside the control closes the dropdown.
    pub fn on_blur(&self) {
        self.input.lock().dropdown_open = false;
    }

    pub fn query(&self) -> String {
        self.input.lock().query.clone()
    }

    pub fn highlighted_index(&self) -> Option<usize> {
        self.input.lock().highlighted
    }

    pub fn is_dropdown_open(&self) -> bool {
        self.input.lock().dropdown_open
    }

    fn move_highlight(&self, delta: isize) {
        let result_count = self.session.search_results().len();
        let mut input = self.input.lock();
        if !input.dropdown_open || result_count == 0 {
            return;
        }

        input.highlighted = match input.highlighted {
            None if delta > 0 => Some(0),
            None => None,
            Some(index) => {
                let next = index as isize + delta;
                Some(next.clamp(0, result_count as isize - 1) as usize)
            }
        };
    }

    async fn select_highlighted(&self) {
        let selected = {
            let input = self.input.lock();
            let results = self.session.search_results();
            input
                .highlighted
                .and_then(|index| results.get(index).cloned())
        };

        // Enter with nothing highlighted is a no-op.
        let Some(result) = selected else {
            return;
        };

        {
            let mut input = self.input.lock();
            input.query.clear();
            input.dropdown_open = false;
            input.highlighted = None;
            if let Some(pending) = input.pending.take() {
                pending.abort();
            }
        }

        self.session.select_location(&result).await;
    }
}

impl Drop for SearchInputController {
    fn drop(&mut self) {
        if let Some(pending) = self.input.lock().pending.take() {
            pending.abort();
        }
    }
}
