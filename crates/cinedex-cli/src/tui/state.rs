//! Browser state management.
//!
//! All state here has exactly one writer: the event loop. Network work is
//! described as [`Effect`] values the loop executes; results come back as
//! [`FetchOutcome`] messages. Search responses carry a generation counter
//! so a superseded request arriving late cannot overwrite fresher results.

use std::collections::HashMap;
use std::time::Instant;

use url::Url;

use cinedex_api::tmdb::{GenreMap, MovieSummary, SearchMovieResponse};

use super::debounce::{Debouncer, SEARCH_DEBOUNCE};

/// Fixed TMDB page size.
pub const PAGE_SIZE: u32 = 20;

/// Search term the grid is seeded with on first load.
const DEFAULT_SEARCH_TERM: &str = "a";

/// Identifies which tab is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveTab {
    /// Search results tab.
    Search,
    /// Rated movies tab.
    Rated,
}

/// Input mode for the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Normal navigation mode.
    Normal,
    /// Query text input mode.
    Query,
}

/// Search view lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPhase {
    /// A fetch is pending or in flight.
    Loading,
    /// Results (possibly zero) are displayed.
    Loaded,
    /// The last fetch failed.
    Failed(String),
}

/// Rated view lifecycle: `loading -> {loaded | empty | failed}`,
/// re-entering `loading` on any trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RatedPhase {
    /// The tab has not been activated yet.
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The session has rated movies; the list is displayed.
    Loaded,
    /// The session has not rated anything yet.
    Empty,
    /// The last fetch failed.
    Failed(String),
}

/// A search request snapshot (term and page travel together).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Search term. May be empty; an empty term still searches.
    pub term: String,
    /// Result page (1-based).
    pub page: u32,
}

/// Network work the event loop must execute.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Run a catalog search.
    Search {
        /// Query snapshot.
        query: SearchQuery,
        /// Generation tag echoed back by the outcome.
        generation: u64,
    },
    /// Fetch the rated-movies list.
    FetchRated {
        /// Guest session to fetch for.
        session_id: String,
    },
    /// Submit a rating.
    SubmitRating {
        /// Movie to rate.
        movie_id: u64,
        /// Guest session to rate under.
        session_id: String,
        /// Rating value (1.0..=10.0).
        value: f64,
    },
}

/// Result message a spawned fetch task sends back to the loop.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Search response (or error message).
    Search {
        /// Generation the request was issued under.
        generation: u64,
        /// Response or rendered error.
        result: Result<SearchMovieResponse, String>,
    },
    /// Rated-movies response (or error message).
    Rated {
        /// Response or rendered error.
        result: Result<SearchMovieResponse, String>,
    },
    /// Rating submission result.
    Rating {
        /// Movie that was rated.
        movie_id: u64,
        /// Submitted value.
        value: f64,
        /// Success or rendered error.
        result: Result<(), String>,
    },
}

/// State for the movie browser TUI.
#[derive(Debug)]
pub struct AppState {
    /// Current search term.
    pub term: String,
    /// Current result page (1-based).
    pub page: u32,
    /// Total results reported by the last search.
    pub total_results: u32,
    /// Current page of search results.
    pub movies: Vec<MovieSummary>,
    /// Search view lifecycle.
    pub search_phase: SearchPhase,
    /// Active tab.
    pub active_tab: ActiveTab,
    /// Current input mode.
    pub input_mode: InputMode,
    /// Rated movies list.
    pub rated: Vec<MovieSummary>,
    /// Rated view lifecycle.
    pub rated_phase: RatedPhase,
    /// Genre lookup table.
    pub genres: GenreMap,
    /// Guest session id; `None` disables rating.
    pub session: Option<String>,
    /// Ratings this session has submitted, keyed by movie id. Overlay
    /// only; the server remains authoritative.
    pub user_ratings: HashMap<u64, f64>,
    /// Poster image base URL.
    pub poster_base: Url,
    /// Cursor position in the visible list.
    pub cursor: usize,
    /// Generation of the most recently issued search.
    search_generation: u64,
    /// Pending-search holder.
    debouncer: Debouncer<SearchQuery>,
    /// Set when a successful rating should refresh the rated view.
    rated_refresh_pending: bool,
}

impl AppState {
    /// Creates the initial state and arms the seed search.
    #[must_use]
    pub fn new(
        genres: GenreMap,
        session: Option<String>,
        poster_base: Url,
        now: Instant,
    ) -> Self {
        let mut state = Self {
            term: String::from(DEFAULT_SEARCH_TERM),
            page: 1,
            total_results: 0,
            movies: Vec::new(),
            search_phase: SearchPhase::Loading,
            active_tab: ActiveTab::Search,
            input_mode: InputMode::Normal,
            rated: Vec::new(),
            rated_phase: RatedPhase::Idle,
            genres,
            session,
            user_ratings: HashMap::new(),
            poster_base,
            cursor: 0,
            search_generation: 0,
            debouncer: Debouncer::new(SEARCH_DEBOUNCE),
            rated_refresh_pending: false,
        };
        state.arm_search(now);
        state
    }

    /// Total page count derived from the fixed page size.
    #[must_use]
    pub const fn total_pages(&self) -> u32 {
        self.total_results.div_ceil(PAGE_SIZE)
    }

    /// The list shown by the active tab.
    #[must_use]
    pub fn visible_movies(&self) -> &[MovieSummary] {
        match self.active_tab {
            ActiveTab::Search => &self.movies,
            ActiveTab::Rated => &self.rated,
        }
    }

    /// The movie under the cursor, if any.
    #[must_use]
    pub fn selected_movie(&self) -> Option<&MovieSummary> {
        self.visible_movies().get(self.cursor)
    }

    /// Appends a character to the search term. Resets to page 1 and
    /// re-arms the debouncer.
    pub fn input_char(&mut self, ch: char, now: Instant) {
        self.term.push(ch);
        self.page = 1;
        self.arm_search(now);
    }

    /// Removes the last character from the search term. An emptied term
    /// still searches.
    pub fn backspace(&mut self, now: Instant) {
        self.term.pop();
        self.page = 1;
        self.arm_search(now);
    }

    /// Moves to the next result page (clamped).
    pub fn next_page(&mut self, now: Instant) {
        if self.page < self.total_pages() {
            self.page = self.page.saturating_add(1);
            self.arm_search(now);
        }
    }

    /// Moves to the previous result page (clamped).
    pub fn prev_page(&mut self, now: Instant) {
        if self.page > 1 {
            self.page = self.page.saturating_sub(1);
            self.arm_search(now);
        }
    }

    /// Holds the current query in the debouncer.
    fn arm_search(&mut self, now: Instant) {
        self.debouncer.arm(
            SearchQuery {
                term: self.term.clone(),
                page: self.page,
            },
            now,
        );
    }

    /// Fires the pending search once its quiet period has passed.
    ///
    /// Issues a new generation so responses from superseded requests can
    /// be recognized and discarded.
    pub fn poll_debounce(&mut self, now: Instant) -> Option<Effect> {
        let query = self.debouncer.take_due(now)?;
        self.search_generation = self.search_generation.saturating_add(1);
        self.search_phase = SearchPhase::Loading;
        Some(Effect::Search {
            query,
            generation: self.search_generation,
        })
    }

    /// Switches the active tab.
    ///
    /// Activating the Rated tab with a session triggers exactly one
    /// rated-items fetch; without a session the tab shows a notice and no
    /// request is made.
    pub fn activate_tab(&mut self, tab: ActiveTab) -> Option<Effect> {
        self.active_tab = tab;
        self.cursor = 0;

        if tab != ActiveTab::Rated {
            return None;
        }
        let session_id = self.session.clone()?;
        self.rated_phase = RatedPhase::Loading;
        self.rated_refresh_pending = false;
        Some(Effect::FetchRated { session_id })
    }

    /// Toggles between the two tabs.
    pub fn toggle_tab(&mut self) -> Option<Effect> {
        match self.active_tab {
            ActiveTab::Search => self.activate_tab(ActiveTab::Rated),
            ActiveTab::Rated => self.activate_tab(ActiveTab::Search),
        }
    }

    /// Submits a rating for the movie under the cursor.
    ///
    /// A missing session makes this a no-op: no effect, no network call.
    pub fn rate_selected(&mut self, value: f64) -> Option<Effect> {
        let session_id = self.session.clone()?;
        let movie_id = self.selected_movie()?.id;
        Some(Effect::SubmitRating {
            movie_id,
            session_id,
            value,
        })
    }

    /// Applies a fetch result. May yield a follow-up effect (a rated
    /// refresh after a successful rating while the tab is visible).
    pub fn apply_outcome(&mut self, outcome: FetchOutcome) -> Option<Effect> {
        match outcome {
            FetchOutcome::Search { generation, result } => {
                self.apply_search(generation, result);
                None
            }
            FetchOutcome::Rated { result } => {
                self.apply_rated(result);
                None
            }
            FetchOutcome::Rating {
                movie_id,
                value,
                result,
            } => self.apply_rating(movie_id, value, result),
        }
    }

    /// Applies a search response, discarding superseded generations.
    fn apply_search(&mut self, generation: u64, result: Result<SearchMovieResponse, String>) {
        if generation < self.search_generation {
            tracing::debug!(generation, "discarding stale search response");
            return;
        }
        match result {
            Ok(response) => {
                self.movies = response.results;
                self.total_results = response.total_results;
                self.search_phase = SearchPhase::Loaded;
                self.clamp_cursor();
            }
            Err(message) => {
                self.search_phase = SearchPhase::Failed(message);
            }
        }
    }

    /// Applies a rated-movies response. An empty page is the `Empty`
    /// state, never an error.
    fn apply_rated(&mut self, result: Result<SearchMovieResponse, String>) {
        match result {
            Ok(response) => {
                for movie in &response.results {
                    if let Some(rating) = movie.rating {
                        self.user_ratings.insert(movie.id, rating);
                    }
                }
                if response.results.is_empty() {
                    self.rated = Vec::new();
                    self.rated_phase = RatedPhase::Empty;
                } else {
                    self.rated = response.results;
                    self.rated_phase = RatedPhase::Loaded;
                }
                self.clamp_cursor();
            }
            Err(message) => {
                self.rated_phase = RatedPhase::Failed(message);
            }
        }
    }

    /// Applies a rating submission result. Failure is logged, not
    /// surfaced; success records the overlay value and refreshes the
    /// rated view (immediately when visible, otherwise on next
    /// activation).
    fn apply_rating(
        &mut self,
        movie_id: u64,
        value: f64,
        result: Result<(), String>,
    ) -> Option<Effect> {
        match result {
            Ok(()) => {
                self.user_ratings.insert(movie_id, value);
                self.rated_refresh_pending = true;
                if self.active_tab == ActiveTab::Rated {
                    let session_id = self.session.clone()?;
                    self.rated_phase = RatedPhase::Loading;
                    self.rated_refresh_pending = false;
                    return Some(Effect::FetchRated { session_id });
                }
                None
            }
            Err(message) => {
                tracing::warn!(movie_id, "rating submission failed: {message}");
                None
            }
        }
    }

    /// Whether a successful rating is waiting for the rated view to
    /// refresh.
    #[must_use]
    pub const fn rated_refresh_pending(&self) -> bool {
        self.rated_refresh_pending
    }

    /// Moves the cursor up in the visible list.
    pub const fn move_up(&mut self) {
        if self.cursor > 0 {
            self.cursor = self.cursor.saturating_sub(1);
        }
    }

    /// Moves the cursor down in the visible list.
    pub fn move_down(&mut self) {
        if self.cursor.saturating_add(1) < self.visible_movies().len() {
            self.cursor = self.cursor.saturating_add(1);
        }
    }

    /// Keeps the cursor inside the visible list after it changed.
    fn clamp_cursor(&mut self) {
        let len = self.visible_movies().len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
    }
}
