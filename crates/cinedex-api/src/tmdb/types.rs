//! TMDB API response types and search parameters.

use serde::Deserialize;

// --- Search Movie ---

/// Response from `search/movie` and `guest_session/{id}/rated/movies`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchMovieResponse {
    /// Current page number.
    pub page: u32,
    /// Search results.
    pub results: Vec<MovieSummary>,
    /// Total number of pages.
    pub total_pages: u32,
    /// Total number of results.
    pub total_results: u32,
}

impl SearchMovieResponse {
    /// An empty result page (used for 404 rated-movies responses).
    #[must_use]
    pub const fn empty(page: u32) -> Self {
        Self {
            page,
            results: Vec::new(),
            total_pages: 0,
            total_results: 0,
        }
    }
}

/// A single movie record as returned by search and rated-movies endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct MovieSummary {
    /// TMDB movie ID.
    pub id: u64,
    /// Localized title.
    pub title: String,
    /// Original title.
    pub original_title: String,
    /// Original language (ISO 639-1).
    pub original_language: String,
    /// Release date (YYYY-MM-DD or null).
    pub release_date: Option<String>,
    /// Overview text.
    pub overview: Option<String>,
    /// Popularity score.
    pub popularity: f64,
    /// Vote average (community, 0..=10).
    pub vote_average: f64,
    /// Vote count.
    pub vote_count: u32,
    /// Genre IDs.
    pub genre_ids: Vec<u32>,
    /// Adult flag.
    pub adult: bool,
    /// Video flag.
    pub video: bool,
    /// Poster image path.
    pub poster_path: Option<String>,
    /// Backdrop image path.
    pub backdrop_path: Option<String>,
    /// The guest session's own rating. Only present in rated-movies
    /// responses; plain search results leave it absent.
    #[serde(default)]
    pub rating: Option<f64>,
}

// --- Genres ---

/// Response from `genre/movie/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenreListResponse {
    /// Genre entries.
    pub genres: Vec<Genre>,
}

/// Genre entry.
#[derive(Debug, Clone, Deserialize)]
pub struct Genre {
    /// Genre ID.
    pub id: u32,
    /// Genre name.
    pub name: String,
}

// --- Guest Session ---

/// Response from `authentication/guest_session/new`.
#[derive(Debug, Clone, Deserialize)]
pub struct GuestSessionResponse {
    /// Success flag.
    pub success: bool,
    /// The issued guest session identifier.
    pub guest_session_id: String,
    /// Expiry timestamp string.
    pub expires_at: String,
}

// --- Rating ---

/// Response body for mutation endpoints such as `POST movie/{id}/rating`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    /// TMDB status code (1 = success).
    pub status_code: u32,
    /// Status message.
    pub status_message: String,
}

// --- Error Response ---

/// TMDB API error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbErrorResponse {
    /// TMDB error code.
    pub status_code: u32,
    /// Error message.
    pub status_message: String,
    /// Success flag (always false for errors).
    #[allow(dead_code)]
    pub success: bool,
}

// --- Search Parameters ---

/// Parameters for the `search/movie` endpoint.
#[derive(Debug, Clone)]
pub struct SearchMovieParams {
    /// Search query. May be empty; an empty query is still sent.
    pub query: String,
    /// Response language (default: "en-US").
    pub language: String,
    /// Result page (1-500, default: 1).
    pub page: u32,
    /// Filter by year.
    pub year: Option<u32>,
    /// Include adult content.
    pub include_adult: bool,
}

impl SearchMovieParams {
    /// Creates new search params with the given query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            language: String::from("en-US"),
            page: 1,
            year: None,
            include_adult: false,
        }
    }

    /// Sets the response language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets the result page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Sets the year filter.
    #[must_use]
    pub const fn year(mut self, year: u32) -> Self {
        self.year = Some(year);
        self
    }
}
