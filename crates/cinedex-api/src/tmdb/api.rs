//! `TmdbApi` trait definition.
#![allow(clippy::future_not_send)]

use anyhow::Result;

use super::types::{
    GenreListResponse, GuestSessionResponse, SearchMovieParams, SearchMovieResponse,
    StatusResponse,
};

/// TMDB API trait.
///
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(TmdbApi: Send)]
pub trait LocalTmdbApi {
    /// Searches for movies. An empty query is sent as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn search_movie(&self, params: &SearchMovieParams) -> Result<SearchMovieResponse>;

    /// Fetches the static genre id/name table.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn movie_genres(&self, language: &str) -> Result<GenreListResponse>;

    /// Creates a new anonymous guest session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn new_guest_session(&self) -> Result<GuestSessionResponse>;

    /// Fetches the movies rated under the given guest session.
    ///
    /// A session that has not rated anything yet answers HTTP 404; that is
    /// mapped to an empty result page, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn rated_movies(&self, session_id: &str, page: u32) -> Result<SearchMovieResponse>;

    /// Submits a rating (0.5..=10.0 in half steps) for a movie under the
    /// given guest session.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is out of range or not a half step, or
    /// if the HTTP request or JSON parsing fails.
    async fn rate_movie(
        &self,
        movie_id: u64,
        session_id: &str,
        value: f64,
    ) -> Result<StatusResponse>;
}
