//! TMDB API client module.
//!
//! Handles HTTP requests to the TMDB v3 REST API: `search/movie`,
//! `genre/movie/list`, `authentication/guest_session/new`,
//! `guest_session/{id}/rated/movies`, and `movie/{id}/rating`.

mod api;
mod client;
mod genres;
mod images;
mod rate_limiter;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalTmdbApi, TmdbApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{TmdbClient, TmdbClientBuilder};
pub use genres::{GenreMap, UNKNOWN_GENRE};
pub use images::{POSTER_PLACEHOLDER, host_allowed, poster_url};
pub use types::{
    Genre, GenreListResponse, GuestSessionResponse, MovieSummary, SearchMovieParams,
    SearchMovieResponse, StatusResponse, TmdbErrorResponse,
};
