//! API client library for cinedex.
//!
//! Provides a client for the TMDB v3 API: movie search, genre listing,
//! guest session creation, and rating submission.

/// TMDB API client.
pub mod tmdb;
