//! `TmdbClient` - TMDB API client implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::instrument;
use url::Url;

use super::api::LocalTmdbApi;
use super::rate_limiter::RequestPacer;
use super::types::{
    GenreListResponse, GuestSessionResponse, SearchMovieParams, SearchMovieResponse,
    StatusResponse, TmdbErrorResponse,
};

/// Default base URL for TMDB API v3.
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// Maximum number of retries for HTTP 429 responses.
const MAX_RETRIES: u32 = 3;

/// Backoff duration between retries.
const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Request body for `POST movie/{id}/rating`.
#[derive(Debug, Serialize)]
struct RatingBody {
    value: f64,
}

/// TMDB API client.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests.
    base_url: Url,
    /// Bearer API token.
    api_token: String,
    /// Request pacer.
    pacer: Arc<Mutex<RequestPacer>>,
}

/// Builder for `TmdbClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClientBuilder {
    base_url: Option<Url>,
    api_token: Option<String>,
    user_agent: Option<String>,
    min_interval: Option<Duration>,
}

impl TmdbClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            api_token: None,
            user_agent: None,
            min_interval: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the API bearer token (required).
    #[must_use]
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the minimum request interval (default: 25ms).
    #[must_use]
    pub const fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = Some(interval);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `api_token` is not set.
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<TmdbClient> {
        let api_token = self.api_token.context("api_token is required")?;
        let user_agent = self.user_agent.context("user_agent is required")?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            let result = Url::parse(DEFAULT_BASE_URL);
            result.context("invalid default base URL")?
        };

        let pacer = self
            .min_interval
            .map_or_else(RequestPacer::default_spacing, RequestPacer::new);

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(TmdbClient {
            http_client,
            base_url,
            api_token,
            pacer: Arc::new(Mutex::new(pacer)),
        })
    }
}

impl TmdbClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> TmdbClientBuilder {
        TmdbClientBuilder::new()
    }

    /// Sends a prepared request with rate limiting, retrying up to
    /// `MAX_RETRIES` times on HTTP 429. Returns the raw response for any
    /// other status.
    async fn send_with_retry(
        &self,
        builder: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<reqwest::Response> {
        self.pacer.lock().await.pace().await;

        let mut retries = 0u32;
        loop {
            let request = builder
                .try_clone()
                .with_context(|| format!("failed to clone request: {path}"))?
                .build()
                .with_context(|| format!("failed to build request: {path}"))?;

            tracing::debug!(url = %request.url(), "TMDB API request");

            let result = self.http_client.execute(request).await;
            let response = result.with_context(|| format!("request failed: {path}"))?;

            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                retries = retries.saturating_add(1);
                if retries > MAX_RETRIES {
                    bail!("TMDB API rate limit exceeded after {MAX_RETRIES} retries: {path}");
                }
                tracing::warn!(
                    retry = retries,
                    max_retries = MAX_RETRIES,
                    "TMDB API rate limited (429). Retrying..."
                );
                tokio::time::sleep(RETRY_BACKOFF.saturating_mul(retries)).await;
                self.pacer.lock().await.pace().await;
                continue;
            }

            return Ok(response);
        }
    }

    /// Decodes a response body, converting non-2xx statuses into errors
    /// carrying the TMDB error message when the body provides one.
    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        path: &str,
    ) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to read body>"));
            if let Ok(error_response) = serde_json::from_str::<TmdbErrorResponse>(&body) {
                bail!(
                    "TMDB API error (HTTP {}): code={}, message={}",
                    status,
                    error_response.status_code,
                    error_response.status_message,
                );
            }
            bail!("TMDB API error (HTTP {status}): {body}");
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read response body: {path}"))?;
        let raw_result: std::result::Result<T, _> = serde_json::from_str(&body);
        raw_result.with_context(|| format!("failed to decode JSON response: {path}"))
    }

    /// Sends a GET request with Bearer auth and query params.
    #[instrument(skip_all)]
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self
            .base_url
            .join(path)
            .with_context(|| format!("failed to join URL path: {path}"))?;

        let builder = self
            .http_client
            .get(url)
            .bearer_auth(&self.api_token)
            .query(query);

        let response = self.send_with_retry(builder, path).await?;
        Self::read_json(response, path).await
    }

    /// Sends a POST request with Bearer auth, query params, and JSON body.
    #[instrument(skip_all)]
    async fn post_json<T: serde::de::DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T> {
        let url = self
            .base_url
            .join(path)
            .with_context(|| format!("failed to join URL path: {path}"))?;

        let builder = self
            .http_client
            .post(url)
            .bearer_auth(&self.api_token)
            .query(query)
            .json(body);

        let response = self.send_with_retry(builder, path).await?;
        Self::read_json(response, path).await
    }
}

/// Validates a rating value: 0.5..=10.0 in half steps.
#[allow(clippy::arithmetic_side_effects)]
fn validate_rating(value: f64) -> Result<()> {
    let doubled = value * 2.0;
    if !(0.5..=10.0).contains(&value) || (doubled - doubled.round()).abs() > f64::EPSILON {
        bail!("rating value must be 0.5..=10.0 in steps of 0.5, got {value}");
    }
    Ok(())
}

impl LocalTmdbApi for TmdbClient {
    #[instrument(skip_all)]
    async fn search_movie(&self, params: &SearchMovieParams) -> Result<SearchMovieResponse> {
        let mut query: Vec<(&str, String)> = vec![
            ("query", params.query.clone()),
            ("language", params.language.clone()),
            ("page", params.page.to_string()),
            ("include_adult", params.include_adult.to_string()),
        ];
        if let Some(year) = params.year {
            query.push(("year", year.to_string()));
        }

        self.get_json("search/movie", &query).await
    }

    #[instrument(skip_all)]
    async fn movie_genres(&self, language: &str) -> Result<GenreListResponse> {
        let query = [("language", String::from(language))];
        self.get_json("genre/movie/list", &query).await
    }

    #[instrument(skip_all)]
    async fn new_guest_session(&self) -> Result<GuestSessionResponse> {
        self.get_json("authentication/guest_session/new", &[]).await
    }

    #[instrument(skip_all)]
    async fn rated_movies(&self, session_id: &str, page: u32) -> Result<SearchMovieResponse> {
        let path = format!("guest_session/{session_id}/rated/movies");
        let query = [("page", page.to_string())];

        let url = self
            .base_url
            .join(&path)
            .with_context(|| format!("failed to join URL path: {path}"))?;

        let builder = self
            .http_client
            .get(url)
            .bearer_auth(&self.api_token)
            .query(&query);

        let response = self.send_with_retry(builder, &path).await?;

        // A guest session with no ratings yet answers 404, not an empty page.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(session_id, "no rated movies for session (404)");
            return Ok(SearchMovieResponse::empty(page));
        }

        Self::read_json(response, &path).await
    }

    #[instrument(skip_all)]
    async fn rate_movie(
        &self,
        movie_id: u64,
        session_id: &str,
        value: f64,
    ) -> Result<StatusResponse> {
        validate_rating(value)?;

        let path = format!("movie/{movie_id}/rating");
        let query = [("guest_session_id", String::from(session_id))];
        let body = RatingBody { value };

        self.post_json(&path, &query, &body).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    fn test_client(mock_server: &wiremock::MockServer) -> TmdbClient {
        let base_url = format!("{}/3/", mock_server.uri());
        TmdbClient::builder()
            .base_url(base_url.parse().unwrap())
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .min_interval(Duration::from_millis(0))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_api_token() {
        // Arrange & Act
        let result = TmdbClient::builder().user_agent("test/0.0.0").build();

        // Assert
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("api_token is required")
        );
    }

    #[test]
    fn test_builder_requires_user_agent() {
        // Arrange & Act
        let result = TmdbClient::builder().api_token("test-token").build();

        // Assert
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("user_agent is required")
        );
    }

    #[test]
    fn test_builder_with_required_fields_succeeds() {
        // Arrange & Act
        let result = TmdbClient::builder()
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .build();

        // Assert
        assert!(result.is_ok());
    }

    #[test]
    fn test_builder_with_custom_base_url() {
        // Arrange
        let custom_url = Url::parse("http://localhost:8080/3/").unwrap();

        // Act
        let client = TmdbClient::builder()
            .base_url(custom_url.clone())
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Assert
        assert_eq!(client.base_url, custom_url);
    }

    #[test]
    fn test_parse_search_movie_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/search_movie_matrix.json");

        // Act
        let response: SearchMovieResponse = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(response.page, 1);
        assert_eq!(response.total_results, 43);
        assert!(!response.results.is_empty());
        let first = &response.results[0];
        assert_eq!(first.id, 603);
        assert_eq!(first.title, "The Matrix");
        assert!(first.rating.is_none());
    }

    #[test]
    fn test_parse_search_movie_null_poster() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/search_movie_matrix.json");

        // Act
        let response: SearchMovieResponse = serde_json::from_str(json).unwrap();

        // Assert: second fixture entry has a null poster_path
        assert!(response.results[1].poster_path.is_none());
    }

    #[test]
    fn test_parse_search_movie_empty_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/search_movie_empty.json");

        // Act
        let response: SearchMovieResponse = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(response.total_results, 0);
        assert!(response.results.is_empty());
    }

    #[test]
    fn test_parse_genre_list_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/genre_movie_list.json");

        // Act
        let response: GenreListResponse = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(response.genres.len(), 19);
        assert!(
            response
                .genres
                .iter()
                .any(|g| g.id == 878 && g.name == "Science Fiction")
        );
    }

    #[test]
    fn test_parse_guest_session_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/guest_session_new.json");

        // Act
        let response: GuestSessionResponse = serde_json::from_str(json).unwrap();

        // Assert
        assert!(response.success);
        assert_eq!(response.guest_session_id, "e25f1f4e5d0bc6a31ad0f53e48b1a0a7");
    }

    #[test]
    fn test_parse_rated_movies_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/rated_movies.json");

        // Act
        let response: SearchMovieResponse = serde_json::from_str(json).unwrap();

        // Assert: rated responses carry the session's own rating
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].rating, Some(9.0));
    }

    #[test]
    fn test_parse_error_response() {
        // Arrange
        let json = r#"{"status_code":7,"status_message":"Invalid API key: You must be granted a valid key.","success":false}"#;

        // Act
        let error: TmdbErrorResponse = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(error.status_code, 7);
        assert!(!error.success);
        assert!(error.status_message.contains("Invalid API key"));
    }

    #[test]
    fn test_validate_rating_accepts_half_steps() {
        // Arrange & Act & Assert
        assert!(validate_rating(0.5).is_ok());
        assert!(validate_rating(7.5).is_ok());
        assert!(validate_rating(10.0).is_ok());
    }

    #[test]
    fn test_validate_rating_rejects_out_of_range() {
        // Arrange & Act & Assert
        assert!(validate_rating(0.0).is_err());
        assert!(validate_rating(10.5).is_err());
        assert!(validate_rating(7.3).is_err());
    }

    #[tokio::test]
    async fn test_search_movie_via_http() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/search_movie_matrix.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/3/search/movie"))
            .and(wiremock::matchers::query_param("query", "matrix"))
            .and(wiremock::matchers::header_exists("Authorization"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let params = SearchMovieParams::new("matrix");

        // Act
        let response = client.search_movie(&params).await.unwrap();

        // Assert
        assert!(!response.results.is_empty());
        assert_eq!(response.results[0].title, "The Matrix");
    }

    #[tokio::test]
    async fn test_search_movie_empty_query_still_executes() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/search_movie_empty.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/3/search/movie"))
            .and(wiremock::matchers::query_param("query", ""))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let params = SearchMovieParams::new("");

        // Act
        let response = client.search_movie(&params).await.unwrap();

        // Assert
        assert_eq!(response.total_results, 0);
    }

    #[tokio::test]
    async fn test_movie_genres_via_http() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/genre_movie_list.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/3/genre/movie/list"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);

        // Act
        let response = client.movie_genres("en-US").await.unwrap();

        // Assert
        assert_eq!(response.genres.len(), 19);
    }

    #[tokio::test]
    async fn test_new_guest_session_via_http() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/guest_session_new.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path(
                "/3/authentication/guest_session/new",
            ))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);

        // Act
        let response = client.new_guest_session().await.unwrap();

        // Assert
        assert!(response.success);
        assert!(!response.guest_session_id.is_empty());
    }

    #[tokio::test]
    async fn test_rated_movies_via_http() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/rated_movies.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path(
                "/3/guest_session/abc123/rated/movies",
            ))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);

        // Act
        let response = client.rated_movies("abc123", 1).await.unwrap();

        // Assert
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].rating, Some(9.0));
    }

    #[tokio::test]
    async fn test_rated_movies_404_is_empty_not_error() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let error_body = r#"{"status_code":34,"status_message":"The resource you requested could not be found.","success":false}"#;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path(
                "/3/guest_session/fresh00/rated/movies",
            ))
            .respond_with(wiremock::ResponseTemplate::new(404).set_body_string(error_body))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);

        // Act
        let response = client.rated_movies("fresh00", 1).await.unwrap();

        // Assert
        assert!(response.results.is_empty());
        assert_eq!(response.total_results, 0);
    }

    #[tokio::test]
    async fn test_rate_movie_posts_value() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = r#"{"status_code":1,"status_message":"Success."}"#;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/3/movie/603/rating"))
            .and(wiremock::matchers::query_param("guest_session_id", "abc123"))
            .and(wiremock::matchers::body_json(serde_json::json!({"value": 8.5})))
            .respond_with(wiremock::ResponseTemplate::new(201).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);

        // Act
        let response = client.rate_movie(603, "abc123", 8.5).await.unwrap();

        // Assert
        assert_eq!(response.status_code, 1);
    }

    #[tokio::test]
    async fn test_rate_movie_rejects_invalid_value_without_request() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(201))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);

        // Act
        let result = client.rate_movie(603, "abc123", 11.0).await;

        // Assert: rejected locally, no request reaches the server
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("rating value"));
    }

    #[tokio::test]
    async fn test_bearer_token_is_sent() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/search_movie_empty.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::header(
                "Authorization",
                "Bearer my-secret-token",
            ))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let base_url = format!("{}/3/", mock_server.uri());
        let client = TmdbClient::builder()
            .base_url(base_url.parse().unwrap())
            .api_token("my-secret-token")
            .user_agent("test/0.0.0")
            .min_interval(Duration::from_millis(0))
            .build()
            .unwrap();

        let params = SearchMovieParams::new("test");

        // Act & Assert (mock expect(1) verifies Authorization header)
        client.search_movie(&params).await.unwrap();
    }

    #[tokio::test]
    async fn test_http_error_returns_tmdb_error() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let error_body = r#"{"status_code":7,"status_message":"Invalid API key: You must be granted a valid key.","success":false}"#;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(401).set_body_string(error_body))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let params = SearchMovieParams::new("test");

        // Act
        let result = client.search_movie(&params).await;

        // Assert
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("TMDB API error"));
        assert!(err.contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_http_429_retries() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let error_body = r#"{"status_code":25,"status_message":"Your request count is over the allowed limit.","success":false}"#;

        // Always answer 429: expect initial request plus MAX_RETRIES retries
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(429).set_body_string(error_body))
            .expect(u64::from(MAX_RETRIES) + 1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let params = SearchMovieParams::new("test");

        // Act
        let result = client.search_movie(&params).await;

        // Assert
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("rate limit"));
    }

    #[tokio::test]
    async fn test_rate_limiter_enforces_interval() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/search_movie_empty.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .expect(2)
            .mount(&mock_server)
            .await;

        let base_url = format!("{}/3/", mock_server.uri());
        let client = TmdbClient::builder()
            .base_url(base_url.parse().unwrap())
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .min_interval(Duration::from_millis(100))
            .build()
            .unwrap();

        let params = SearchMovieParams::new("test");

        // Act
        let start = std::time::Instant::now();
        client.search_movie(&params).await.unwrap();
        client.search_movie(&params).await.unwrap();
        let elapsed = start.elapsed();

        // Assert: at least 100ms interval between two requests
        assert!(elapsed >= Duration::from_millis(100));
    }
}
