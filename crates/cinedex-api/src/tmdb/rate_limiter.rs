//! Request pacing for the TMDB API.

use std::time::{Duration, Instant};

/// Default request spacing (~40 req/s, the documented TMDB ceiling).
const DEFAULT_SPACING: Duration = Duration::from_millis(25);

/// Paces consecutive requests by enforcing a minimum gap between them.
///
/// The first request passes immediately; every later request sleeps for
/// whatever remains of the gap since the previous one.
#[derive(Debug)]
pub struct RequestPacer {
    /// Minimum gap between requests.
    spacing: Duration,
    /// When the previous request was released.
    released_at: Option<Instant>,
}

impl RequestPacer {
    /// Creates a pacer with the given minimum gap.
    pub(crate) const fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            released_at: None,
        }
    }

    /// Creates a pacer with the default gap (25ms).
    pub(crate) const fn default_spacing() -> Self {
        Self::new(DEFAULT_SPACING)
    }

    /// Waits until the next request may go out, then records the release.
    pub async fn pace(&mut self) {
        if let Some(previous) = self.released_at {
            let since = Instant::now().duration_since(previous);
            if since < self.spacing {
                tokio::time::sleep(self.spacing.saturating_sub(since)).await;
            }
        }

        self.released_at = Some(Instant::now());
    }
}
