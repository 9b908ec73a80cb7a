//! Poster image URL construction.

use url::Url;

/// Placeholder shown when a record carries no poster path.
pub const POSTER_PLACEHOLDER: &str = "assets/poster-placeholder.jpg";

/// Builds a poster URL from the image base and a TMDB path fragment.
///
/// TMDB path fragments carry a leading slash (`/abc123.jpg`); joining that
/// onto the base directly would replace the base path, so the slash is
/// stripped first. A missing fragment or a join failure yields
/// [`POSTER_PLACEHOLDER`], never a malformed URL.
#[must_use]
pub fn poster_url(base: &Url, path: Option<&str>) -> String {
    path.map_or_else(
        || String::from(POSTER_PLACEHOLDER),
        |p| {
            base.join(p.trim_start_matches('/'))
                .map_or_else(|_| String::from(POSTER_PLACEHOLDER), |u| String::from(u))
        },
    )
}

/// Checks whether a URL's host is on the image-host allowlist.
#[must_use]
pub fn host_allowed(url: &Url, allowed_hosts: &[String]) -> bool {
    url.host_str()
        .is_some_and(|host| allowed_hosts.iter().any(|allowed| allowed == host))
}
