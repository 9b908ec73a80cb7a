//! Genre id/name lookup table.

use std::collections::HashMap;

use super::types::GenreListResponse;

/// Label shown for genre ids missing from the table.
pub const UNKNOWN_GENRE: &str = "Unknown Genre";

/// Immutable genre id to name lookup, built once from `genre/movie/list`.
///
/// An empty map is a valid fallback when the genre fetch failed; every
/// lookup then answers [`UNKNOWN_GENRE`].
#[derive(Debug, Clone, Default)]
pub struct GenreMap {
    names: HashMap<u32, String>,
}

impl GenreMap {
    /// Returns the genre name for an id, or [`UNKNOWN_GENRE`].
    #[must_use]
    pub fn name_for(&self, id: u32) -> &str {
        self.names.get(&id).map_or(UNKNOWN_GENRE, String::as_str)
    }

    /// Returns labels for a list of genre ids, in input order.
    #[must_use]
    pub fn labels(&self, ids: &[u32]) -> Vec<&str> {
        ids.iter().map(|id| self.name_for(*id)).collect()
    }

    /// Number of known genres.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table is empty (genre fetch failed or not yet loaded).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl From<GenreListResponse> for GenreMap {
    fn from(response: GenreListResponse) -> Self {
        Self {
            names: response
                .genres
                .into_iter()
                .map(|g| (g.id, g.name))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::super::types::Genre;
    use super::*;

    fn make_map() -> GenreMap {
        GenreMap::from(GenreListResponse {
            genres: vec![
                Genre {
                    id: 28,
                    name: String::from("Action"),
                },
                Genre {
                    id: 878,
                    name: String::from("Science Fiction"),
                },
            ],
        })
    }

    #[test]
    fn test_known_genre() {
        // Arrange
        let map = make_map();

        // Act & Assert
        assert_eq!(map.name_for(28), "Action");
        assert_eq!(map.name_for(878), "Science Fiction");
    }

    #[test]
    fn test_unknown_genre_falls_back() {
        // Arrange
        let map = make_map();

        // Act & Assert
        assert_eq!(map.name_for(999_999), UNKNOWN_GENRE);
    }

    #[test]
    fn test_empty_map_falls_back() {
        // Arrange
        let map = GenreMap::default();

        // Act & Assert
        assert!(map.is_empty());
        assert_eq!(map.name_for(28), UNKNOWN_GENRE);
    }

    #[test]
    fn test_labels_preserve_order() {
        // Arrange
        let map = make_map();

        // Act
        let labels = map.labels(&[878, 999_999, 28]);

        // Assert
        assert_eq!(labels, vec!["Science Fiction", UNKNOWN_GENRE, "Action"]);
    }
}
