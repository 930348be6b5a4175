/// The Movie Database API response types for deserialization.
///
/// These structures mirror the JSON response format of the popular movies
/// endpoint. Fields of a single entry are kept loosely typed so that each
/// entry can be validated on its own without failing the whole page.
use serde::Deserialize;
use serde_json::Value;

/// The top-level response from the `/movie/popular` endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct PopularPage {
    /// One element per movie, in ranking order
    pub results: Vec<Value>,
}

/// A single entry of the `results` array.
///
/// `null` and an absent key both deserialize to `None`. The API sends
/// `poster_path: null` for movies without artwork.
#[derive(Debug, Deserialize)]
pub(super) struct TmdbMovie {
    /// Localized movie title
    pub title: Option<Value>,
    /// Average rating, usually a number such as `7.5`
    pub vote_average: Option<Value>,
    /// Poster path relative to the image service, e.g. `/abc123.jpg`
    pub poster_path: Option<Value>,
}
