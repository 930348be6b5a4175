/// Data structures and traits for movie catalog retrieval.
///
/// This module provides the display-ready `MovieRecord`, the errors raised
/// while fetching and decoding catalog responses, and the `CatalogSource`
/// trait that the background loader drives.
mod fetcher;
mod mapper;
mod tmdb;
mod tmdb_types;

pub use fetcher::{CONNECT_TIMEOUT, FetchError, Fetcher, READ_TIMEOUT, fetch};
pub use mapper::{EntryError, MapError, decode_page, parse, poster_url};
pub use tmdb::TmdbCatalog;

use serde::Serialize;
use thiserror::Error;

/// Fixed prefix every poster URL is built from.
///
/// The relative `poster_path` of a catalog entry is appended verbatim, so a
/// path starting with `/` yields a double slash after `w185`.
pub const POSTER_BASE_URL: &str = "http://image.tmdb.org/t/p/w185/";

/// Errors that can occur while retrieving a page of the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The HTTP round trip failed
    #[error("Request failed: {0}")]
    Fetch(#[from] FetchError),

    /// The response body could not be decoded as a catalog page
    #[error("Failed to decode API response: {0}")]
    Decode(#[from] MapError),
}

/// A single movie, ready to be displayed in the grid.
///
/// Records are only built when title, rating and poster path were all
/// present in the catalog entry. They are never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MovieRecord {
    title: String,
    vote_average: String,
    poster_url: String,
}

impl MovieRecord {
    pub fn new(
        title: impl Into<String>,
        vote_average: impl Into<String>,
        poster_url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            vote_average: vote_average.into(),
            poster_url: poster_url.into(),
        }
    }

    /// The display name of the movie
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The rating exactly as the catalog rendered it (never parsed)
    pub fn vote_average(&self) -> &str {
        &self.vote_average
    }

    /// Fully-qualified URL of the poster thumbnail
    pub fn poster_url(&self) -> &str {
        &self.poster_url
    }
}

/// A catalog entry that was dropped while decoding a page.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedEntry {
    /// Position of the entry in the `results` array
    pub index: usize,
    /// Why the entry could not become a `MovieRecord`
    pub error: EntryError,
}

/// The decoded contents of one catalog page.
///
/// `records` keeps the order of the remote `results` array. Entries that
/// failed validation are listed in `rejected` for diagnostics only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieBatch {
    pub records: Vec<MovieRecord>,
    pub rejected: Vec<RejectedEntry>,
}

impl MovieBatch {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Trait for sources that can provide the list of popular movies.
///
/// Implementors are run on a background thread by the loader, so they must
/// be shareable across threads. The call itself is blocking.
pub trait CatalogSource: Send + Sync {
    /// Fetches and decodes the first page of popular movies.
    ///
    /// # Returns
    ///
    /// The decoded batch, or a `CatalogError` describing whether the
    /// network round trip or the decoding failed.
    fn fetch_popular(&self) -> Result<MovieBatch, CatalogError>;
}
