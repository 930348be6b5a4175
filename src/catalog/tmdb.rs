/// The Movie Database catalog implementation.
use super::fetcher::Fetcher;
use super::mapper::decode_page;
use super::{CatalogError, CatalogSource, MovieBatch};
use crate::config::CatalogConfig;
use tracing::info;

/// Catalog source backed by the TMDB `/movie/popular` endpoint.
///
/// Always requests the first page only.
#[derive(Debug, Clone)]
pub struct TmdbCatalog {
    fetcher: Fetcher,
    url: String,
}

impl TmdbCatalog {
    /// Creates a catalog for the given configuration.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be constructed.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        Ok(Self {
            fetcher: Fetcher::new()?,
            url: config.popular_movies_url(),
        })
    }
}

impl CatalogSource for TmdbCatalog {
    fn fetch_popular(&self) -> Result<MovieBatch, CatalogError> {
        let body = self.fetcher.fetch(&self.url)?;
        let batch = decode_page(&body)?;

        info!(
            records = batch.records.len(),
            rejected = batch.rejected.len(),
            "decoded popular movies"
        );

        Ok(batch)
    }
}
