//! PosterWall - Show what the world is watching
//!
//! This library fetches the list of currently popular movies from The Movie
//! Database, turns the response into display-ready records and drives a
//! poster grid screen that degrades to an empty-state message whenever
//! anything goes wrong.

mod catalog;
mod config;
mod loader;
mod presentation;

use std::sync::Arc;

// Re-export error types
pub use catalog::{CatalogError, EntryError, FetchError, MapError};
pub use config::ConfigError;

// Re-export the pipeline
pub use catalog::{
    CONNECT_TIMEOUT, CatalogSource, Fetcher, MovieBatch, MovieRecord, POSTER_BASE_URL,
    READ_TIMEOUT, RejectedEntry, TmdbCatalog, decode_page, fetch, parse, poster_url,
};
pub use config::{
    API_BASE_VAR, API_KEY_VAR, CatalogConfig, DEFAULT_API_BASE, DEFAULT_LANGUAGE, LANGUAGE_VAR,
};
pub use loader::{EmptyReason, LoadOutcome, LoadState, LoadTicket, MovieLoader};
pub use presentation::{
    Connectivity, EmptyState, FixedConnectivity, MovieGrid, Screen, ScreenView, TcpProbe,
};

use thiserror::Error;

/// Progress event emitted while loading the popular movies
///
/// These events allow library users to report what is going on, or to
/// stay silent.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    /// Loading started against the given API base
    Started { api_base: String },

    /// A catalog entry was dropped during decoding
    EntryRejected { index: usize, reason: String },

    /// The page was fetched and decoded
    Fetched {
        record_count: usize,
        rejected_count: usize,
    },
}

/// Top-level error type for PosterWall operations
#[derive(Debug, Error)]
pub enum PosterWallError {
    /// Error in the configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error while retrieving the catalog
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Loads the first page of popular movies, reporting every failure.
///
/// Unlike the `Screen`, which collapses failures into an empty state, this
/// function surfaces the reason so command line users can diagnose it.
///
/// # Arguments
///
/// * `config` - Endpoint and credential to use
/// * `progress_callback` - Closure called with progress events
///
/// # Examples
///
/// ```no_run
/// use poster_wall::{CatalogConfig, LoadEvent, load_popular_movies};
///
/// let config = CatalogConfig::from_env().unwrap();
/// let batch = load_popular_movies(&config, |event| {
///     if let LoadEvent::EntryRejected { index, reason } = event {
///         eprintln!("skipped entry {}: {}", index, reason);
///     }
/// })
/// .unwrap();
///
/// for movie in &batch.records {
///     println!("{} ({})", movie.title(), movie.vote_average());
/// }
/// ```
pub fn load_popular_movies<F>(
    config: &CatalogConfig,
    mut progress_callback: F,
) -> Result<MovieBatch, PosterWallError>
where
    F: FnMut(LoadEvent),
{
    progress_callback(LoadEvent::Started {
        api_base: config.api_base.clone(),
    });

    let catalog = TmdbCatalog::new(config)?;
    let batch = catalog.fetch_popular()?;

    for rejected in &batch.rejected {
        progress_callback(LoadEvent::EntryRejected {
            index: rejected.index,
            reason: rejected.error.to_string(),
        });
    }

    progress_callback(LoadEvent::Fetched {
        record_count: batch.records.len(),
        rejected_count: batch.rejected.len(),
    });

    Ok(batch)
}

/// Builds a poster grid screen backed by the TMDB catalog.
pub fn open_catalog_screen(config: &CatalogConfig) -> Result<Screen, PosterWallError> {
    let catalog = TmdbCatalog::new(config)?;
    Ok(Screen::new(MovieLoader::new(Arc::new(catalog))))
}
