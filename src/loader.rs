//! Background loading of the popular movies list
//!
//! A load runs the blocking fetch-and-decode pipeline on a worker thread and
//! reports back exactly once through a callback. Starting a new load
//! supersedes any load still in flight, and tearing the loader down
//! suppresses delivery altogether. In-flight requests are never aborted;
//! their results are simply discarded.

use crate::catalog::{CatalogError, CatalogSource, MovieRecord};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Why a load ended without anything to show.
///
/// The screen renders every reason the same way; the distinction exists
/// for logging and for library users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyReason {
    /// The request could not be completed
    FetchFailed(String),
    /// The response could not be decoded
    Unreadable(String),
    /// The response decoded fine but contained no usable movies
    NoResults,
}

/// The result delivered to the `start` callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(Vec<MovieRecord>),
    Empty(EmptyReason),
}

/// Observable state of a loader
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Nothing has been requested yet, or the loader was torn down
    #[default]
    Idle,
    /// A load is in flight
    Fetching,
    /// The latest load produced movies
    Loaded(Vec<MovieRecord>),
    /// The latest load produced nothing to show
    Empty(EmptyReason),
}

impl From<LoadOutcome> for LoadState {
    fn from(outcome: LoadOutcome) -> Self {
        match outcome {
            LoadOutcome::Loaded(records) => LoadState::Loaded(records),
            LoadOutcome::Empty(reason) => LoadState::Empty(reason),
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    /// Incremented by every `start` and by `teardown`
    generation: u64,
    torn_down: bool,
    state: LoadState,
}

/// Handle to a started load.
#[derive(Debug)]
pub struct LoadTicket {
    generation: u64,
    handle: JoinHandle<bool>,
}

impl LoadTicket {
    /// The generation this load was started with
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Blocks until the worker has finished.
    ///
    /// Returns `true` if this load's outcome was delivered, `false` if it
    /// was superseded, torn down, or the worker panicked.
    pub fn wait(self) -> bool {
        self.handle.join().unwrap_or(false)
    }
}

/// Runs catalog loads in the background and delivers their outcome.
pub struct MovieLoader {
    source: Arc<dyn CatalogSource>,
    shared: Arc<Mutex<Shared>>,
}

impl MovieLoader {
    /// Creates a loader for the given catalog source.
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            source,
            shared: Arc::new(Mutex::new(Shared::default())),
        }
    }

    /// Starts a new load on a worker thread.
    ///
    /// Any earlier load that has not delivered yet is superseded and its
    /// outcome discarded. The state switches to `Fetching`, clearing the
    /// previous records.
    ///
    /// `on_finish` is called at most once, from the worker thread, while
    /// the loader is locked; it must not call back into the loader.
    ///
    /// # Returns
    ///
    /// A ticket for the new load, or `None` if the loader was torn down.
    pub fn start<F>(&self, on_finish: F) -> Option<LoadTicket>
    where
        F: FnOnce(LoadOutcome) + Send + 'static,
    {
        let generation = {
            let mut shared = lock(&self.shared);
            if shared.torn_down {
                debug!("ignoring load request after teardown");
                return None;
            }
            shared.generation += 1;
            shared.state = LoadState::Fetching;
            shared.generation
        };

        let source = Arc::clone(&self.source);
        let shared = Arc::clone(&self.shared);

        let handle = thread::spawn(move || {
            let outcome = run_pipeline(source.as_ref());

            let mut guard = lock(&shared);
            if guard.torn_down || guard.generation != generation {
                debug!(generation, "discarding outcome of superseded load");
                return false;
            }

            guard.state = outcome.clone().into();
            on_finish(outcome);
            true
        });

        Some(LoadTicket { generation, handle })
    }

    /// Stops delivering results and resets the state to `Idle`.
    ///
    /// Loads still in flight run to completion but their outcome is
    /// dropped. The loader accepts no further `start` calls.
    pub fn teardown(&self) {
        let mut shared = lock(&self.shared);
        shared.torn_down = true;
        shared.generation += 1;
        shared.state = LoadState::Idle;
    }

    /// Returns a snapshot of the current state
    pub fn state(&self) -> LoadState {
        lock(&self.shared).state.clone()
    }

    pub fn is_torn_down(&self) -> bool {
        lock(&self.shared).torn_down
    }
}

/// Runs fetch and decode, collapsing every failure into `Empty`.
fn run_pipeline(source: &dyn CatalogSource) -> LoadOutcome {
    match source.fetch_popular() {
        Ok(batch) if batch.is_empty() => {
            info!(rejected = batch.rejected.len(), "no movies to show");
            LoadOutcome::Empty(EmptyReason::NoResults)
        }
        Ok(batch) => LoadOutcome::Loaded(batch.records),
        Err(CatalogError::Fetch(e)) => {
            warn!(error = %e, "problem making the HTTP request");
            LoadOutcome::Empty(EmptyReason::FetchFailed(e.to_string()))
        }
        Err(CatalogError::Decode(e)) => {
            warn!(error = %e, "problem parsing the movie data");
            LoadOutcome::Empty(EmptyReason::Unreadable(e.to_string()))
        }
    }
}

/// The guarded data stays consistent even if a callback panicked
fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FetchError, MapError, MovieBatch};
    use std::sync::mpsc;

    struct FixedCatalog(Result<MovieBatch, CatalogError>);

    impl CatalogSource for FixedCatalog {
        fn fetch_popular(&self) -> Result<MovieBatch, CatalogError> {
            match &self.0 {
                Ok(batch) => Ok(batch.clone()),
                Err(CatalogError::Fetch(e)) => Err(CatalogError::Fetch(e.clone())),
                Err(CatalogError::Decode(e)) => Err(CatalogError::Decode(e.clone())),
            }
        }
    }

    fn batch(titles: &[&str]) -> MovieBatch {
        MovieBatch {
            records: titles
                .iter()
                .map(|t| MovieRecord::new(*t, "7.0", format!("http://img/{}.jpg", t)))
                .collect(),
            rejected: Vec::new(),
        }
    }

    fn load_once(result: Result<MovieBatch, CatalogError>) -> (LoadOutcome, LoadState) {
        let loader = MovieLoader::new(Arc::new(FixedCatalog(result)));
        let (tx, rx) = mpsc::channel();

        let ticket = loader.start(move |outcome| tx.send(outcome).unwrap()).unwrap();
        assert!(ticket.wait());

        (rx.recv().unwrap(), loader.state())
    }

    #[test]
    fn test_loaded_outcome() {
        let (outcome, state) = load_once(Ok(batch(&["A", "B"])));
        assert_eq!(outcome, LoadOutcome::Loaded(batch(&["A", "B"]).records));
        assert_eq!(state, LoadState::Loaded(batch(&["A", "B"]).records));
    }

    #[test]
    fn test_empty_batch_is_no_results() {
        let (outcome, _) = load_once(Ok(MovieBatch::default()));
        assert_eq!(outcome, LoadOutcome::Empty(EmptyReason::NoResults));
    }

    #[test]
    fn test_failures_collapse_to_empty() {
        let (outcome, state) = load_once(Err(CatalogError::Fetch(FetchError::BadStatus(404))));
        assert!(matches!(
            outcome,
            LoadOutcome::Empty(EmptyReason::FetchFailed(_))
        ));
        assert!(matches!(state, LoadState::Empty(_)));

        let (outcome, _) = load_once(Err(CatalogError::Decode(MapError::MissingResults)));
        assert!(matches!(
            outcome,
            LoadOutcome::Empty(EmptyReason::Unreadable(_))
        ));
    }

    #[test]
    fn test_start_after_teardown_is_ignored() {
        let loader = MovieLoader::new(Arc::new(FixedCatalog(Ok(batch(&["A"])))));
        loader.teardown();

        assert!(loader.is_torn_down());
        assert!(loader.start(|_| panic!("must not deliver")).is_none());
        assert_eq!(loader.state(), LoadState::Idle);
    }

    #[test]
    fn test_generations_increase() {
        let loader = MovieLoader::new(Arc::new(FixedCatalog(Ok(batch(&["A"])))));
        assert_eq!(loader.state(), LoadState::Idle);

        let first = loader.start(|_| {}).unwrap();
        let first_generation = first.generation();
        first.wait();

        let second = loader.start(|_| {}).unwrap();
        assert!(second.generation() > first_generation);
        assert!(second.wait());
    }
}
