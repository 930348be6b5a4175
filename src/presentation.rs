//! Presentation side of the poster grid
//!
//! The `Screen` owns the grid model and a `MovieLoader`. It checks
//! connectivity before asking for data, swaps the grid contents when a load
//! delivers, and falls back to an empty-state message otherwise.

use crate::catalog::MovieRecord;
use crate::loader::{LoadOutcome, LoadTicket, MovieLoader};
use reqwest::Url;
use std::fmt;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Host-side check performed before any load is triggered
pub trait Connectivity {
    fn is_connected(&self) -> bool;
}

/// Connectivity that is decided up front
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedConnectivity(pub bool);

impl Connectivity for FixedConnectivity {
    fn is_connected(&self) -> bool {
        self.0
    }
}

/// Considers the network available if a TCP connection to the API host
/// can be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    /// Default time to wait for the probe connection
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

    /// Creates a probe for the host of the given URL.
    ///
    /// Returns `None` if the URL has no host or no known port.
    pub fn for_url(url: &str) -> Option<Self> {
        let url = Url::parse(url).ok()?;
        Some(Self {
            host: url.host_str()?.to_string(),
            port: url.port_or_known_default()?,
            timeout: Self::DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Connectivity for TcpProbe {
    fn is_connected(&self) -> bool {
        let addrs = match (self.host.as_str(), self.port).to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                debug!(host = %self.host, error = %e, "connectivity probe could not resolve host");
                return false;
            }
        };

        addrs
            .into_iter()
            .any(|addr| TcpStream::connect_timeout(&addr, self.timeout).is_ok())
    }
}

/// Message shown in place of the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    /// The host reported no network before loading
    NoInternetConnection,
    /// A load finished without anything to show
    NothingFound,
}

impl fmt::Display for EmptyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyState::NoInternetConnection => write!(f, "No Internet Connection"),
            EmptyState::NothingFound => write!(f, "No movies found"),
        }
    }
}

/// Ordered list of movies backing the grid
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieGrid {
    records: Vec<MovieRecord>,
}

impl MovieGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Appends records, keeping their order
    pub fn add_all(&mut self, records: impl IntoIterator<Item = MovieRecord>) {
        self.records.extend(records);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MovieRecord> {
        self.records.iter()
    }
}

/// What the screen currently displays
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenView {
    /// A load is running and nothing has been shown yet
    Loading,
    /// The grid is populated
    Movies(Vec<MovieRecord>),
    /// An empty-state message is shown
    Empty(EmptyState),
}

#[derive(Debug, Default)]
struct ViewModel {
    /// Bumped by every refresh so late callbacks can be recognized
    request: u64,
    grid: MovieGrid,
    loading: bool,
    empty_state: Option<EmptyState>,
}

impl ViewModel {
    fn show(&mut self, outcome: LoadOutcome) {
        self.loading = false;
        self.grid.clear();
        match outcome {
            LoadOutcome::Loaded(records) => {
                self.grid.add_all(records);
                self.empty_state = None;
            }
            LoadOutcome::Empty(reason) => {
                debug!(?reason, "showing empty state");
                self.empty_state = Some(EmptyState::NothingFound);
            }
        }
    }
}

/// A single poster grid screen.
pub struct Screen {
    loader: MovieLoader,
    display: Arc<Mutex<ViewModel>>,
}

impl Screen {
    pub fn new(loader: MovieLoader) -> Self {
        Self {
            loader,
            display: Arc::new(Mutex::new(ViewModel::default())),
        }
    }

    /// Opens the screen, loading movies if the network is available.
    ///
    /// Without connectivity the loader is never invoked and the
    /// no-connection message is shown right away.
    ///
    /// # Returns
    ///
    /// The ticket of the started load, if one was started.
    pub fn open(&self, connectivity: &dyn Connectivity) -> Option<LoadTicket> {
        if !connectivity.is_connected() {
            let mut display = lock(&self.display);
            // Any load still in flight must not repaint over the message
            display.request += 1;
            display.loading = false;
            display.grid.clear();
            display.empty_state = Some(EmptyState::NoInternetConnection);
            return None;
        }

        self.refresh()
    }

    /// Starts a new load, superseding any load still running.
    pub fn refresh(&self) -> Option<LoadTicket> {
        let request = {
            let mut display = lock(&self.display);
            display.request += 1;
            display.loading = true;
            display.empty_state = None;
            display.grid.clear();
            display.request
        };

        let display = Arc::clone(&self.display);
        self.loader.start(move |outcome| {
            let mut display = lock(&display);
            if display.request == request {
                display.show(outcome);
            }
        })
    }

    /// Tears the screen down; pending results are no longer shown.
    pub fn close(&self) {
        self.loader.teardown();
        let mut display = lock(&self.display);
        display.loading = false;
        display.grid.clear();
    }

    /// Returns what the screen currently shows
    pub fn view(&self) -> ScreenView {
        let display = lock(&self.display);
        if let Some(empty_state) = display.empty_state {
            ScreenView::Empty(empty_state)
        } else if display.loading {
            ScreenView::Loading
        } else {
            ScreenView::Movies(display.grid.iter().cloned().collect())
        }
    }

    pub fn loader(&self) -> &MovieLoader {
        &self.loader
    }
}

fn lock(display: &Mutex<ViewModel>) -> MutexGuard<'_, ViewModel> {
    display.lock().unwrap_or_else(PoisonError::into_inner)
}
