use clap::Parser;
use poster_wall::{
    CatalogConfig, ConfigError, Connectivity, DEFAULT_API_BASE, DEFAULT_LANGUAGE, EmptyState,
    FixedConnectivity, LoadEvent, MovieRecord, ScreenView, TcpProbe, load_popular_movies,
    open_catalog_screen,
};
use std::process;
use tracing_subscriber::EnvFilter;

/// Show the currently popular movies from The Movie Database
#[derive(Parser)]
#[command(name = "poster-wall", version, about, long_about = None)]
struct Cli {
    /// TMDB API key
    #[arg(long, env = "TMDB_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the TMDB API
    #[arg(long, env = "TMDB_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Language of titles in the response
    #[arg(long, env = "TMDB_LANGUAGE", default_value = DEFAULT_LANGUAGE)]
    language: String,

    /// Print the movies as JSON instead of a list
    #[arg(long)]
    json: bool,

    /// Report why loading failed instead of showing an empty state
    #[arg(long)]
    strict: bool,

    /// Do not probe the API host before loading
    #[arg(long)]
    skip_connectivity_check: bool,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn catalog_config(&self) -> Result<CatalogConfig, ConfigError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let mut config = CatalogConfig::new(api_key);
        config.api_base = self.api_base.clone();
        config.language = self.language.clone();
        Ok(config)
    }
}

/// Handles progress events and prints them to stderr
fn handle_load_event(event: LoadEvent) {
    match event {
        LoadEvent::Started { api_base } => {
            eprintln!("Loading popular movies from {}...", api_base);
        }
        LoadEvent::EntryRejected { index, reason } => {
            eprintln!("  Skipped entry #{}: {}", index + 1, reason);
        }
        LoadEvent::Fetched {
            record_count,
            rejected_count,
        } => {
            eprintln!(
                "Received {} movie(s), skipped {} invalid entries\n",
                record_count, rejected_count
            );
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_movies(movies: &[MovieRecord], json: bool) {
    if json {
        match serde_json::to_string_pretty(movies) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: Failed to serialize movies: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    for (index, movie) in movies.iter().enumerate() {
        println!("{:>3}. {}  [{}]", index + 1, movie.title(), movie.vote_average());
        println!("     {}", movie.poster_url());
    }
}

fn run_strict(config: &CatalogConfig, json: bool) {
    match load_popular_movies(config, handle_load_event) {
        Ok(batch) => print_movies(&batch.records, json),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_screen(config: &CatalogConfig, cli: &Cli) {
    let screen = match open_catalog_screen(config) {
        Ok(screen) => screen,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let connectivity: Box<dyn Connectivity> = if cli.skip_connectivity_check {
        Box::new(FixedConnectivity(true))
    } else {
        match TcpProbe::for_url(&config.api_base) {
            Some(probe) => Box::new(probe),
            None => Box::new(FixedConnectivity(false)),
        }
    };

    if let Some(ticket) = screen.open(connectivity.as_ref()) {
        eprintln!("Loading popular movies...");
        ticket.wait();
    }

    match screen.view() {
        ScreenView::Movies(movies) => print_movies(&movies, cli.json),
        ScreenView::Empty(empty_state) => {
            if cli.json {
                println!("[]");
            }
            eprintln!("{}", empty_state);
        }
        ScreenView::Loading => {
            // The worker finished without delivering
            if cli.json {
                println!("[]");
            }
            eprintln!("{}", EmptyState::NothingFound);
        }
    }

    screen.close();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match cli.catalog_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("\nGet a key at https://www.themoviedb.org/settings/api");
            process::exit(1);
        }
    };

    if cli.strict {
        run_strict(&config, cli.json);
    } else {
        run_screen(&config, &cli);
    }
}
