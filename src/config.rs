//! Catalog configuration
//!
//! The endpoint and credential are read from the environment (or passed in
//! by the CLI) instead of being compiled into the binary.

use reqwest::Url;
use std::env;
use thiserror::Error;

/// Environment variable holding the API key
pub const API_KEY_VAR: &str = "TMDB_API_KEY";

/// Environment variable overriding the API base URL
pub const API_BASE_VAR: &str = "TMDB_API_BASE";

/// Environment variable overriding the response language
pub const LANGUAGE_VAR: &str = "TMDB_LANGUAGE";

/// Default API base URL
pub const DEFAULT_API_BASE: &str = "https://api.themoviedb.org/3";

/// Default response language
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Errors that can occur while assembling the configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No API key was provided
    #[error("No API key configured, set TMDB_API_KEY")]
    MissingApiKey,
}

/// Everything needed to address the popular movies endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Base URL of the API, without trailing slash
    pub api_base: String,
    /// The API key sent as `api_key` query parameter
    pub api_key: String,
    /// Language tag sent as `language` query parameter
    pub language: String,
}

impl CatalogConfig {
    /// Creates a configuration for the public API with the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: api_key.into(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingApiKey` if `TMDB_API_KEY` is unset or
    /// blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_key = non_blank(API_KEY_VAR).ok_or(ConfigError::MissingApiKey)?;
        let mut config = Self::new(api_key);

        if let Some(api_base) = non_blank(API_BASE_VAR) {
            config.api_base = api_base;
        }
        if let Some(language) = non_blank(LANGUAGE_VAR) {
            config.language = language;
        }

        Ok(config)
    }

    /// Renders the URL of the first page of popular movies.
    ///
    /// If the base URL cannot be parsed the parameters are appended
    /// textually, leaving it to the fetcher to reject the result.
    pub fn popular_movies_url(&self) -> String {
        let endpoint = format!("{}/movie/popular", self.api_base.trim_end_matches('/'));
        let params = [
            ("api_key", self.api_key.as_str()),
            ("language", self.language.as_str()),
            ("page", "1"),
        ];

        match Url::parse_with_params(&endpoint, &params) {
            Ok(url) => url.to_string(),
            Err(_) => format!(
                "{}?api_key={}&language={}&page=1",
                endpoint, self.api_key, self.language
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_popular_movies_url() {
        let config = CatalogConfig::new("abc123");
        assert_eq!(
            config.popular_movies_url(),
            "https://api.themoviedb.org/3/movie/popular?api_key=abc123&language=en-US&page=1"
        );
    }

    #[test]
    fn test_popular_movies_url_encodes_and_trims() {
        let mut config = CatalogConfig::new("a b&c");
        config.api_base = "http://localhost:8080/3/".to_string();
        assert_eq!(
            config.popular_movies_url(),
            "http://localhost:8080/3/movie/popular?api_key=a+b%26c&language=en-US&page=1"
        );
    }

    #[test]
    fn test_from_lookup_requires_key() {
        assert_eq!(
            CatalogConfig::from_lookup(lookup(&[])),
            Err(ConfigError::MissingApiKey)
        );
        assert_eq!(
            CatalogConfig::from_lookup(lookup(&[(API_KEY_VAR, "  ")])),
            Err(ConfigError::MissingApiKey)
        );
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = CatalogConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "key"),
            (API_BASE_VAR, "http://mirror.local/3"),
            (LANGUAGE_VAR, "de-DE"),
        ]))
        .unwrap();

        assert_eq!(config.api_key, "key");
        assert_eq!(config.api_base, "http://mirror.local/3");
        assert_eq!(config.language, "de-DE");

        let defaults = CatalogConfig::from_lookup(lookup(&[(API_KEY_VAR, "key")])).unwrap();
        assert_eq!(defaults.api_base, DEFAULT_API_BASE);
        assert_eq!(defaults.language, DEFAULT_LANGUAGE);
    }
}
