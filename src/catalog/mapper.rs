//! Mapping of catalog responses into movie records
//!
//! `decode_page` is the strict, typed decoder: it reports why a page could
//! not be read and which entries were dropped. `parse` wraps it with the
//! fail-soft policy the screen relies on: whatever goes wrong, the caller
//! gets a (possibly empty) list and never an error.

use super::tmdb_types::{PopularPage, TmdbMovie};
use super::{MovieBatch, MovieRecord, POSTER_BASE_URL, RejectedEntry};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that prevent a whole page from being decoded
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapError {
    /// There was no body to decode
    #[error("Response body is empty")]
    EmptyBody,

    /// The body is not valid JSON
    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    /// The document has no `results` array
    #[error("Response has no results array")]
    MissingResults,
}

/// Errors that cause a single catalog entry to be dropped
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntryError {
    /// The entry is not a JSON object
    #[error("Entry is not an object")]
    NotAnObject,

    /// A required field is absent or null
    #[error("Missing field '{0}'")]
    MissingField(&'static str),

    /// A required field holds an array or object
    #[error("Field '{field}' has unsupported type {found}")]
    WrongType {
        field: &'static str,
        found: &'static str,
    },
}

/// Builds the full poster URL for a relative poster path.
///
/// No normalization is applied: `/a.jpg` becomes
/// `http://image.tmdb.org/t/p/w185//a.jpg`.
pub fn poster_url(poster_path: &str) -> String {
    format!("{}{}", POSTER_BASE_URL, poster_path)
}

/// Decodes a popular movies response into a batch of records.
///
/// Entries are validated one by one; a bad entry is recorded in
/// `MovieBatch::rejected` and the remaining entries are still decoded.
///
/// # Errors
///
/// Returns a `MapError` if the body is empty, is not JSON, or lacks the
/// `results` array.
pub fn decode_page(body: &str) -> Result<MovieBatch, MapError> {
    if body.trim().is_empty() {
        return Err(MapError::EmptyBody);
    }

    let document: Value =
        serde_json::from_str(body).map_err(|e| MapError::MalformedJson(e.to_string()))?;

    // Structs also deserialize from arrays, so insist on an object first
    if !document.is_object() {
        return Err(MapError::MissingResults);
    }

    let page: PopularPage =
        serde_json::from_value(document).map_err(|_| MapError::MissingResults)?;

    let mut batch = MovieBatch::default();

    for (index, entry) in page.results.into_iter().enumerate() {
        match decode_entry(entry) {
            Ok(record) => batch.records.push(record),
            Err(error) => {
                debug!(index, %error, "dropping catalog entry");
                batch.rejected.push(RejectedEntry { index, error });
            }
        }
    }

    Ok(batch)
}

/// Parses a response body, degrading every failure to an empty list.
///
/// `None` stands for "no body at all", e.g. after a failed request.
pub fn parse(body: Option<&str>) -> Vec<MovieRecord> {
    let Some(body) = body else {
        return Vec::new();
    };

    match decode_page(body) {
        Ok(batch) => batch.records,
        Err(MapError::EmptyBody) => Vec::new(),
        Err(e) => {
            warn!(error = %e, "problem parsing the movie data");
            Vec::new()
        }
    }
}

/// Validates one entry of the results array.
fn decode_entry(entry: Value) -> Result<MovieRecord, EntryError> {
    if !entry.is_object() {
        return Err(EntryError::NotAnObject);
    }

    let movie: TmdbMovie = serde_json::from_value(entry).map_err(|_| EntryError::NotAnObject)?;

    let title = required_text("title", movie.title)?;
    let vote_average = required_text("vote_average", movie.vote_average)?;
    let poster_path = required_text("poster_path", movie.poster_path)?;

    Ok(MovieRecord::new(
        title,
        vote_average,
        poster_url(&poster_path),
    ))
}

/// Coerces a scalar JSON value to text.
///
/// Strings are taken verbatim; numbers and booleans keep their JSON
/// rendering so that a rating of `7.5` reads `"7.5"`.
fn required_text(field: &'static str, value: Option<Value>) -> Result<String, EntryError> {
    match value {
        None | Some(Value::Null) => Err(EntryError::MissingField(field)),
        Some(Value::String(text)) => Ok(text),
        Some(Value::Number(number)) => Ok(number.to_string()),
        Some(Value::Bool(flag)) => Ok(flag.to_string()),
        Some(Value::Array(_)) => Err(EntryError::WrongType {
            field,
            found: "array",
        }),
        Some(Value::Object(_)) => Err(EntryError::WrongType {
            field,
            found: "object",
        }),
    }
}
