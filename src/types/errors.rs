use std::time::Duration;

use thiserror::Error;

// === BookmarkError ===

/// Errors related to bookmark management operations.
#[derive(Debug, Error)]
pub enum BookmarkError {
    /// Bookmark with the given ID was not found (or is not owned by the caller).
    #[error("Bookmark not found: {0}")]
    NotFound(String),
    /// The submitted URL is not an absolute URL with a host.
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    /// The owner already bookmarked this (normalized) URL.
    #[error("You have already bookmarked this URL: {0}")]
    DuplicateUrl(String),
    /// An update tried to point an existing bookmark at a different URL.
    #[error("URL cannot be changed: {0}")]
    UrlChangeRejected(String),
    /// Database operation failed.
    #[error("Bookmark database error: {0}")]
    DatabaseError(String),
}

// === UserError ===

/// Errors related to user records.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(String),
    #[error("Username already taken: {0}")]
    DuplicateUsername(String),
    #[error("User database error: {0}")]
    DatabaseError(String),
}

// === ClickError ===

/// Errors related to click recording and click-log retention.
#[derive(Debug, Error)]
pub enum ClickError {
    /// The clicked bookmark does not exist.
    #[error("Clicked bookmark not found: {0}")]
    BookmarkNotFound(String),
    /// Database operation failed.
    #[error("Click log database error: {0}")]
    DatabaseError(String),
}

// === RankingError ===

/// Errors raised while aggregating, caching or querying rankings.
#[derive(Debug, Error)]
pub enum RankingError {
    /// Database operation failed.
    #[error("Ranking database error: {0}")]
    DatabaseError(String),
    /// Object storage was unavailable for a whole-job step.
    #[error("Ranking storage error: {0}")]
    Storage(#[from] StorageError),
}

// === StorageError ===

/// Errors raised by object storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Remote storage error: {0}")]
    Remote(String),
    #[error("Storage configuration error: {0}")]
    Config(String),
}

// === FetchError ===

/// Errors that can occur while fetching a page or an icon.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected HTTP status {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("Timeout after {0:?}")]
    Timeout(Duration),
    #[error("Content too large: {0} bytes")]
    ContentTooLarge(usize),
    #[error("Failed to parse URL: {0}")]
    InvalidUrl(String),
}

// === ImageError ===

/// Errors raised while validating or rasterizing a downloaded icon.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Not a decodable image: {0}")]
    Undecodable(String),
    #[error("Image has unusable dimensions {width}x{height}")]
    BadDimensions { width: u32, height: u32 },
    #[error("SVG rasterization failed: {0}")]
    Rasterize(String),
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}
