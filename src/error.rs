//! Typed errors for playlist selection and the catalog providers.
//!
//! Hard failures end a run. Soft absences (no related artists, no albums,
//! no qualifying track, duplicate track) are never errors; they show up as
//! `None` or an empty `Vec` from the catalog adapter.

use thiserror::Error;

/// Failures reported by an external catalog provider.
///
/// Nothing in this crate retries a provider call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level failure (DNS, TLS, connection reset, timeout)
    #[error("request to catalog provider failed: {0}")]
    Http(String),

    /// The provider answered with a non-success status
    #[error("catalog provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded
    #[error("could not decode catalog response: {0}")]
    Decode(String),

    /// No access token was supplied
    #[error("no access token available (set SPOTIFY_ACCESS_TOKEN)")]
    MissingToken,

    /// Reading a local catalog snapshot failed
    #[error("catalog snapshot I/O failed: {0}")]
    Io(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else {
            ProviderError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for ProviderError {
    fn from(err: std::io::Error) -> Self {
        ProviderError::Io(err.to_string())
    }
}

/// Errors that end a playlist-generation run.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// The threshold statistic was handed zero samples
    #[error("cannot compute a popularity threshold from zero tracks")]
    EmptyInput,

    /// The listener has no short-term top artists to seed from
    #[error("no listening history available to pick a seed artist")]
    NoSeedArtist,

    /// Any catalog read or playlist write failed
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The provider refused to create the playlist
    #[error("playlist creation failed: {0}")]
    PlaylistCreation(ProviderError),
}

pub type Result<T, E = SelectionError> = std::result::Result<T, E>;
