//! Error type shared by every layer of the crate.

use crate::resource::ResourceId;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every way a lookup, a page fetch or a field access can fail.
///
/// Batched resolution and pagination never collapse partial failures into one of these:
/// a missing resource in a batch is reported by that resource's [`ResourceNotFound`], and a
/// failed page is reported in place of that page's first item.
///
/// [`ResourceNotFound`]: Error::ResourceNotFound
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed caller input, detected before any network activity.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The API rejected our credentials.
    #[error("authentication rejected by YouTube API: {message}")]
    Auth { message: String },

    /// The identifier does not exist remotely (or is not visible to us).
    #[error("{0} not found")]
    ResourceNotFound(ResourceId),

    /// The resource exists, but the API did not return this field for it.
    #[error("{id} has no field '{field}'")]
    FieldNotFound { id: ResourceId, field: &'static str },

    /// Network or HTTP-level failure. `status` is absent when no response was received.
    #[error("YouTube API request failed{}: {message}", fmt_status(.status))]
    Transport { status: Option<u16>, message: String },

    /// A response body (or an item within it) could not be interpreted.
    #[error("could not decode YouTube API response: {message}")]
    Decode { message: String },

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" with status {s}")).unwrap_or_default()
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Returns `true` for [`Error::ResourceNotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ResourceNotFound(_))
    }

    /// Returns `true` if the API rejected our credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return Self::decode(e.to_string());
        }
        Self::Transport {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::decode(e.to_string())
    }
}
