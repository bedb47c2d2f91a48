//! Provider-local error type for gzip IDX acquisition and decoding.
//!
//! Fetch and decode report failures as [`IdxError`]; the [`crate::IdxCorpus`]
//! provider maps them into [`CorpusError`] at the collaborator seam. Each
//! variant converts to exactly one [`CorpusError`] variant, so nothing is
//! lost or reinterpreted on the way out.

use std::path::PathBuf;

use banditfeed_core::CorpusError;
use thiserror::Error;

/// Errors raised while fetching or decoding gzip IDX corpus files.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum IdxError {
    /// A corpus file carried an unexpected IDX magic number.
    #[error("`{path}` has magic {found_magic}, expected {expected_magic}")]
    Magic {
        /// Path of the offending corpus file.
        path: PathBuf,
        /// Magic number required for this file kind.
        expected_magic: u32,
        /// Magic number actually present in the file.
        found_magic: u32,
    },
    /// A corpus file ended before its declared payload.
    #[error("`{path}` is truncated: {context}")]
    Truncated {
        /// Path of the offending corpus file.
        path: PathBuf,
        /// Description of the missing bytes.
        context: String,
    },
    /// A filesystem operation on the cache directory failed.
    #[error("cache I/O failure for `{path}`: {message}")]
    CacheIo {
        /// Path involved in the failed operation.
        path: PathBuf,
        /// Rendered I/O error message.
        message: String,
    },
    /// Downloading a corpus file failed.
    #[error("download of `{url}` failed: {message}")]
    Download {
        /// URL that could not be fetched.
        url: String,
        /// Rendered transport error message.
        message: String,
    },
}

impl From<IdxError> for CorpusError {
    fn from(error: IdxError) -> Self {
        match error {
            IdxError::Magic {
                path,
                expected_magic,
                found_magic,
            } => Self::Format {
                path,
                expected_magic,
                found_magic,
            },
            IdxError::Truncated { path, context } => Self::Truncated { path, context },
            IdxError::CacheIo { path, message } => Self::Io { path, message },
            IdxError::Download { url, message } => Self::Download { url, message },
        }
    }
}
