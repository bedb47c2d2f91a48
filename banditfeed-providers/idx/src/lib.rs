//! Gzip IDX corpus provider: download-and-cache acquisition plus decoding.
//!
//! Implements the `banditfeed-core` [`banditfeed_core::CorpusProvider`]
//! contract for the canonical gzip-compressed IDX corpus files, caching
//! downloads on disk and validating the per-kind magic numbers.

mod decode;
mod error;
mod fetch;
mod provider;

pub use decode::{
    IDX_IMAGE_MAGIC, IDX_LABEL_MAGIC, decode_images, decode_labels, labels_one_hot,
};
pub use error::IdxError;
pub use fetch::{DownloadClient, IdxConfig, UreqDownloadClient, ensure_cached};
pub use provider::IdxCorpus;

#[cfg(test)]
mod tests;
