//! The [`CorpusProvider`] implementation over cached gzip IDX files.

use banditfeed_core::{CorpusError, CorpusFile, CorpusProvider, RawImages, RawLabels};

use crate::{
    decode::{decode_images, decode_labels},
    error::IdxError,
    fetch::{DownloadClient, IdxConfig, UreqDownloadClient, ensure_cached},
};

/// Corpus provider that fetches, caches, and decodes gzip IDX files.
///
/// # Examples
/// ```no_run
/// use banditfeed_core::{LoadOptions, read_data_sets};
/// use banditfeed_providers_idx::{IdxConfig, IdxCorpus};
///
/// let corpus = IdxCorpus::new(IdxConfig::with_cache_dir("/tmp/banditfeed"));
/// let data_sets = read_data_sets(&corpus, &LoadOptions::default())?;
/// assert!(data_sets.train.num_examples() > 0);
/// # Ok::<(), banditfeed_core::LoadError>(())
/// ```
pub struct IdxCorpus {
    config: IdxConfig,
    client: Box<dyn DownloadClient>,
}

impl IdxCorpus {
    /// Creates a provider using the blocking `ureq` download client.
    #[must_use]
    pub fn new(config: IdxConfig) -> Self {
        Self::with_client(config, Box::new(UreqDownloadClient))
    }

    /// Creates a provider with an injected download client.
    #[must_use]
    pub fn with_client(config: IdxConfig, client: Box<dyn DownloadClient>) -> Self {
        Self { config, client }
    }

    /// Returns the download-and-cache configuration.
    #[must_use]
    pub const fn config(&self) -> &IdxConfig {
        &self.config
    }

    fn cached_bytes(&self, file: CorpusFile) -> Result<Vec<u8>, IdxError> {
        ensure_cached(&self.config, file.file_name(), self.client.as_ref())
    }
}

impl CorpusProvider for IdxCorpus {
    fn images(&self, file: CorpusFile) -> Result<RawImages, CorpusError> {
        let bytes = self.cached_bytes(file)?;
        let path = self.config.cache_dir.join(file.file_name());
        Ok(decode_images(&path, &bytes)?)
    }

    fn labels(&self, file: CorpusFile) -> Result<RawLabels, CorpusError> {
        let bytes = self.cached_bytes(file)?;
        let path = self.config.cache_dir.join(file.file_name());
        Ok(decode_labels(&path, &bytes)?)
    }
}
