//! Download-and-cache acquisition for corpus files.
//!
//! The contract is deliberately simple: given a cache directory and a file
//! name, return the file's bytes, downloading them over HTTP only when no
//! cached copy exists. Writes are atomic (`.part` then rename) so a crashed
//! download never leaves a truncated cache entry behind.

use std::{
    env, fs,
    io::Read,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::error::IdxError;

/// Configuration for corpus download and cache behaviour.
#[derive(Clone, Debug)]
pub struct IdxConfig {
    /// Local directory where compressed corpus files are cached.
    pub cache_dir: PathBuf,
    /// Base URL that hosts the gzip IDX files.
    pub base_url: String,
}

impl IdxConfig {
    /// Creates a configuration rooted at an explicit cache directory.
    #[must_use]
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }

    /// Returns the full URL for one corpus file.
    #[must_use]
    pub fn file_url(&self, file_name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), file_name)
    }
}

impl Default for IdxConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            base_url: "https://storage.googleapis.com/cvdf-datasets/mnist".to_owned(),
        }
    }
}

/// Download client abstraction so tests can inject canned payloads.
pub trait DownloadClient {
    /// Downloads URL contents as bytes.
    ///
    /// # Errors
    /// Returns [`IdxError::Download`] if the request fails.
    fn download_bytes(&self, url: &str) -> Result<Vec<u8>, IdxError>;
}

/// Blocking HTTP download client backed by `ureq`.
#[derive(Clone, Copy, Debug, Default)]
pub struct UreqDownloadClient;

impl DownloadClient for UreqDownloadClient {
    fn download_bytes(&self, url: &str) -> Result<Vec<u8>, IdxError> {
        let response = ureq::get(url).call().map_err(|error| IdxError::Download {
            url: url.to_owned(),
            message: error.to_string(),
        })?;

        let mut reader = response.into_body().into_reader();
        let mut buffer = Vec::new();
        reader
            .read_to_end(&mut buffer)
            .map_err(|error| IdxError::Download {
                url: url.to_owned(),
                message: error.to_string(),
            })?;
        Ok(buffer)
    }
}

/// Returns the bytes of `file_name`, downloading into the cache if absent.
///
/// The fetch is idempotent: a cached file is read back without any network
/// traffic, so retrying after a transport failure is always safe.
///
/// # Errors
/// Returns [`IdxError::CacheIo`] for cache filesystem failures and
/// [`IdxError::Download`] when the client cannot fetch the file.
pub fn ensure_cached(
    config: &IdxConfig,
    file_name: &str,
    client: &dyn DownloadClient,
) -> Result<Vec<u8>, IdxError> {
    fs::create_dir_all(&config.cache_dir).map_err(|error| io_error(&config.cache_dir, &error))?;

    let path = config.cache_dir.join(file_name);
    if path.exists() {
        debug!(path = %path.display(), "serving corpus file from cache");
        return fs::read(&path).map_err(|error| io_error(&path, &error));
    }

    let url = config.file_url(file_name);
    let payload = client.download_bytes(&url)?;
    write_atomic(&path, &payload)?;
    info!(url, bytes = payload.len(), "downloaded and cached corpus file");
    Ok(payload)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), IdxError> {
    let mut part_path = path.to_path_buf();
    part_path.set_extension("part");
    fs::write(&part_path, bytes).map_err(|error| io_error(&part_path, &error))?;
    fs::rename(&part_path, path).map_err(|error| io_error(path, &error))?;
    Ok(())
}

fn io_error(path: &Path, error: &std::io::Error) -> IdxError {
    IdxError::CacheIo {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

fn default_cache_dir() -> PathBuf {
    if let Some(explicit) = env::var_os("BANDITFEED_CACHE_DIR") {
        return PathBuf::from(explicit);
    }

    if let Some(xdg_cache) = env::var_os("XDG_CACHE_HOME") {
        return PathBuf::from(xdg_cache).join("banditfeed").join("corpus");
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home)
            .join(".cache")
            .join("banditfeed")
            .join("corpus");
    }

    env::temp_dir().join("banditfeed").join("corpus")
}
