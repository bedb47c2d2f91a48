#![expect(clippy::expect_used, reason = "tests require contextual panics")]

use std::{cell::RefCell, collections::HashMap, io::Write, path::Path};

use banditfeed_core::{CorpusError, CorpusFile, CorpusProvider};
use flate2::{Compression, write::GzEncoder};
use rstest::rstest;

use crate::{
    decode::{IDX_IMAGE_MAGIC, IDX_LABEL_MAGIC, decode_images, decode_labels, labels_one_hot},
    error::IdxError,
    fetch::{DownloadClient, IdxConfig},
    provider::IdxCorpus,
};

struct FakeClient {
    payloads: HashMap<String, Vec<u8>>,
    call_count: RefCell<usize>,
}

impl FakeClient {
    fn new(payloads: HashMap<String, Vec<u8>>) -> Self {
        Self {
            payloads,
            call_count: RefCell::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.call_count.borrow()
    }
}

impl DownloadClient for FakeClient {
    fn download_bytes(&self, url: &str) -> Result<Vec<u8>, IdxError> {
        *self.call_count.borrow_mut() += 1;
        self.payloads
            .get(url)
            .cloned()
            .ok_or_else(|| IdxError::Download {
                url: url.to_owned(),
                message: "missing fake payload".to_owned(),
            })
    }
}

fn gzip_bytes(raw: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(raw)
        .expect("gzip payload writing must succeed in tests");
    encoder
        .finish()
        .expect("gzip payload finalisation must succeed in tests")
}

fn append_u32_be(buffer: &mut Vec<u8>, value: u32) {
    buffer.extend(value.to_be_bytes());
}

fn gzip_idx_images(count: usize, rows: usize, cols: usize, fill: u8) -> Vec<u8> {
    let mut raw = Vec::new();
    append_u32_be(&mut raw, IDX_IMAGE_MAGIC);
    append_u32_be(&mut raw, u32::try_from(count).expect("count fits u32 in tests"));
    append_u32_be(&mut raw, u32::try_from(rows).expect("rows fit u32 in tests"));
    append_u32_be(&mut raw, u32::try_from(cols).expect("cols fit u32 in tests"));
    raw.extend(vec![fill; count * rows * cols]);
    gzip_bytes(&raw)
}

fn gzip_idx_labels(labels: &[u8]) -> Vec<u8> {
    let mut raw = Vec::new();
    append_u32_be(&mut raw, IDX_LABEL_MAGIC);
    append_u32_be(
        &mut raw,
        u32::try_from(labels.len()).expect("count fits u32 in tests"),
    );
    raw.extend(labels);
    gzip_bytes(&raw)
}

#[rstest]
fn decode_images_accepts_valid_files() {
    let payload = gzip_idx_images(3, 28, 28, 7);
    let raw = decode_images(Path::new("train"), &payload).expect("valid IDX images must decode");
    assert_eq!(raw.count(), 3);
    assert_eq!(raw.rows(), 28);
    assert_eq!(raw.cols(), 28);
    assert_eq!(raw.depth(), 1);
    assert!(raw.data().iter().all(|&pixel| pixel == 7));
}

#[rstest]
fn decode_images_rejects_label_magic() {
    let payload = gzip_idx_labels(&[1, 2, 3]);
    let err = decode_images(Path::new("bad"), &payload).expect_err("label magic must be rejected");
    assert!(matches!(
        err,
        IdxError::Magic {
            expected_magic: IDX_IMAGE_MAGIC,
            found_magic: IDX_LABEL_MAGIC,
            ..
        }
    ));
}

#[rstest]
fn decode_images_rejects_truncated_payload() {
    let mut raw = Vec::new();
    append_u32_be(&mut raw, IDX_IMAGE_MAGIC);
    append_u32_be(&mut raw, 2);
    append_u32_be(&mut raw, 28);
    append_u32_be(&mut raw, 28);
    raw.extend(vec![0_u8; 28 * 28]); // one image short
    let err = decode_images(Path::new("bad"), &gzip_bytes(&raw))
        .expect_err("short payloads must be rejected");
    assert!(matches!(err, IdxError::Truncated { .. }));
}

#[rstest]
fn decode_labels_round_trips_values() {
    let payload = gzip_idx_labels(&[0, 4, 9]);
    let labels = decode_labels(Path::new("labels"), &payload).expect("valid labels must decode");
    assert_eq!(labels.values(), [0, 4, 9]);
}

#[rstest]
fn decode_labels_rejects_image_magic() {
    let payload = gzip_idx_images(1, 2, 2, 0);
    let err = decode_labels(Path::new("bad"), &payload).expect_err("image magic must be rejected");
    assert!(matches!(
        err,
        IdxError::Magic {
            expected_magic: IDX_LABEL_MAGIC,
            found_magic: IDX_IMAGE_MAGIC,
            ..
        }
    ));
}

#[rstest]
fn decode_rejects_corrupt_gzip() {
    let err = decode_labels(Path::new("bad"), &[0xde, 0xad, 0xbe, 0xef])
        .expect_err("corrupt gzip must be rejected");
    assert!(matches!(err, IdxError::Truncated { .. }));
}

#[rstest]
fn labels_one_hot_expands_ten_classes() {
    let payload = gzip_idx_labels(&[1, 0]);
    let labels = decode_labels(Path::new("labels"), &payload).expect("valid labels must decode");
    let encoded = labels_one_hot(&labels).expect("digit labels fit ten classes");
    assert_eq!(encoded.len(), 20);
    assert_eq!(encoded.get(1), Some(&1.0));
    assert_eq!(encoded.get(10), Some(&1.0));
}

#[rstest]
fn provider_downloads_once_then_serves_from_cache() {
    let cache = tempfile::tempdir().expect("temp cache dir must be created");
    let config = IdxConfig {
        cache_dir: cache.path().to_path_buf(),
        base_url: "https://example.test/corpus".to_owned(),
    };

    let file_name = CorpusFile::TestLabels.file_name();
    let url = config.file_url(file_name);
    let cache_path = config.cache_dir.join(file_name);
    let client = FakeClient::new(HashMap::from([(url, gzip_idx_labels(&[3, 1, 4]))]));
    let corpus = IdxCorpus::with_client(config, Box::new(client));

    let first = corpus
        .labels(CorpusFile::TestLabels)
        .expect("first load should download and cache");
    assert_eq!(first.values(), [3, 1, 4]);
    assert!(cache_path.exists());

    let second = corpus
        .labels(CorpusFile::TestLabels)
        .expect("second load should reuse the cache");
    assert_eq!(second.values(), [3, 1, 4]);
}

#[rstest]
fn ensure_cached_counts_a_single_download() {
    let cache = tempfile::tempdir().expect("temp cache dir must be created");
    let config = IdxConfig {
        cache_dir: cache.path().to_path_buf(),
        base_url: "https://example.test/corpus".to_owned(),
    };
    let file_name = CorpusFile::TrainLabels.file_name();
    let url = config.file_url(file_name);
    let client = FakeClient::new(HashMap::from([(url, gzip_idx_labels(&[5]))]));

    let first = crate::fetch::ensure_cached(&config, file_name, &client)
        .expect("first fetch should download");
    let second = crate::fetch::ensure_cached(&config, file_name, &client)
        .expect("second fetch should hit the cache");
    assert_eq!(first, second);
    assert_eq!(client.calls(), 1);
}

#[rstest]
fn provider_propagates_download_failures() {
    let cache = tempfile::tempdir().expect("temp cache dir must be created");
    let config = IdxConfig {
        cache_dir: cache.path().to_path_buf(),
        base_url: "https://example.test/corpus".to_owned(),
    };
    let corpus = IdxCorpus::with_client(config, Box::new(FakeClient::new(HashMap::new())));

    let err = corpus
        .images(CorpusFile::TrainImages)
        .expect_err("missing payloads must surface as download errors");
    assert!(matches!(err, CorpusError::Download { .. }));
}

#[rstest]
#[case::magic(
    IdxError::Magic {
        path: "train".into(),
        expected_magic: IDX_IMAGE_MAGIC,
        found_magic: IDX_LABEL_MAGIC,
    },
    CorpusError::Format {
        path: "train".into(),
        expected_magic: IDX_IMAGE_MAGIC,
        found_magic: IDX_LABEL_MAGIC,
    }
)]
#[case::truncated(
    IdxError::Truncated { path: "train".into(), context: "short".into() },
    CorpusError::Truncated { path: "train".into(), context: "short".into() }
)]
#[case::cache_io(
    IdxError::CacheIo { path: "cache".into(), message: "denied".into() },
    CorpusError::Io { path: "cache".into(), message: "denied".into() }
)]
#[case::download(
    IdxError::Download { url: "https://example.test".into(), message: "timeout".into() },
    CorpusError::Download { url: "https://example.test".into(), message: "timeout".into() }
)]
fn idx_errors_convert_into_matching_corpus_errors(
    #[case] idx: IdxError,
    #[case] expected: CorpusError,
) {
    assert_eq!(CorpusError::from(idx), expected);
}
