//! Error types for the banditfeed core library.
//!
//! Defines error enums exposed by the public API and a convenient result alias.

use std::{fmt, path::PathBuf};

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced while constructing or drawing from an [`crate::ExamplePool`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum PoolError {
    /// Image and label counts disagreed at pool construction.
    #[error("image/label count mismatch: {images} images but {labels} labels")]
    ShapeMismatch {
        /// Number of images supplied to the constructor.
        images: usize,
        /// Number of labels supplied to the constructor.
        labels: usize,
    },
    /// Raw images carried a pixel depth other than one channel.
    #[error("raw images must have depth 1 (got {depth})")]
    UnsupportedDepth {
        /// Channel depth found in the raw corpus.
        depth: usize,
    },
    /// The requested batch exceeds the pool size and can never be served.
    #[error("batch of {requested} exceeds pool of {available} examples")]
    InvalidBatchSize {
        /// Batch size requested by the caller.
        requested: usize,
        /// Total number of examples held by the pool.
        available: usize,
    },
    /// The pool contained no examples.
    #[error("example pool contains no examples")]
    EmptyPool,
    /// A label was outside the configured action space during encoding.
    #[error("label {label} is outside the action space of {num_actions}")]
    LabelOutOfRange {
        /// The offending label value.
        label: u8,
        /// Size of the fixed label space.
        num_actions: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`PoolError`] variants.
    enum PoolErrorCode for PoolError {
        /// Image and label counts disagreed at pool construction.
        ShapeMismatch => ShapeMismatch { .. } => "POOL_SHAPE_MISMATCH",
        /// Raw images carried a pixel depth other than one channel.
        UnsupportedDepth => UnsupportedDepth { .. } => "POOL_UNSUPPORTED_DEPTH",
        /// The requested batch exceeds the pool size and can never be served.
        InvalidBatchSize => InvalidBatchSize { .. } => "POOL_INVALID_BATCH_SIZE",
        /// The pool contained no examples.
        EmptyPool => EmptyPool => "POOL_EMPTY",
        /// A label was outside the configured action space during encoding.
        LabelOutOfRange => LabelOutOfRange { .. } => "POOL_LABEL_OUT_OF_RANGE",
    }
}

/// An error produced by corpus acquisition or decoding collaborators.
///
/// Providers raise these; [`crate::read_data_sets`] propagates them unchanged.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum CorpusError {
    /// A corpus file carried an unexpected IDX magic number.
    #[error("`{path}` has magic {found_magic}, expected {expected_magic}")]
    Format {
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
    /// Image and label files disagreed on the example count.
    #[error("corpus files disagree on example count: {images} images, {labels} labels")]
    CountMismatch {
        /// Count declared by the image file.
        images: usize,
        /// Count declared by the label file.
        labels: usize,
    },
    /// A filesystem operation on the cache directory failed.
    #[error("cache I/O failure for `{path}`: {message}")]
    Io {
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

define_error_codes! {
    /// Stable codes describing [`CorpusError`] variants.
    enum CorpusErrorCode for CorpusError {
        /// A corpus file carried an unexpected IDX magic number.
        Format => Format { .. } => "CORPUS_FORMAT",
        /// A corpus file ended before its declared payload.
        Truncated => Truncated { .. } => "CORPUS_TRUNCATED",
        /// Image and label files disagreed on the example count.
        CountMismatch => CountMismatch { .. } => "CORPUS_COUNT_MISMATCH",
        /// A filesystem operation on the cache directory failed.
        Io => Io { .. } => "CORPUS_IO",
        /// Downloading a corpus file failed.
        Download => Download { .. } => "CORPUS_DOWNLOAD",
    }
}

/// Errors surfaced by the corpus loading entry point.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum LoadError {
    /// A collaborator failed while fetching or decoding corpus files.
    #[error(transparent)]
    Corpus(#[from] CorpusError),
    /// Pool construction rejected the decoded corpus.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// The loader options produced an invalid dataset configuration.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    /// The validation holdout does not fit the training corpus.
    #[error("validation holdout of {requested} exceeds training corpus of {available}")]
    ValidationHoldout {
        /// Requested holdout size.
        requested: usize,
        /// Number of training examples actually available.
        available: usize,
    },
}

impl LoadError {
    /// Retrieve the inner [`CorpusErrorCode`] when the failure originated in a collaborator.
    #[must_use]
    pub const fn corpus_code(&self) -> Option<CorpusErrorCode> {
        match self {
            Self::Corpus(error) => Some(error.code()),
            _ => None,
        }
    }

    /// Retrieve the inner [`PoolErrorCode`] when the failure originated in pool construction.
    #[must_use]
    pub const fn pool_code(&self) -> Option<PoolErrorCode> {
        match self {
            Self::Pool(error) => Some(error.code()),
            _ => None,
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, PoolError>;
