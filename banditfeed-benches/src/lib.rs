//! Benchmark support library for the banditfeed pipeline.
//!
//! Provides deterministic synthetic corpora so benchmarks exercise pool
//! extraction, scene composition, and the bandit simulators without any
//! network or filesystem access.

pub mod source;
