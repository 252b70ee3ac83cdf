use camino::Utf8PathBuf;

use crate::error::MipError;

pub const DEFAULT_THRESHOLD: f64 = 0.10;
pub const DEFAULT_WORKERS: usize = 8;
pub const DEFAULT_OUTPUT_PREFIX: &str = "MIP_FUNCTIONS";

/// Validated configuration for one function-search run.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub corpus_dir: Utf8PathBuf,
    pub threshold: f64,
    pub workers: usize,
    pub output_prefix: String,
}

impl SearchOptions {
    /// Apply defaults and reject out-of-range values up front, before any
    /// corpus file is touched.
    pub fn resolve(
        corpus_dir: Utf8PathBuf,
        threshold: Option<f64>,
        workers: Option<usize>,
        output_prefix: Option<String>,
    ) -> Result<Self, MipError> {
        let threshold = threshold.unwrap_or(DEFAULT_THRESHOLD);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(MipError::InvalidThreshold(threshold));
        }

        let workers = workers.unwrap_or(DEFAULT_WORKERS);
        if workers == 0 {
            return Err(MipError::InvalidWorkerCount(workers));
        }

        Ok(Self {
            corpus_dir,
            threshold,
            workers,
            output_prefix: output_prefix.unwrap_or_else(|| DEFAULT_OUTPUT_PREFIX.to_string()),
        })
    }
}
