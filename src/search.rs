use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use tracing::info;

use crate::domain::{FunctionToken, Ontology};
use crate::error::MipError;
use crate::shard;

/// One entity whose score at a token's column cleared the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionMatch {
    pub entity_id: String,
    pub score: f64,
}

/// Matches per requested token, merged across all shards of an ontology.
pub type MatchTable = HashMap<FunctionToken, Vec<FunctionMatch>>;

/// Everything one worker task needs, owned and immutable: the tokens of one
/// ontology, the threshold, and the shard to scan.
#[derive(Debug, Clone)]
struct SearchTask {
    tokens: Vec<FunctionToken>,
    threshold: f64,
    path: Utf8PathBuf,
}

impl SearchTask {
    /// Load the shard, scan every row at each token's column, collect rows
    /// with score >= threshold (inclusive bound).
    fn run(&self) -> Result<MatchTable, MipError> {
        let shard = shard::read_shard(&self.path)?;
        let mut found: MatchTable = HashMap::new();

        for token in &self.tokens {
            let matches = found.entry(token.clone()).or_default();
            for (row, entity_id) in shard.entity_ids.iter().enumerate() {
                let Some(&score) = shard.scores[row].get(token.column) else {
                    return Err(MipError::ShardDecode {
                        path: self.path.clone(),
                        message: format!(
                            "column {} for {} out of range",
                            token.column, token.identifier
                        ),
                    });
                };
                if score >= self.threshold {
                    matches.push(FunctionMatch {
                        entity_id: entity_id.clone(),
                        score,
                    });
                }
            }
        }
        Ok(found)
    }
}

/// Fans one task per shard file out over a bounded worker pool, one ontology
/// at a time, and merges the partial results per token.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    threshold: f64,
    workers: usize,
}

impl SearchEngine {
    pub fn new(threshold: f64, workers: usize) -> Self {
        Self { threshold, workers }
    }

    /// Search the corpus for every resolved token. Ontologies are processed
    /// sequentially, each one's pool fully drained before the next starts,
    /// bounding peak memory to one ontology's in-flight shards. Any shard
    /// failure aborts the run. Match set membership is deterministic; row
    /// order within a token follows shard order.
    pub fn search(
        &self,
        corpus_dir: &Utf8Path,
        tokens: &[FunctionToken],
    ) -> Result<MatchTable, MipError> {
        // Zero-match tokens still get an entry so the emitter writes a
        // header-only table for them.
        let mut merged: MatchTable = tokens
            .iter()
            .map(|token| (token.clone(), Vec::new()))
            .collect();

        for ontology in Ontology::ALL {
            let ontology_tokens: Vec<FunctionToken> = tokens
                .iter()
                .filter(|token| token.ontology == ontology)
                .cloned()
                .collect();
            if ontology_tokens.is_empty() {
                continue;
            }

            for token in &ontology_tokens {
                info!(
                    function = %token.identifier,
                    ontology = %ontology,
                    "searching"
                );
            }

            let paths = shard::shard_paths(corpus_dir, ontology)?;
            let partials = self.run_tasks(&ontology_tokens, &paths)?;
            for partial in partials {
                for (token, mut matches) in partial {
                    merged
                        .entry(token)
                        .or_default()
                        .append(&mut matches);
                }
            }
        }

        Ok(merged)
    }

    fn run_tasks(
        &self,
        tokens: &[FunctionToken],
        paths: &[Utf8PathBuf],
    ) -> Result<Vec<MatchTable>, MipError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|err| MipError::Filesystem(format!("spawn worker pool: {err}")))?;

        let tasks: Vec<SearchTask> = paths
            .iter()
            .map(|path| SearchTask {
                tokens: tokens.to_vec(),
                threshold: self.threshold,
                path: path.clone(),
            })
            .collect();

        pool.install(|| tasks.par_iter().map(SearchTask::run).collect())
    }
}
