use std::fs::{self, File};
use std::io::BufReader;

use camino::{Utf8Path, Utf8PathBuf};
use flate2::read::GzDecoder;
use serde::Deserialize;
use tracing::info;

use crate::domain::Ontology;
use crate::error::MipError;

/// Shard filenames follow the supporting-dataset convention
/// `DeepFRI_MIP_<batch>_<ONT>_pred_scores.json.gz`. Batch 00000000 doubles
/// as the catalogue for its ontology.
const SHARD_PREFIX: &str = "DeepFRI_MIP_";
const REFERENCE_BATCH: &str = "00000000";

/// One shard's worth of predictions: entity ids index-aligned with the rows
/// of the score matrix. Loaded, searched, discarded per worker task.
#[derive(Debug, Clone)]
pub struct AnnotationShard {
    pub entity_ids: Vec<String>,
    pub scores: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct ShardPayload {
    pdb_chains: Vec<String>,
    #[serde(rename = "Y_hat")]
    y_hat: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct CataloguePayload {
    goterms: Vec<String>,
    gonames: Vec<String>,
}

/// Decode one gzip-compressed JSON shard and check the id/row alignment
/// invariant. A ragged matrix or an id/row count mismatch means the file is
/// corrupt, not partially usable.
pub fn read_shard(path: &Utf8Path) -> Result<AnnotationShard, MipError> {
    info!(path = %path, "loading shard");
    let payload: ShardPayload = read_gz_json(path)?;

    if payload.pdb_chains.len() != payload.y_hat.len() {
        return Err(MipError::ShardDecode {
            path: path.to_owned(),
            message: format!(
                "{} entity ids but {} score rows",
                payload.pdb_chains.len(),
                payload.y_hat.len()
            ),
        });
    }
    if let Some(width) = payload.y_hat.first().map(Vec::len) {
        if let Some(bad) = payload.y_hat.iter().position(|row| row.len() != width) {
            return Err(MipError::ShardDecode {
                path: path.to_owned(),
                message: format!("score row {bad} has ragged width"),
            });
        }
    }

    Ok(AnnotationShard {
        entity_ids: payload.pdb_chains,
        scores: payload.y_hat,
    })
}

/// Decode one ontology's catalogue file into index-aligned identifier and
/// description lists. Index k here is column k in every shard of the
/// ontology.
pub fn read_catalogue_file(path: &Utf8Path) -> Result<(Vec<String>, Vec<String>), MipError> {
    let payload: CataloguePayload = read_gz_json(path)?;
    if payload.goterms.len() != payload.gonames.len() {
        return Err(MipError::ShardDecode {
            path: path.to_owned(),
            message: format!(
                "{} identifiers but {} descriptions",
                payload.goterms.len(),
                payload.gonames.len()
            ),
        });
    }
    Ok((payload.goterms, payload.gonames))
}

fn read_gz_json<T: serde::de::DeserializeOwned>(path: &Utf8Path) -> Result<T, MipError> {
    if !path.as_std_path().exists() {
        return Err(MipError::ShardNotFound(path.to_owned()));
    }
    let file = File::open(path.as_std_path())
        .map_err(|err| MipError::Filesystem(format!("open {path}: {err}")))?;
    let decoder = GzDecoder::new(BufReader::new(file));
    serde_json::from_reader(decoder).map_err(|err| MipError::ShardDecode {
        path: path.to_owned(),
        message: err.to_string(),
    })
}

/// Path of the designated reference/catalogue shard for one ontology.
pub fn reference_path(corpus_dir: &Utf8Path, ontology: Ontology) -> Utf8PathBuf {
    corpus_dir.join(format!(
        "{SHARD_PREFIX}{REFERENCE_BATCH}_{ontology}_pred_scores.json.gz"
    ))
}

/// All shard paths for one ontology, sorted by filename so dispatch order
/// does not depend on directory iteration order.
pub fn shard_paths(corpus_dir: &Utf8Path, ontology: Ontology) -> Result<Vec<Utf8PathBuf>, MipError> {
    let suffix = format!("_{ontology}_pred_scores.json.gz");
    let entries = fs::read_dir(corpus_dir.as_std_path())
        .map_err(|err| MipError::Filesystem(format!("read dir {corpus_dir}: {err}")))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| MipError::Filesystem(err.to_string()))?;
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if name.starts_with(SHARD_PREFIX) && name.ends_with(&suffix) {
            paths.push(corpus_dir.join(name));
        }
    }
    paths.sort();
    Ok(paths)
}
