use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;

use crate::domain::{AlignmentRecord, FunctionToken};
use crate::error::MipError;
use crate::search::FunctionMatch;

/// Header contract for the merged TM-align table.
pub const ALIGNMENT_HEADER: [&str; 13] = [
    "chain_1_name",
    "chain1_chain",
    "chain1_model",
    "chain1_length",
    "chain_2_name",
    "chain2_chain",
    "chain2_model",
    "chain2_length",
    "aligned_length",
    "aligned_length_rmsd",
    "aligned_length_seq_ident",
    "tm_score_norm_chain1",
    "tm_score_norm_chain2",
];

/// Header contract for per-function match tables.
pub const FUNCTION_HEADER: [&str; 4] = ["MIP_ID", "DeepFRI_Score", "GO/EC_ID", "GO/EC_desc"];

/// Write the merged alignment table. An empty record set is rejected here:
/// a table with no rows has nothing to anchor its header to.
pub fn write_alignment_csv(path: &Utf8Path, records: &[AlignmentRecord]) -> Result<(), MipError> {
    if records.is_empty() {
        return Err(MipError::EmptyTable(path.to_owned()));
    }

    let mut writer = csv::Writer::from_path(path.as_std_path())
        .map_err(|err| MipError::CsvWrite(err.to_string()))?;
    writer
        .write_record(ALIGNMENT_HEADER)
        .map_err(|err| MipError::CsvWrite(err.to_string()))?;

    for rec in records {
        writer
            .write_record([
                rec.chain1.name.clone(),
                rec.chain1.chain.clone(),
                rec.chain1.model.clone(),
                rec.chain1_length.to_string(),
                rec.chain2.name.clone(),
                rec.chain2.chain.clone(),
                rec.chain2.model.clone(),
                rec.chain2_length.to_string(),
                rec.aligned_length.to_string(),
                rec.aligned_length_rmsd.to_string(),
                rec.aligned_length_seq_ident.to_string(),
                rec.tm_score_norm_chain1.to_string(),
                rec.tm_score_norm_chain2.to_string(),
            ])
            .map_err(|err| MipError::CsvWrite(err.to_string()))?;
    }
    writer
        .flush()
        .map_err(|err| MipError::CsvWrite(err.to_string()))?;

    info!(rows = records.len(), path = %path, "wrote alignment table");
    Ok(())
}

/// Output filename for one resolved function at one threshold.
pub fn function_csv_path(prefix: &str, token: &FunctionToken, threshold: f64) -> Utf8PathBuf {
    Utf8PathBuf::from(format!(
        "{prefix}_{}_{}_{threshold}.csv",
        token.ontology, token.identifier
    ))
}

/// Write one function's match table in merge order, no re-sort. Zero matches
/// still produce a header-only file.
pub fn write_function_csv(
    path: &Utf8Path,
    token: &FunctionToken,
    description: &str,
    matches: &[FunctionMatch],
) -> Result<(), MipError> {
    let mut writer = csv::Writer::from_path(path.as_std_path())
        .map_err(|err| MipError::CsvWrite(err.to_string()))?;
    writer
        .write_record(FUNCTION_HEADER)
        .map_err(|err| MipError::CsvWrite(err.to_string()))?;

    for m in matches {
        writer
            .write_record([
                m.entity_id.clone(),
                m.score.to_string(),
                token.identifier.clone(),
                description.to_string(),
            ])
            .map_err(|err| MipError::CsvWrite(err.to_string()))?;
    }
    writer
        .flush()
        .map_err(|err| MipError::CsvWrite(err.to_string()))?;

    info!(rows = matches.len(), path = %path, "wrote function table");
    Ok(())
}
