use std::fs;

use camino::Utf8Path;
use tracing::debug;

use crate::domain::{AlignmentRecord, ChainDescriptor};
use crate::error::MipError;

/// A TM-align block begins with a banner line of asterisks.
const BANNER: &str = " *****";

// Line offsets within one block, relative to the banner line. These are the
// fixed grammar of the TM-align text output; changing any of them is a format
// change, not a tuning knob.
const CHAIN1_NAME_OFFSET: usize = 6;
const CHAIN2_NAME_OFFSET: usize = 7;
const CHAIN1_LENGTH_OFFSET: usize = 8;
const CHAIN2_LENGTH_OFFSET: usize = 9;
const ALIGN_SUMMARY_OFFSET: usize = 11;
const TM_SCORE_CHAIN1_OFFSET: usize = 12;
const TM_SCORE_CHAIN2_OFFSET: usize = 13;

/// Lines consumed per block, banner through the aligned-sequence dump.
const BLOCK_SPAN: usize = 19;

/// Parse one TM-align one-to-all log file into alignment records, in file
/// order. A single malformed block aborts the whole parse: downstream
/// sorting and emission assume fully populated records.
pub fn parse_log(path: &Utf8Path) -> Result<Vec<AlignmentRecord>, MipError> {
    let text = fs::read_to_string(path.as_std_path())
        .map_err(|err| MipError::Filesystem(format!("read {path}: {err}")))?;
    parse_log_text(&text, path)
}

/// Parse log text already in memory. `origin` is only used for error context.
pub fn parse_log_text(text: &str, origin: &Utf8Path) -> Result<Vec<AlignmentRecord>, MipError> {
    let lines: Vec<&str> = text.lines().collect();
    let mut records = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        if !lines[i].starts_with(BANNER) {
            i += 1;
            continue;
        }

        records.push(parse_block(&lines, i, origin)?);
        i += BLOCK_SPAN;
    }

    debug!(blocks = records.len(), path = %origin, "parsed TM-align log");
    Ok(records)
}

fn parse_block(
    lines: &[&str],
    start: usize,
    origin: &Utf8Path,
) -> Result<AlignmentRecord, MipError> {
    let chain1 = block_token(lines, start, CHAIN1_NAME_OFFSET, 3, origin)?
        .parse::<ChainDescriptor>()
        .map_err(|_| malformed(origin, start + CHAIN1_NAME_OFFSET, "chain descriptor"))?;
    let chain2 = block_token(lines, start, CHAIN2_NAME_OFFSET, 3, origin)?
        .parse::<ChainDescriptor>()
        .map_err(|_| malformed(origin, start + CHAIN2_NAME_OFFSET, "chain descriptor"))?;

    let chain1_length =
        parse_int(lines, start, CHAIN1_LENGTH_OFFSET, 3, "chain length", origin)?;
    let chain2_length =
        parse_int(lines, start, CHAIN2_LENGTH_OFFSET, 3, "chain length", origin)?;

    // `Aligned length= 92, RMSD=   4.77, Seq_ID=n_identical/n_aligned= 0.065`
    let aligned_length = parse_int(lines, start, ALIGN_SUMMARY_OFFSET, 2, "aligned length", origin)?;
    let aligned_length_rmsd = parse_float(lines, start, ALIGN_SUMMARY_OFFSET, 4, "RMSD", origin)?;
    let aligned_length_seq_ident =
        parse_float(lines, start, ALIGN_SUMMARY_OFFSET, 6, "sequence identity", origin)?;

    let tm_score_norm_chain1 =
        parse_float(lines, start, TM_SCORE_CHAIN1_OFFSET, 1, "TM-score", origin)?;
    let tm_score_norm_chain2 =
        parse_float(lines, start, TM_SCORE_CHAIN2_OFFSET, 1, "TM-score", origin)?;

    Ok(AlignmentRecord {
        chain1,
        chain1_length,
        chain2,
        chain2_length,
        aligned_length,
        aligned_length_rmsd,
        aligned_length_seq_ident,
        tm_score_norm_chain1,
        tm_score_norm_chain2,
    })
}

/// Fetch whitespace-delimited token `index` from the line at `start + offset`,
/// stripping a trailing comma left by the summary-line layout.
fn block_token<'a>(
    lines: &[&'a str],
    start: usize,
    offset: usize,
    index: usize,
    origin: &Utf8Path,
) -> Result<&'a str, MipError> {
    let line_no = start + offset;
    let line = lines
        .get(line_no)
        .ok_or_else(|| malformed(origin, line_no, "block truncated"))?;
    let token = line
        .split_whitespace()
        .nth(index)
        .ok_or_else(|| malformed(origin, line_no, "missing field"))?;
    Ok(token.trim_end_matches(','))
}

fn parse_int(
    lines: &[&str],
    start: usize,
    offset: usize,
    index: usize,
    what: &str,
    origin: &Utf8Path,
) -> Result<u32, MipError> {
    block_token(lines, start, offset, index, origin)?
        .parse()
        .map_err(|_| malformed(origin, start + offset, &format!("non-numeric {what}")))
}

fn parse_float(
    lines: &[&str],
    start: usize,
    offset: usize,
    index: usize,
    what: &str,
    origin: &Utf8Path,
) -> Result<f64, MipError> {
    block_token(lines, start, offset, index, origin)?
        .parse()
        .map_err(|_| malformed(origin, start + offset, &format!("non-numeric {what}")))
}

fn malformed(origin: &Utf8Path, line: usize, reason: &str) -> MipError {
    MipError::MalformedBlock {
        path: origin.to_owned(),
        line,
        reason: reason.to_string(),
    }
}

/// Sort records ascending by TM-score normalized by Chain_1 length. The sort
/// is stable so equal scores keep file order.
pub fn sort_by_tm_score(records: &mut [AlignmentRecord]) {
    records.sort_by(|a, b| {
        a.tm_score_norm_chain1
            .total_cmp(&b.tm_score_norm_chain1)
    });
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use camino::Utf8PathBuf;

    use super::*;

    fn block(
        chain1: &str,
        chain2: &str,
        len1: u32,
        len2: u32,
        summary: &str,
        tm1: f64,
        tm2: f64,
    ) -> String {
        format!(
            " *********************************************************************\n\
             * TM-align (Version 20210224): protein structure alignment          *\n\
             * References: Y Zhang, J Skolnick. Nucl Acids Res 33, 2302-9 (2005) *\n\
             * Please email comments and suggestions to yangzhanglab@umich.edu   *\n\
             *********************************************************************\n\
             \n\
             Name of Chain_1: {chain1} (to be superimposed onto Chain_2)\n\
             Name of Chain_2: {chain2}\n\
             Length of Chain_1: {len1} residues\n\
             Length of Chain_2: {len2} residues\n\
             \n\
             {summary}\n\
             TM-score= {tm1:.5} (if normalized by length of Chain_1, i.e., LN={len1}, d0=4.58)\n\
             TM-score= {tm2:.5} (if normalized by length of Chain_2, i.e., LN={len2}, d0=10.24)\n\
             (You should use TM-score normalized by length of the reference structure)\n\
             \n\
             FDFNKNSDLSNW------TIVN-DVIMGGVS\n\
             ..   .  : :..::::\n\
             ------------DVVVRLVY--DS--R-ADA\n"
        )
    }

    fn origin() -> Utf8PathBuf {
        Utf8PathBuf::from("test.log")
    }

    #[test]
    fn parses_reference_block() {
        let text = block(
            "../ros_models_grad_ordered/foo.pdb:1:A",
            "bar.pdb:1:B",
            151,
            930,
            "Aligned length= 92, RMSD=   4.77, Seq_ID=n_identical/n_aligned= 0.065",
            0.36347,
            0.08379,
        );
        let records = parse_log_text(&text, &origin()).unwrap();
        assert_eq!(records.len(), 1);

        let rec = &records[0];
        assert_eq!(rec.chain1.name, "../ros_models_grad_ordered/foo.pdb");
        assert_eq!(rec.chain1.model, "1");
        assert_eq!(rec.chain1.chain, "A");
        assert_eq!(rec.chain2.name, "bar.pdb");
        assert_eq!(rec.chain2.chain, "B");
        assert_eq!(rec.chain1_length, 151);
        assert_eq!(rec.chain2_length, 930);
        assert_eq!(rec.aligned_length, 92);
        assert_eq!(rec.aligned_length_rmsd, 4.77);
        assert_eq!(rec.aligned_length_seq_ident, 0.065);
        assert_eq!(rec.tm_score_norm_chain1, 0.36347);
        assert_eq!(rec.tm_score_norm_chain2, 0.08379);
    }

    #[test]
    fn parses_two_blocks_with_banners_at_0_and_19() {
        let text = format!(
            "{}{}",
            block(
                "foo.pdb:1:A",
                "bar.pdb:1:B",
                151,
                930,
                "Aligned length= 92, RMSD=   4.77, Seq_ID=n_identical/n_aligned= 0.065",
                0.36347,
                0.08379,
            ),
            block(
                "baz.pdb:2:C",
                "qux.pdb:1:A",
                88,
                120,
                "Aligned length= 40, RMSD=   2.10, Seq_ID=n_identical/n_aligned= 0.250",
                0.51000,
                0.44000,
            ),
        );
        // Each fixture block is exactly the span the cursor skips.
        assert_eq!(text.lines().count(), 38);

        let records = parse_log_text(&text, &origin()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].chain1.name, "foo.pdb");
        assert_eq!(records[1].chain1.name, "baz.pdb");
        for rec in &records {
            assert!(rec.aligned_length_seq_ident >= 0.0);
            assert!(rec.aligned_length_seq_ident <= 1.0);
        }
    }

    #[test]
    fn skips_leading_noise_lines() {
        let text = format!(
            "some preamble\nanother line\n{}",
            block(
                "foo.pdb:1:A",
                "bar.pdb:1:B",
                151,
                930,
                "Aligned length= 92, RMSD=   4.77, Seq_ID=n_identical/n_aligned= 0.065",
                0.36347,
                0.08379,
            ),
        );
        let records = parse_log_text(&text, &origin()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn malformed_descriptor_aborts_parse() {
        let text = block(
            "foo.pdb-no-triple",
            "bar.pdb:1:B",
            151,
            930,
            "Aligned length= 92, RMSD=   4.77, Seq_ID=n_identical/n_aligned= 0.065",
            0.36347,
            0.08379,
        );
        let err = parse_log_text(&text, &origin()).unwrap_err();
        assert_matches!(err, MipError::MalformedBlock { line: 6, .. });
    }

    #[test]
    fn non_numeric_summary_aborts_parse() {
        let text = block(
            "foo.pdb:1:A",
            "bar.pdb:1:B",
            151,
            930,
            "Aligned length= NaNope, RMSD=   4.77, Seq_ID=n_identical/n_aligned= 0.065",
            0.36347,
            0.08379,
        );
        let err = parse_log_text(&text, &origin()).unwrap_err();
        assert_matches!(err, MipError::MalformedBlock { line: 11, .. });
    }

    #[test]
    fn truncated_block_aborts_parse() {
        let full = block(
            "foo.pdb:1:A",
            "bar.pdb:1:B",
            151,
            930,
            "Aligned length= 92, RMSD=   4.77, Seq_ID=n_identical/n_aligned= 0.065",
            0.36347,
            0.08379,
        );
        let truncated: String = full
            .lines()
            .take(10)
            .map(|l| format!("{l}\n"))
            .collect();
        let err = parse_log_text(&truncated, &origin()).unwrap_err();
        assert_matches!(err, MipError::MalformedBlock { .. });
    }

    #[test]
    fn empty_log_yields_no_records() {
        let records = parse_log_text("", &origin()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn sort_is_ascending_and_stable() {
        let make = |name: &str, tm1: f64| AlignmentRecord {
            chain1: ChainDescriptor {
                name: name.to_string(),
                model: "1".to_string(),
                chain: "A".to_string(),
            },
            chain1_length: 100,
            chain2: ChainDescriptor {
                name: "ref.pdb".to_string(),
                model: "1".to_string(),
                chain: "A".to_string(),
            },
            chain2_length: 100,
            aligned_length: 50,
            aligned_length_rmsd: 3.0,
            aligned_length_seq_ident: 0.5,
            tm_score_norm_chain1: tm1,
            tm_score_norm_chain2: tm1,
        };

        let mut records = vec![
            make("c.pdb", 0.9),
            make("a.pdb", 0.3),
            make("tie1.pdb", 0.5),
            make("tie2.pdb", 0.5),
        ];
        sort_by_tm_score(&mut records);

        for pair in records.windows(2) {
            assert!(pair[0].tm_score_norm_chain1 <= pair[1].tm_score_norm_chain1);
        }
        assert_eq!(records[1].chain1.name, "tie1.pdb");
        assert_eq!(records[2].chain1.name, "tie2.pdb");
    }
}
