/// Ordering and correspondence checks
///
/// Fail-fast: the first inconsistency stops reconstruction before anything
/// is copied or written.

use std::path::{Component, Path, PathBuf};

use super::export::ReconstructionRecord;
use crate::dataset::{Manifest, RowRange};
use crate::{Error, Result};

/// Sort records by sequence, rejecting duplicates
pub fn order_records(mut records: Vec<ReconstructionRecord>) -> Result<Vec<ReconstructionRecord>> {
    records.sort_by_key(|r| r.sequence);

    if let Some(pair) = records.windows(2).find(|w| w[0].sequence == w[1].sequence) {
        return Err(Error::DuplicateSequence {
            sequence: pair[0].sequence,
            first: pair[0].source_file.clone(),
            second: pair[1].source_file.clone(),
        });
    }
    Ok(records)
}

/// Compare two relative paths component by component
pub fn same_path(a: &Path, b: &Path) -> bool {
    significant_components(a) == significant_components(b)
}

fn significant_components(path: &Path) -> Vec<Component<'_>> {
    path.components()
        .filter(|c| *c != Component::CurDir)
        .collect()
}

/// Check that `records` (already ordered) map one-to-one onto the rows
/// `range` of `manifest`
///
/// The error names the first position, relative to the range start, where
/// the export and the source disagree.
pub fn check_correspondence(
    records: &[ReconstructionRecord],
    manifest: &Manifest,
    range: RowRange,
) -> Result<()> {
    let requested = range.requested_len(manifest.len());
    let positions = requested.max(records.len());

    for index in 0..positions {
        let expected = if index < requested {
            manifest.path_at(range.start() + index).map(PathBuf::from)
        } else {
            None
        };
        let found = records.get(index).map(|r| r.decoded_path.clone());

        let matches = match (&expected, &found) {
            (Some(e), Some(f)) => same_path(e, f),
            _ => false,
        };
        if !matches {
            return Err(Error::CorrespondenceMismatch {
                index,
                expected,
                found,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn record(seq: u64, path: &str) -> ReconstructionRecord {
        ReconstructionRecord {
            sequence: seq,
            decoded_path: PathBuf::from(path),
            source_file: PathBuf::from(format!("/export/{}__0__{}", seq, path.replace('/', "__"))),
        }
    }

    fn manifest(dir: &TempDir, rows: &[&str]) -> Manifest {
        let path = dir.path().join("src.csv");
        let mut body = String::from("Path\n");
        for row in rows {
            body.push_str(row);
            body.push('\n');
        }
        fs::write(&path, body).unwrap();
        Manifest::open(&path).unwrap()
    }

    #[test]
    fn test_order_sorts_by_sequence() {
        let ordered = order_records(vec![record(5, "c"), record(3, "a"), record(4, "b")]).unwrap();
        let seqs: Vec<u64> = ordered.iter().map(|r| r.sequence).collect();
        assert_eq!(seqs, vec![3, 4, 5]);
    }

    #[test]
    fn test_order_rejects_duplicates() {
        let err = order_records(vec![record(4, "b"), record(3, "a"), record(4, "b2")]).unwrap_err();
        assert!(matches!(err, Error::DuplicateSequence { sequence: 4, .. }));
    }

    #[test]
    fn test_same_path_ignores_leading_dot() {
        assert!(same_path(Path::new("./a/b.png"), Path::new("a/b.png")));
        assert!(!same_path(Path::new("a/b.png"), Path::new("a/c.png")));
        assert!(!same_path(Path::new("a/b.png"), Path::new("b.png")));
    }

    #[test]
    fn test_correspondence_ok() {
        let dir = TempDir::new().unwrap();
        let m = manifest(&dir, &["r0", "r1", "r2", "v/r3", "v/r4", "v/r5", "r6"]);
        let records = vec![record(3, "v/r3"), record(4, "v/r4"), record(5, "v/r5")];
        check_correspondence(&records, &m, RowRange::new(3, Some(6)).unwrap()).unwrap();
    }

    #[test]
    fn test_correspondence_names_first_mismatch() {
        let dir = TempDir::new().unwrap();
        let m = manifest(&dir, &["r0", "r1", "r2", "r3", "r4", "r5"]);
        let records = vec![record(3, "r3"), record(4, "r5"), record(5, "r5")];

        let err = check_correspondence(&records, &m, RowRange::new(3, Some(6)).unwrap()).unwrap_err();
        match err {
            Error::CorrespondenceMismatch {
                index,
                expected,
                found,
            } => {
                assert_eq!(index, 1);
                assert_eq!(expected, Some(PathBuf::from("r4")));
                assert_eq!(found, Some(PathBuf::from("r5")));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_correspondence_missing_photo() {
        let dir = TempDir::new().unwrap();
        let m = manifest(&dir, &["r0", "r1", "r2"]);
        let records = vec![record(0, "r0"), record(1, "r1")];

        let err = check_correspondence(&records, &m, RowRange::new(0, Some(3)).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            Error::CorrespondenceMismatch { index: 2, found: None, .. }
        ));
    }

    #[test]
    fn test_correspondence_extra_photo() {
        let dir = TempDir::new().unwrap();
        let m = manifest(&dir, &["r0", "r1", "r2"]);
        let records = vec![record(0, "r0"), record(1, "r1"), record(2, "r2")];

        let err = check_correspondence(&records, &m, RowRange::new(0, Some(2)).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            Error::CorrespondenceMismatch { index: 2, expected: None, .. }
        ));
    }

    #[test]
    fn test_correspondence_range_past_table() {
        let dir = TempDir::new().unwrap();
        let m = manifest(&dir, &["r0", "r1"]);
        let records = vec![record(1, "r1"), record(2, "r2")];

        let err = check_correspondence(&records, &m, RowRange::new(1, Some(3)).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            Error::CorrespondenceMismatch { index: 1, expected: None, .. }
        ));
    }

    #[test]
    fn test_correspondence_open_ended_range() {
        let dir = TempDir::new().unwrap();
        let m = manifest(&dir, &["r0", "r1", "r2"]);
        let records = vec![record(1, "r1"), record(2, "r2")];
        check_correspondence(&records, &m, RowRange::new(1, None).unwrap()).unwrap();
    }
}
