//! Compensation ledger: the ids created during a migration run, one file
//! per table, whitespace-separated. Written once after a table's uploads
//! finish and read once if the run has to be rolled back.

use crate::error::{Result, SiphonError};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Persist ids atomically: write a temp file, then rename it into place.
/// The rename doubles as the completion marker, so a crash mid-write
/// leaves the previous ledger (or none) rather than a truncated one.
pub fn write_ledger(path: &Path, ids: &[i64]) -> Result<()> {
    let content = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content).map_err(|err| SiphonError::file(&tmp, err))?;
    fs::rename(&tmp, path).map_err(|err| SiphonError::file(path, err))?;
    Ok(())
}

/// Read a ledger back. Empty fragments are ignored; a fragment that is
/// not an integer is logged and skipped so the remaining ids still get
/// rolled back.
pub fn read_ledger(path: &Path) -> Result<Vec<i64>> {
    let raw = fs::read_to_string(path).map_err(|err| SiphonError::file(path, err))?;
    let ids = raw
        .split_whitespace()
        .filter_map(|fragment| match fragment.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(ledger = %path.display(), fragment, "ignoring malformed ledger entry");
                None
            }
        })
        .collect();
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table1-new-ids.txt");
        write_ledger(&path, &[3, 7, 9]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "3 7 9");
        assert_eq!(read_ledger(&path).unwrap(), vec![3, 7, 9]);
        // no temp file left behind
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        write_ledger(&path, &[]).unwrap();
        assert_eq!(read_ledger(&path).unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn test_malformed_fragments_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.txt");
        fs::write(&path, "3  oops 9 ").unwrap();
        assert_eq!(read_ledger(&path).unwrap(), vec![3, 9]);
    }

    #[test]
    fn test_missing_ledger_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_ledger(&dir.path().join("absent.txt")).is_err());
    }

    #[test]
    fn test_rewrite_replaces_previous_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table1-new-ids.txt");
        write_ledger(&path, &[1, 2]).unwrap();
        write_ledger(&path, &[10]).unwrap();
        assert_eq!(read_ledger(&path).unwrap(), vec![10]);
    }
}
