/// Row selection for a capture session
///
/// Loads a contiguous range of manifest rows and resolves each one against
/// the local data root. Every resolved image must exist before a session
/// starts.

use std::path::{Path, PathBuf};

use super::manifest::Manifest;
use crate::{Error, Result};

/// A half-open range of manifest rows, `[start, end)`
///
/// `end = None` selects through the last row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    start: usize,
    end: Option<usize>,
}

impl RowRange {
    /// Validate a row range. `end` must be strictly greater than `start`.
    pub fn new(start: usize, end: Option<usize>) -> Result<Self> {
        if let Some(end) = end {
            if end <= start {
                return Err(Error::InvalidRange { start, end });
            }
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> Option<usize> {
        self.end
    }

    /// Concrete `[start, end)` bounds clamped to a table of `len` rows
    pub fn bounds(&self, len: usize) -> (usize, usize) {
        let end = self.end.unwrap_or(len).min(len);
        let start = self.start.min(end);
        (start, end)
    }

    /// Number of rows the range asks for in a table of `len` rows,
    /// without clamping an explicit end
    pub fn requested_len(&self, len: usize) -> usize {
        self.end.unwrap_or(len).saturating_sub(self.start)
    }
}

/// One manifest row scheduled for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRow {
    /// Absolute row index in the source manifest
    pub sequence: u64,
    /// Path as listed in the manifest, relative to the data root
    pub original_path: PathBuf,
    /// `data_dir / original_path`
    pub resolved_path: PathBuf,
}

/// Expand a leading `~` to the user's home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

/// Load the rows of `csv_path` within `range`, resolved against `data_dir`
///
/// # Errors
/// * `DataNotFound` - the manifest cannot be opened
/// * `MissingImage` - a resolved image does not exist
pub fn load_rows(csv_path: &Path, data_dir: &Path, range: RowRange) -> Result<Vec<DatasetRow>> {
    let data_dir = expand_home(data_dir);
    let manifest = Manifest::open(&expand_home(csv_path))?;

    let rows: Vec<DatasetRow> = manifest
        .select(range)
        .map(|(index, path)| {
            let original_path = PathBuf::from(path);
            DatasetRow {
                sequence: index as u64,
                resolved_path: data_dir.join(&original_path),
                original_path,
            }
        })
        .collect();

    // Check that all images in range exist
    if let Some(missing) = rows.iter().find(|row| !row.resolved_path.exists()) {
        return Err(Error::MissingImage(missing.resolved_path.clone()));
    }

    if rows.is_empty() {
        tracing::warn!(
            start = range.start(),
            table_rows = manifest.len(),
            "row range selects no rows"
        );
    } else {
        tracing::info!(
            rows = rows.len(),
            first = rows[0].sequence,
            "loaded dataset rows"
        );
    }

    Ok(rows)
}
