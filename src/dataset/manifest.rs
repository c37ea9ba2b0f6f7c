/// CSV dataset manifest
///
/// A manifest is a table with a header row and at least a `Path` column.
/// Row order is significant: a row's absolute index is its sequence number.
/// Columns other than `Path` (labels, metadata) are carried through untouched.

use csv::StringRecord;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use super::rows::RowRange;
use crate::{Error, Result};

/// Name of the column holding image paths relative to a data root
pub const PATH_COLUMN: &str = "Path";

/// An in-memory manifest
#[derive(Debug, Clone)]
pub struct Manifest {
    source: PathBuf,
    headers: StringRecord,
    path_index: usize,
    records: Vec<StringRecord>,
}

impl Manifest {
    /// Read a manifest from disk
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::DataNotFound {
            path: path.to_path_buf(),
            source,
        })?;

        let mut reader = csv::Reader::from_reader(file);
        let headers = reader.headers()?.clone();
        let path_index = headers
            .iter()
            .position(|h| h.trim() == PATH_COLUMN)
            .ok_or_else(|| Error::MissingPathColumn(path.to_path_buf()))?;

        let records = reader
            .records()
            .collect::<std::result::Result<Vec<_>, csv::Error>>()?;

        tracing::debug!(path = %path.display(), rows = records.len(), "loaded manifest");

        Ok(Self {
            source: path.to_path_buf(),
            headers,
            path_index,
            records,
        })
    }

    /// Where this manifest was read from (empty for derived manifests)
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    /// Number of data rows (header excluded)
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Path column of the row at absolute `index`
    pub fn path_at(&self, index: usize) -> Option<&str> {
        self.records
            .get(index)
            .and_then(|r| r.get(self.path_index))
    }

    /// Rows in `range` paired with their absolute index
    ///
    /// The range is clamped to the table, so an end past the last row
    /// selects up to the end.
    pub fn select(&self, range: RowRange) -> impl Iterator<Item = (usize, &str)> + '_ {
        let (start, end) = range.bounds(self.len());
        (start..end).filter_map(move |i| self.path_at(i).map(|p| (i, p)))
    }

    /// Build a new manifest holding the rows in `range`, with the path
    /// column replaced by `rewrite(original_path)`
    pub fn subset_with_paths<F>(&self, range: RowRange, rewrite: F) -> Manifest
    where
        F: Fn(&str) -> String,
    {
        let (start, end) = range.bounds(self.len());
        let records = self.records[start..end]
            .iter()
            .map(|record| {
                let new_path = rewrite(record.get(self.path_index).unwrap_or_default());
                record
                    .iter()
                    .enumerate()
                    .map(|(i, field)| {
                        if i == self.path_index {
                            new_path.as_str()
                        } else {
                            field
                        }
                    })
                    .collect::<StringRecord>()
            })
            .collect();

        Manifest {
            source: PathBuf::new(),
            headers: self.headers.clone(),
            path_index: self.path_index,
            records,
        }
    }

    /// Write the manifest to `dst`
    ///
    /// The table is written to a hidden sibling first and renamed into place,
    /// so `dst` either holds the complete manifest or is left untouched.
    pub fn write_atomic(&self, dst: &Path) -> Result<()> {
        let parent = match dst.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let file_name = dst
            .file_name()
            .ok_or_else(|| Error::InvalidConfig(format!("{} is not a file path", dst.display())))?;
        let tmp = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));

        if let Err(e) = self.write_to(&tmp) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, dst)?;

        tracing::info!(path = %dst.display(), rows = self.len(), "wrote manifest");
        Ok(())
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.headers)?;
        for record in &self.records {
            writer.write_record(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}
