/// Export directory scanning
///
/// The capture device's photos are copied off the device into one flat
/// directory. Every file in it must carry an encoded capture filename.

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::codec;
use crate::{Error, Result};

/// One exported photo and the row identity decoded from its name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconstructionRecord {
    pub sequence: u64,
    pub decoded_path: PathBuf,
    pub source_file: PathBuf,
}

/// Decode every file directly inside `dir`
///
/// Subdirectories are skipped. The first file whose name does not decode
/// fails the whole scan.
pub fn scan_export_dir(dir: &Path) -> Result<Vec<ReconstructionRecord>> {
    fs::metadata(dir).map_err(|source| Error::DataNotFound {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();

        if entry.file_type().is_dir() {
            tracing::warn!(path = %path.display(), "skipping subdirectory in export folder");
            continue;
        }

        let name = entry.file_name().to_str().ok_or_else(|| Error::MalformedFilename {
            name: entry.file_name().to_string_lossy().to_string(),
            reason: "file name is not valid UTF-8".to_string(),
        })?;

        let decoded = codec::decode(name)?;
        records.push(ReconstructionRecord {
            sequence: decoded.sequence,
            decoded_path: decoded.path,
            source_file: path.to_path_buf(),
        });
    }

    tracing::info!(files = records.len(), dir = %dir.display(), "decoded export folder");
    Ok(records)
}
