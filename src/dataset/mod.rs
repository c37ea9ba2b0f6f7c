/// Dataset manifests and row selection
///
/// This module handles:
/// - Reading and atomically writing CSV manifests (manifest.rs)
/// - Validated row ranges and on-disk row resolution (rows.rs)

pub mod manifest;
pub mod rows;

pub use manifest::{Manifest, PATH_COLUMN};
pub use rows::{expand_home, load_rows, DatasetRow, RowRange};
