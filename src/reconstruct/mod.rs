/// Dataset reconstruction from a capture export
///
/// This module handles:
/// - Decoding a flat directory of exported photos (export.rs)
/// - Ordering and cross-checking them against the source rows (validate.rs)
/// - Copying the photos and publishing the new manifest (job.rs)

pub mod export;
pub mod job;
pub mod validate;

pub use export::{scan_export_dir, ReconstructionRecord};
pub use job::{reconstruct, ReconstructConfig, ReconstructSummary, DEFAULT_COPY_CONCURRENCY};
pub use validate::{check_correspondence, order_records, same_path};
