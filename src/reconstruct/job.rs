/// Reconstruction job
///
/// Runs in three stages, each gated on the previous one:
/// 1. decode, order and validate every exported photo (blocking, off the runtime)
/// 2. copy photos into `dst_data_dir/dataset_name/...` concurrently
/// 3. write the rewritten manifest in one atomic step
///
/// Nothing is written when validation fails, and the manifest is not written
/// when any copy fails.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tokio::task;

use super::export::{scan_export_dir, ReconstructionRecord};
use super::validate::{check_correspondence, order_records};
use crate::dataset::{Manifest, RowRange};
use crate::{Error, Result};

/// Copies in flight at once
pub const DEFAULT_COPY_CONCURRENCY: usize = 16;

/// Everything needed to rebuild a dataset from an export folder
#[derive(Debug, Clone)]
pub struct ReconstructConfig {
    /// Flat folder of photos exported from the capture device
    pub export_dir: PathBuf,
    /// Manifest used during capture
    pub src_csv_path: PathBuf,
    /// Row range used during capture
    pub range: RowRange,
    /// Root under which `dataset_name/...` is created
    pub dst_data_dir: PathBuf,
    /// Prefix for every rewritten path, keeps the new dataset apart from the source
    pub dataset_name: String,
    /// Where the new manifest is written
    pub dst_csv_path: PathBuf,
    /// Copy photos; when false only the manifest is produced
    pub copy: bool,
    pub copy_concurrency: usize,
}

impl ReconstructConfig {
    /// Reject settings that would produce a broken dataset
    pub fn validate(&self) -> Result<()> {
        let mut components = Path::new(&self.dataset_name).components();
        let single_name = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_name || self.dataset_name.contains('/') || self.dataset_name.contains('\\') {
            return Err(Error::InvalidConfig(format!(
                "dataset name `{}` must be a single directory name",
                self.dataset_name
            )));
        }
        if self.copy_concurrency == 0 {
            return Err(Error::InvalidConfig(
                "copy concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Manifest path for a row of the new dataset
    fn rewrite_path(&self, original: &str) -> String {
        let mut parts = vec![self.dataset_name.clone()];
        parts.extend(Path::new(original).components().filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        }));
        parts.join("/")
    }

    fn destination(&self, record: &ReconstructionRecord) -> PathBuf {
        self.dst_data_dir
            .join(&self.dataset_name)
            .join(&record.decoded_path)
    }
}

/// Result of a successful reconstruction
#[derive(Debug, Clone, Serialize)]
pub struct ReconstructSummary {
    pub dataset_name: String,
    /// Validated rows in the new manifest
    pub rows: usize,
    /// Photos copied (0 when copying is disabled)
    pub copied: usize,
    pub manifest: PathBuf,
    pub finished_at: DateTime<Utc>,
}

/// Validated input for the write stages
struct Plan {
    records: Vec<ReconstructionRecord>,
    manifest: Manifest,
}

/// Rebuild a dataset from an export folder
pub async fn reconstruct(config: &ReconstructConfig) -> Result<ReconstructSummary> {
    config.validate()?;

    let plan = {
        let config = config.clone();
        task::spawn_blocking(move || plan_blocking(&config)).await??
    };

    let copied = if config.copy {
        copy_records(config, &plan.records).await?
    } else {
        tracing::info!("copying disabled, writing manifest only");
        0
    };

    let new_manifest = plan
        .manifest
        .subset_with_paths(config.range, |p| config.rewrite_path(p));
    {
        let dst = config.dst_csv_path.clone();
        task::spawn_blocking(move || new_manifest.write_atomic(&dst)).await??;
    }

    Ok(ReconstructSummary {
        dataset_name: config.dataset_name.clone(),
        rows: plan.records.len(),
        copied,
        manifest: config.dst_csv_path.clone(),
        finished_at: Utc::now(),
    })
}

/// Decode, order and validate the export against the source manifest
fn plan_blocking(config: &ReconstructConfig) -> Result<Plan> {
    let manifest = Manifest::open(&config.src_csv_path)?;
    let records = order_records(scan_export_dir(&config.export_dir)?)?;
    check_correspondence(&records, &manifest, config.range)?;

    tracing::info!(
        rows = records.len(),
        start = config.range.start(),
        "export matches source rows"
    );
    Ok(Plan { records, manifest })
}

async fn copy_records(config: &ReconstructConfig, records: &[ReconstructionRecord]) -> Result<usize> {
    let jobs: Vec<(PathBuf, PathBuf)> = records
        .iter()
        .map(|r| (r.source_file.clone(), config.destination(r)))
        .collect();
    let total = jobs.len();

    let copied: Vec<u64> = stream::iter(jobs)
        .map(|(from, to)| async move {
            if let Some(parent) = to.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let bytes = tokio::fs::copy(&from, &to).await?;
            tracing::debug!(from = %from.display(), to = %to.display(), bytes, "copied photo");
            Ok::<u64, Error>(bytes)
        })
        .buffer_unordered(config.copy_concurrency)
        .try_collect()
        .await?;

    tracing::info!(copied = copied.len(), total, "copied photos");
    Ok(copied.len())
}
