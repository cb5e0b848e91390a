//! Persist search results under unique names.

use crate::error::PipelineError;
use crate::types::ResultImage;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const DEFAULT_RESULTS_DIR: &str = "./images/results";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Paths written, in result order.
    Written(Vec<PathBuf>),
    /// Nothing matched; the results directory was not touched.
    NoFacesFound,
}

/// Write every result as `<uuid>.png` in `results_dir`, creating it if needed.
pub fn write_results(
    results: &[ResultImage],
    results_dir: &Path,
) -> Result<WriteOutcome, PipelineError> {
    if results.is_empty() {
        return Ok(WriteOutcome::NoFacesFound);
    }

    std::fs::create_dir_all(results_dir).map_err(|source| PipelineError::Write {
        path: results_dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(results.len());
    for result in results {
        let path = results_dir.join(format!("{}.png", Uuid::new_v4()));
        result
            .image
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| PipelineError::Save {
                path: path.clone(),
                source,
            })?;
        tracing::debug!(
            path = %path.display(),
            external_image_id = %result.external_image_id,
            "result written"
        );
        written.push(path);
    }

    Ok(WriteOutcome::Written(written))
}
