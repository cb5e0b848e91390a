//! Index portrait faces into a collection.
//!
//! `Start → CollectionEnsured → IndexingImage* → Done`. Any failure other
//! than an already existing collection aborts the run; images after the
//! failing one are not attempted.

use crate::error::PipelineError;
use crate::service::{
    CollectionStatus, FaceRecognitionService, IndexFacesRequest, DEFAULT_INDEX_MAX_FACES,
};
use crate::throttle::Throttle;
use crate::types::CollectionId;
use std::path::Path;

#[derive(Debug, Clone, Copy)]
pub struct IndexOptions {
    /// Upper bound on faces indexed per image.
    pub max_faces: u32,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            max_faces: DEFAULT_INDEX_MAX_FACES,
        }
    }
}

/// Totals for a completed indexing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub images: usize,
    pub faces: usize,
}

pub struct IndexingPipeline<S, T> {
    service: S,
    throttle: T,
    options: IndexOptions,
}

impl<S: FaceRecognitionService, T: Throttle> IndexingPipeline<S, T> {
    pub fn new(service: S, throttle: T, options: IndexOptions) -> Self {
        Self {
            service,
            throttle,
            options,
        }
    }

    /// Create the collection, treating an existing one as success.
    pub fn ensure_collection(
        &self,
        collection_id: &CollectionId,
    ) -> Result<CollectionStatus, PipelineError> {
        let status = self.service.create_collection(collection_id)?;
        match status {
            CollectionStatus::Created => {
                tracing::info!(collection = %collection_id, "collection created");
            }
            CollectionStatus::AlreadyExists => {
                tracing::info!(collection = %collection_id, "collection already exists");
            }
        }
        Ok(status)
    }

    /// Index one image under its file name. Returns the number of faces the
    /// service reported as indexed.
    pub fn index_image(
        &self,
        collection_id: &CollectionId,
        path: &Path,
    ) -> Result<usize, PipelineError> {
        let external_image_id = external_image_id(path)?;
        let image = std::fs::read(path).map_err(|source| PipelineError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let faces = self.service.index_faces(&IndexFacesRequest {
            collection_id,
            image: &image,
            external_image_id,
            max_faces: self.options.max_faces,
        })?;

        tracing::info!(
            collection = %collection_id,
            path = %path.display(),
            external_image_id,
            faces = faces.len(),
            "indexed image"
        );
        Ok(faces.len())
    }

    /// Ensure the collection, then index `images` in order, pausing after each.
    pub fn run<P: AsRef<Path>>(
        &mut self,
        collection_id: &CollectionId,
        images: &[P],
    ) -> Result<IndexSummary, PipelineError> {
        self.ensure_collection(collection_id)?;

        let mut summary = IndexSummary::default();
        for path in images {
            summary.faces += self.index_image(collection_id, path.as_ref())?;
            summary.images += 1;
            self.throttle.pause();
        }

        tracing::info!(
            collection = %collection_id,
            images = summary.images,
            faces = summary.faces,
            "indexing complete"
        );
        Ok(summary)
    }
}

/// The file name used to label indexed faces.
fn external_image_id(path: &Path) -> Result<&str, PipelineError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| PipelineError::InvalidFileName(path.to_path_buf()))
}
