//! Search query images against a collection and compose result images.
//!
//! For every detected face: crop, search the collection with the crop, and
//! for every match outline the match on the stored portrait and paste the
//! query face on its upper left. Results are concatenated in input order:
//! query images as given, faces and matches as the service returns them.

use crate::compositor::{
    crop_by_bounding_box, draw_bounding_box, encode_png, paste_on_upper_left,
};
use crate::error::PipelineError;
use crate::service::{
    FaceRecognitionService, SearchFacesRequest, SearchOutcome, DEFAULT_MATCH_THRESHOLD,
    DEFAULT_SEARCH_MAX_FACES,
};
use crate::throttle::Throttle;
use crate::types::{CollectionId, FaceRecord, ResultImage};
use image::DynamicImage;
use std::path::{Path, PathBuf};

/// Where portraits live, keyed by the file name they were indexed under.
pub const DEFAULT_PORTRAITS_DIR: &str = "./images/portraits";

#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Minimum similarity in percent.
    pub threshold: f32,
    /// Matches requested per detected face.
    pub max_faces: u32,
    pub portraits_dir: PathBuf,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
            max_faces: DEFAULT_SEARCH_MAX_FACES,
            portraits_dir: PathBuf::from(DEFAULT_PORTRAITS_DIR),
        }
    }
}

pub struct SearchPipeline<S, T> {
    service: S,
    throttle: T,
    options: SearchOptions,
}

impl<S: FaceRecognitionService, T: Throttle> SearchPipeline<S, T> {
    pub fn new(service: S, throttle: T, options: SearchOptions) -> Self {
        Self {
            service,
            throttle,
            options,
        }
    }

    /// Search every face in one query image. Pauses once per detected face,
    /// after that face's matches are composed.
    pub fn search_image(
        &mut self,
        collection_id: &CollectionId,
        path: &Path,
    ) -> Result<Vec<ResultImage>, PipelineError> {
        let bytes = read(path)?;
        let faces = self.service.detect_faces(&bytes)?;
        tracing::info!(path = %path.display(), faces = faces.len(), "detected faces");

        if faces.is_empty() {
            return Ok(Vec::new());
        }

        let query = image::load_from_memory(&bytes).map_err(|source| PipelineError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        let mut results = Vec::new();
        for (index, face) in faces.iter().enumerate() {
            let query_face = crop_by_bounding_box(&query, &face.bounding_box)?;
            let crop_png = encode_png(&query_face)?;

            let outcome = self.service.search_faces_by_image(&SearchFacesRequest {
                collection_id,
                image: &crop_png,
                threshold: self.options.threshold,
                max_faces: self.options.max_faces,
            })?;
            if outcome == SearchOutcome::NoFaceSignal {
                tracing::debug!(
                    path = %path.display(),
                    face = index,
                    "no face found in query crop"
                );
            }

            for matched in outcome.into_matches() {
                let result = self.compose(&query_face, &matched, path)?;
                tracing::info!(
                    path = %path.display(),
                    face = index,
                    external_image_id = %result.external_image_id,
                    similarity = ?result.similarity,
                    "face matched"
                );
                results.push(result);
            }

            self.throttle.pause();
        }

        Ok(results)
    }

    /// Search each query image in order and concatenate the results.
    pub fn run<P: AsRef<Path>>(
        &mut self,
        collection_id: &CollectionId,
        images: &[P],
    ) -> Result<Vec<ResultImage>, PipelineError> {
        let mut results = Vec::new();
        for path in images {
            results.extend(self.search_image(collection_id, path.as_ref())?);
        }
        tracing::info!(
            collection = %collection_id,
            images = images.len(),
            results = results.len(),
            "search complete"
        );
        Ok(results)
    }

    /// Outline the match on its portrait and paste the query face over it.
    fn compose(
        &self,
        query_face: &DynamicImage,
        matched: &FaceRecord,
        source: &Path,
    ) -> Result<ResultImage, PipelineError> {
        let external_image_id = matched
            .external_image_id
            .clone()
            .ok_or_else(|| PipelineError::MissingExternalId {
                face_id: matched.face_id.clone().unwrap_or_else(|| "<unknown>".to_string()),
            })?;

        let portrait_path = self.options.portraits_dir.join(&external_image_id);
        let portrait = image::load_from_memory(&read(&portrait_path)?).map_err(|source| {
            PipelineError::Decode {
                path: portrait_path.clone(),
                source,
            }
        })?;

        let annotated = draw_bounding_box(&portrait, &matched.bounding_box);
        Ok(ResultImage {
            image: paste_on_upper_left(query_face, &annotated),
            external_image_id,
            similarity: matched.similarity,
            source: source.to_path_buf(),
        })
    }
}

fn read(path: &Path) -> Result<Vec<u8>, PipelineError> {
    std::fs::read(path).map_err(|source| PipelineError::Read {
        path: path.to_path_buf(),
        source,
    })
}
