//! Interface to the remote face recognition service.
//!
//! Detection, indexing and matching all happen remotely; the pipelines only
//! orchestrate calls through [`FaceRecognitionService`]. Expected outcomes
//! such as an existing collection or a query crop without a face are result
//! variants, not errors.

use crate::types::{CollectionId, FaceRecord};
use thiserror::Error;

pub const DEFAULT_INDEX_MAX_FACES: u32 = 100;
pub const DEFAULT_MATCH_THRESHOLD: f32 = 80.0;
pub const DEFAULT_SEARCH_MAX_FACES: u32 = 1;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("{code}: {message}")]
    Api { code: String, message: String },
    #[error("malformed service response: {0}")]
    Decode(String),
    #[error("service configuration: {0}")]
    Configuration(String),
}

/// Outcome of a collection creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    Created,
    AlreadyExists,
}

/// Outcome of a search by query image.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Matching faces in service order; may be empty.
    Matches(Vec<FaceRecord>),
    /// The service found no face in the query image.
    NoFaceSignal,
}

impl SearchOutcome {
    /// Matches, treating [`SearchOutcome::NoFaceSignal`] as none.
    pub fn into_matches(self) -> Vec<FaceRecord> {
        match self {
            SearchOutcome::Matches(matches) => matches,
            SearchOutcome::NoFaceSignal => Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexFacesRequest<'a> {
    pub collection_id: &'a CollectionId,
    pub image: &'a [u8],
    pub external_image_id: &'a str,
    pub max_faces: u32,
}

#[derive(Debug, Clone)]
pub struct SearchFacesRequest<'a> {
    pub collection_id: &'a CollectionId,
    pub image: &'a [u8],
    /// Minimum similarity in percent.
    pub threshold: f32,
    pub max_faces: u32,
}

/// Remote face detection, indexing and search.
///
/// Calls are blocking; the caller waits for the full round trip.
pub trait FaceRecognitionService {
    fn create_collection(
        &self,
        collection_id: &CollectionId,
    ) -> Result<CollectionStatus, ServiceError>;

    /// Index the faces in an image, labelling them with `external_image_id`.
    fn index_faces(
        &self,
        request: &IndexFacesRequest<'_>,
    ) -> Result<Vec<FaceRecord>, ServiceError>;

    fn search_faces_by_image(
        &self,
        request: &SearchFacesRequest<'_>,
    ) -> Result<SearchOutcome, ServiceError>;

    /// Detect faces in an image, in service order.
    fn detect_faces(&self, image: &[u8]) -> Result<Vec<FaceRecord>, ServiceError>;
}

impl<S: FaceRecognitionService + ?Sized> FaceRecognitionService for &S {
    fn create_collection(
        &self,
        collection_id: &CollectionId,
    ) -> Result<CollectionStatus, ServiceError> {
        (**self).create_collection(collection_id)
    }

    fn index_faces(
        &self,
        request: &IndexFacesRequest<'_>,
    ) -> Result<Vec<FaceRecord>, ServiceError> {
        (**self).index_faces(request)
    }

    fn search_faces_by_image(
        &self,
        request: &SearchFacesRequest<'_>,
    ) -> Result<SearchOutcome, ServiceError> {
        (**self).search_faces_by_image(request)
    }

    fn detect_faces(&self, image: &[u8]) -> Result<Vec<FaceRecord>, ServiceError> {
        (**self).detect_faces(image)
    }
}
