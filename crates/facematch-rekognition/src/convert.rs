//! Mapping between Rekognition SDK shapes and facematch types.

use aws_sdk_rekognition::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_rekognition::operation::create_collection::CreateCollectionError;
use aws_sdk_rekognition::operation::search_faces_by_image::SearchFacesByImageError;
use aws_sdk_rekognition::types as rk;
use facematch_core::{BoundingBox, CollectionStatus, FaceRecord, SearchOutcome, ServiceError};
use std::error::Error;
use std::fmt;

pub fn bounding_box(b: &rk::BoundingBox) -> BoundingBox {
    BoundingBox {
        left: f64::from(b.left().unwrap_or_default()),
        top: f64::from(b.top().unwrap_or_default()),
        width: f64::from(b.width().unwrap_or_default()),
        height: f64::from(b.height().unwrap_or_default()),
    }
}

fn required_box(b: Option<&rk::BoundingBox>) -> Result<BoundingBox, ServiceError> {
    b.map(bounding_box)
        .ok_or_else(|| ServiceError::Decode("face without bounding box".into()))
}

/// A face stored in a collection.
pub fn face(face: &rk::Face) -> Result<FaceRecord, ServiceError> {
    Ok(FaceRecord {
        face_id: face.face_id().map(str::to_string),
        bounding_box: required_box(face.bounding_box())?,
        external_image_id: face.external_image_id().map(str::to_string),
        confidence: face.confidence(),
        similarity: None,
    })
}

pub fn indexed_face(record: &rk::FaceRecord) -> Result<FaceRecord, ServiceError> {
    let indexed = record
        .face()
        .ok_or_else(|| ServiceError::Decode("face record without face".into()))?;
    face(indexed)
}

pub fn face_match(m: &rk::FaceMatch) -> Result<FaceRecord, ServiceError> {
    let matched = m
        .face()
        .ok_or_else(|| ServiceError::Decode("face match without face".into()))?;
    Ok(FaceRecord {
        similarity: m.similarity(),
        ..face(matched)?
    })
}

/// A face found by detection; not stored anywhere.
pub fn face_detail(detail: &rk::FaceDetail) -> Result<FaceRecord, ServiceError> {
    Ok(FaceRecord {
        confidence: detail.confidence(),
        ..FaceRecord::at(required_box(detail.bounding_box())?)
    })
}

/// Split an SDK failure into the modelled service error, or a transport
/// failure when the request never produced a service response.
pub fn service_error<E, R>(err: SdkError<E, R>) -> Result<E, ServiceError>
where
    E: Error + 'static,
    R: fmt::Debug,
{
    match err {
        SdkError::ServiceError(context) => Ok(context.into_err()),
        other => Err(ServiceError::Transport(DisplayErrorContext(other).to_string())),
    }
}

/// Any SDK failure as a fatal [`ServiceError`].
pub fn fatal<E, R>(err: SdkError<E, R>) -> ServiceError
where
    E: Error + ProvideErrorMetadata + 'static,
    R: fmt::Debug,
{
    match service_error(err) {
        Ok(modelled) => api_error(&modelled),
        Err(transport) => transport,
    }
}

pub fn api_error<E: ProvideErrorMetadata + fmt::Display>(err: &E) -> ServiceError {
    ServiceError::Api {
        code: err.code().unwrap_or("Unknown").to_string(),
        message: err
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string()),
    }
}

/// An existing collection is not a failure.
pub fn collection_status(err: CreateCollectionError) -> Result<CollectionStatus, ServiceError> {
    match err {
        CreateCollectionError::ResourceAlreadyExistsException(_) => {
            Ok(CollectionStatus::AlreadyExists)
        }
        other => Err(api_error(&other)),
    }
}

/// Rekognition reports a query image without a detectable face as a bad parameter.
pub fn search_outcome(err: SearchFacesByImageError) -> Result<SearchOutcome, ServiceError> {
    match err {
        SearchFacesByImageError::InvalidParameterException(_) => Ok(SearchOutcome::NoFaceSignal),
        other => Err(api_error(&other)),
    }
}
