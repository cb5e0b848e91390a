use crate::compositor::CompositeError;
use crate::service::ServiceError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("face recognition service: {0}")]
    Service(#[from] ServiceError),
    #[error("image compositing: {0}")]
    Composite(#[from] CompositeError),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to save result image {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image path has no usable file name: {0}")]
    InvalidFileName(PathBuf),
    #[error("matched face {face_id} carries no external image id")]
    MissingExternalId { face_id: String },
}
