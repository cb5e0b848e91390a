//! facematch-core — Face collection indexing and search orchestration.
//!
//! Detection and recognition run on a remote [`FaceRecognitionService`];
//! this crate converts bounding boxes, crops and annotates images, paces the
//! remote calls, and assembles composite result images.

pub mod compositor;
pub mod error;
pub mod geometry;
pub mod indexing;
pub mod output;
pub mod search;
pub mod service;
pub mod throttle;
pub mod types;

#[cfg(test)]
mod testing;

pub use error::PipelineError;
pub use indexing::{IndexOptions, IndexSummary, IndexingPipeline};
pub use output::{write_results, WriteOutcome};
pub use search::{SearchOptions, SearchPipeline};
pub use service::{
    CollectionStatus, FaceRecognitionService, IndexFacesRequest, SearchFacesRequest,
    SearchOutcome, ServiceError,
};
pub use throttle::{FixedDelay, Throttle};
pub use types::{BoundingBox, CollectionId, FaceRecord, PixelRect, ResultImage};
