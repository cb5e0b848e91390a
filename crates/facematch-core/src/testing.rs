//! Recording test double for [`FaceRecognitionService`] and helpers shared by
//! pipeline tests.

use crate::service::{
    CollectionStatus, FaceRecognitionService, IndexFacesRequest, SearchFacesRequest, SearchOutcome,
    ServiceError,
};
use crate::throttle::Throttle;
use crate::types::{BoundingBox, CollectionId, FaceRecord};
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateCollection(String),
    IndexFaces {
        collection: String,
        external_image_id: String,
        max_faces: u32,
    },
    Detect,
    Search {
        collection: String,
        threshold: f32,
        max_faces: u32,
        crop: (u32, u32),
    },
    Pause,
}

#[derive(Default)]
pub struct FakeService {
    log: Rc<RefCell<Vec<Call>>>,
    collections: RefCell<HashSet<String>>,
    detections: RefCell<VecDeque<Vec<FaceRecord>>>,
    searches: RefCell<VecDeque<SearchOutcome>>,
    fail_index_for: Option<String>,
    fail_create: bool,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the faces returned by the next `detect_faces` call.
    pub fn with_detection(self, faces: Vec<FaceRecord>) -> Self {
        self.detections.borrow_mut().push_back(faces);
        self
    }

    /// Queue the outcome of the next `search_faces_by_image` call.
    pub fn with_search(self, outcome: SearchOutcome) -> Self {
        self.searches.borrow_mut().push_back(outcome);
        self
    }

    pub fn failing_index_for(mut self, external_image_id: &str) -> Self {
        self.fail_index_for = Some(external_image_id.to_string());
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// A throttle that records its pauses in this service's call log.
    pub fn throttle(&self) -> LoggingThrottle {
        LoggingThrottle { log: Rc::clone(&self.log) }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.log.borrow().iter().filter(|c| pred(c)).count()
    }
}

impl FaceRecognitionService for FakeService {
    fn create_collection(
        &self,
        collection_id: &CollectionId,
    ) -> Result<CollectionStatus, ServiceError> {
        self.log
            .borrow_mut()
            .push(Call::CreateCollection(collection_id.to_string()));
        if self.fail_create {
            return Err(ServiceError::Api {
                code: "AccessDeniedException".into(),
                message: "denied".into(),
            });
        }
        if self.collections.borrow_mut().insert(collection_id.to_string()) {
            Ok(CollectionStatus::Created)
        } else {
            Ok(CollectionStatus::AlreadyExists)
        }
    }

    fn index_faces(
        &self,
        request: &IndexFacesRequest<'_>,
    ) -> Result<Vec<FaceRecord>, ServiceError> {
        self.log.borrow_mut().push(Call::IndexFaces {
            collection: request.collection_id.to_string(),
            external_image_id: request.external_image_id.to_string(),
            max_faces: request.max_faces,
        });
        if self.fail_index_for.as_deref() == Some(request.external_image_id) {
            return Err(ServiceError::Api {
                code: "ThrottlingException".into(),
                message: "slow down".into(),
            });
        }
        Ok(vec![FaceRecord {
            external_image_id: Some(request.external_image_id.to_string()),
            ..FaceRecord::at(bbox(0.25, 0.25, 0.5, 0.5))
        }])
    }

    fn search_faces_by_image(
        &self,
        request: &SearchFacesRequest<'_>,
    ) -> Result<SearchOutcome, ServiceError> {
        let crop = image::load_from_memory(request.image)
            .map(|img| img.dimensions())
            .map_err(|e| ServiceError::Decode(e.to_string()))?;
        self.log.borrow_mut().push(Call::Search {
            collection: request.collection_id.to_string(),
            threshold: request.threshold,
            max_faces: request.max_faces,
            crop,
        });
        Ok(self
            .searches
            .borrow_mut()
            .pop_front()
            .unwrap_or(SearchOutcome::Matches(Vec::new())))
    }

    fn detect_faces(&self, _image: &[u8]) -> Result<Vec<FaceRecord>, ServiceError> {
        self.log.borrow_mut().push(Call::Detect);
        Ok(self.detections.borrow_mut().pop_front().unwrap_or_default())
    }
}

pub struct LoggingThrottle {
    log: Rc<RefCell<Vec<Call>>>,
}

impl Throttle for LoggingThrottle {
    fn pause(&mut self) {
        self.log.borrow_mut().push(Call::Pause);
    }
}

pub fn bbox(left: f64, top: f64, width: f64, height: f64) -> BoundingBox {
    BoundingBox { left, top, width, height }
}

/// A search hit on `external_image_id` at `bounding_box`.
pub fn matched(external_image_id: &str, bounding_box: BoundingBox, similarity: f32) -> FaceRecord {
    FaceRecord {
        face_id: Some(format!("face-{external_image_id}")),
        bounding_box,
        external_image_id: Some(external_image_id.to_string()),
        confidence: Some(99.9),
        similarity: Some(similarity),
    }
}

pub fn write_png(dir: &Path, name: &str, width: u32, height: u32, color: [u8; 3]) -> PathBuf {
    let path = dir.join(name);
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
        .save_with_format(&path, image::ImageFormat::Png)
        .unwrap();
    path
}
