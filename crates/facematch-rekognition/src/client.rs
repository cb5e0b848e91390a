//! Blocking Amazon Rekognition client.

use crate::convert;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_rekognition::primitives::Blob;
use aws_sdk_rekognition::types::{Attribute, Image, QualityFilter};
use facematch_core::{
    CollectionId, CollectionStatus, FaceRecognitionService, FaceRecord, IndexFacesRequest,
    SearchFacesRequest, SearchOutcome, ServiceError,
};
use std::time::Duration;
use tokio::runtime::Runtime;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`RekognitionClient`].
///
/// Unset fields fall through to the standard AWS lookup chain.
#[derive(Debug, Clone)]
pub struct RekognitionConfig {
    pub region: Option<String>,
    /// Named profile from the shared AWS config and credentials files.
    pub profile: Option<String>,
    /// Override for the regional endpoint, e.g. a local emulator.
    pub endpoint: Option<String>,
    /// Upper bound on one operation, retries included.
    pub timeout: Duration,
}

impl Default for RekognitionConfig {
    fn default() -> Self {
        Self {
            region: None,
            profile: None,
            endpoint: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// [`FaceRecognitionService`] backed by Amazon Rekognition.
///
/// Owns a single-threaded async runtime and blocks on each SDK call, so it
/// must not be used from inside another async runtime.
pub struct RekognitionClient {
    runtime: Runtime,
    client: aws_sdk_rekognition::Client,
}

impl RekognitionClient {
    /// Resolve region and credentials the way the AWS CLI does: environment,
    /// shared config and credentials files, SSO, then container and instance
    /// roles.
    pub fn connect(config: RekognitionConfig) -> Result<Self, ServiceError> {
        let runtime = runtime()?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(config.timeout)
                .build(),
        );
        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = runtime.block_on(loader.load());

        let region = sdk_config.region().ok_or_else(|| {
            ServiceError::Configuration(
                "no AWS region configured; set AWS_REGION or a profile region".into(),
            )
        })?;
        tracing::info!(
            region = %region,
            profile = ?config.profile,
            endpoint = ?config.endpoint,
            "rekognition client ready"
        );

        Ok(Self {
            runtime,
            client: aws_sdk_rekognition::Client::new(&sdk_config),
        })
    }

    /// Wrap an already configured SDK client.
    pub fn from_client(client: aws_sdk_rekognition::Client) -> Result<Self, ServiceError> {
        Ok(Self {
            runtime: runtime()?,
            client,
        })
    }
}

fn runtime() -> Result<Runtime, ServiceError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| ServiceError::Configuration(format!("failed to start async runtime: {e}")))
}

fn image(bytes: &[u8]) -> Image {
    Image::builder().bytes(Blob::new(bytes.to_vec())).build()
}

fn max_faces(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

impl FaceRecognitionService for RekognitionClient {
    fn create_collection(
        &self,
        collection_id: &CollectionId,
    ) -> Result<CollectionStatus, ServiceError> {
        let sent = self.runtime.block_on(
            self.client
                .create_collection()
                .collection_id(collection_id.as_str())
                .send(),
        );
        tracing::debug!(collection = %collection_id, ok = sent.is_ok(), "CreateCollection");
        match sent {
            Ok(_) => Ok(CollectionStatus::Created),
            Err(err) => convert::collection_status(convert::service_error(err)?),
        }
    }

    fn index_faces(
        &self,
        request: &IndexFacesRequest<'_>,
    ) -> Result<Vec<FaceRecord>, ServiceError> {
        let output = self
            .runtime
            .block_on(
                self.client
                    .index_faces()
                    .collection_id(request.collection_id.as_str())
                    .image(image(request.image))
                    .external_image_id(request.external_image_id)
                    .max_faces(max_faces(request.max_faces))
                    .quality_filter(QualityFilter::Auto)
                    .detection_attributes(Attribute::Default)
                    .send(),
            )
            .map_err(convert::fatal)?;
        tracing::debug!(
            collection = %request.collection_id,
            external_image_id = request.external_image_id,
            faces = output.face_records().len(),
            unindexed = output.unindexed_faces().len(),
            "IndexFaces"
        );
        output.face_records().iter().map(convert::indexed_face).collect()
    }

    fn search_faces_by_image(
        &self,
        request: &SearchFacesRequest<'_>,
    ) -> Result<SearchOutcome, ServiceError> {
        let sent = self.runtime.block_on(
            self.client
                .search_faces_by_image()
                .collection_id(request.collection_id.as_str())
                .image(image(request.image))
                .face_match_threshold(request.threshold)
                .max_faces(max_faces(request.max_faces))
                .send(),
        );
        match sent {
            Ok(output) => {
                tracing::debug!(
                    collection = %request.collection_id,
                    matches = output.face_matches().len(),
                    "SearchFacesByImage"
                );
                let matches = output
                    .face_matches()
                    .iter()
                    .map(convert::face_match)
                    .collect::<Result<_, _>>()?;
                Ok(SearchOutcome::Matches(matches))
            }
            Err(err) => convert::search_outcome(convert::service_error(err)?),
        }
    }

    fn detect_faces(&self, image_bytes: &[u8]) -> Result<Vec<FaceRecord>, ServiceError> {
        let output = self
            .runtime
            .block_on(
                self.client
                    .detect_faces()
                    .image(image(image_bytes))
                    .attributes(Attribute::Default)
                    .send(),
            )
            .map_err(convert::fatal)?;
        tracing::debug!(faces = output.face_details().len(), "DetectFaces");
        output.face_details().iter().map(convert::face_detail).collect()
    }
}
