//! facematch-rekognition — Amazon Rekognition backend for facematch.
//!
//! Implements `FaceRecognitionService` on the AWS SDK. Region and
//! credentials come from the standard AWS lookup chain.

pub mod client;
pub mod convert;

pub use client::{RekognitionClient, RekognitionConfig};
