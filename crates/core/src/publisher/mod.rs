//! Publisher abstraction.
//!
//! A `Publisher` hosts an uploaded image and serves it at a public URL.
//! This module provides the trait, the two backend implementations
//! (S3+CloudFront object store and Cloudinary transformation service), and a
//! factory that resolves which backend a run should use.

mod cloudfront;
mod cloudinary;
mod factory;
mod types;

pub use cloudfront::CloudFrontPublisher;
pub use cloudinary::CloudinaryPublisher;
pub use factory::create_publisher;
pub use types::{
    unique_remote_name, PublishedArtifact, Publisher, PublisherCapabilities, PublisherError,
    UploadMetadata,
};
