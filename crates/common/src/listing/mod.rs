//! Storage-facing side of the catalog.
//!
//! The catalog never talks to a storage SDK directly. It is handed an
//! [`ObjectLister`] at construction time and asks it for one full listing of
//! a bucket.
//!
//! - [`S3Lister`] is the production implementation. It issues ListObjectsV2
//!   requests itself so that keys arrive exactly as stored, and follows
//!   continuation tokens until the listing is complete.
//! - [`StoreLister`] adapts any `object_store` backend (the in-memory store in
//!   tests). Keys go through `object_store::path::Path`, which normalizes
//!   some of them, so it is not used for S3 mounts.

mod pages;
mod s3;
mod store;

use chrono::{DateTime, Utc};

use crate::bucket::BucketRef;

pub use pages::{collect_pages, ListPage, PageFetcher};
pub use s3::S3Lister;
pub use store::StoreLister;

/// One object as reported by a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedObject {
    /// Object key, verbatim
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Last-modified instant reported by the store
    pub last_modified: DateTime<Utc>,
}

impl ListedObject {
    pub fn new(key: impl Into<String>, size: u64, last_modified: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            size,
            last_modified,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    /// The storage client could not be constructed (bad region, ...)
    #[error("failed to create storage client: {0}")]
    Client(#[source] object_store::Error),

    /// The endpoint cannot address a bucket by path
    #[error("endpoint {0} cannot be used for path-style requests")]
    Endpoint(String),

    /// Credentials could not be resolved, or an `object_store` listing failed
    #[error("failed to list bucket '{bucket}': {source}")]
    Request {
        bucket: String,
        #[source]
        source: object_store::Error,
    },

    /// Transport failure talking to the endpoint
    #[error("request to list bucket '{bucket}' failed: {source}")]
    Http {
        bucket: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with an error status (auth, missing bucket)
    #[error("listing bucket '{bucket}' returned {status}: {message}")]
    Status {
        bucket: String,
        status: u16,
        message: String,
    },

    /// The response body is not a ListObjectsV2 result
    #[error("malformed listing response for bucket '{bucket}': {source}")]
    Decode {
        bucket: String,
        #[source]
        source: quick_xml::DeError,
    },
}

/// A source of bucket listings.
///
/// Implementations issue exactly one listing per call and never retry.
#[async_trait::async_trait]
pub trait ObjectLister: Send + Sync {
    async fn list_objects(&self, bucket: &BucketRef) -> Result<Vec<ListedObject>, ListingError>;
}
