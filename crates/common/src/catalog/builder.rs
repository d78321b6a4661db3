use std::sync::Arc;

use crate::bucket::BucketRef;
use crate::listing::{ListingError, ObjectLister};

use super::Catalog;

/// What to do when the one-time bucket listing fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListingPolicy {
    /// Log the failure and expose an empty catalog; the mount still succeeds
    #[default]
    SoftFail,
    /// Return the failure to the caller; the mount attach fails
    Strict,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("bucket listing failed: {0}")]
    Listing(#[from] ListingError),
}

/// Builds a [`Catalog`] from a single, full listing of a bucket.
#[derive(Clone)]
pub struct CatalogBuilder {
    lister: Arc<dyn ObjectLister>,
    policy: ListingPolicy,
}

impl std::fmt::Debug for CatalogBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogBuilder")
            .field("policy", &self.policy)
            .finish()
    }
}

impl CatalogBuilder {
    pub fn new(lister: Arc<dyn ObjectLister>) -> Self {
        Self {
            lister,
            policy: ListingPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ListingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ListingPolicy {
        self.policy
    }

    /// List `bucket` once and freeze the result into a catalog.
    ///
    /// No retries. Under [`ListingPolicy::SoftFail`] this never returns an
    /// error: a failed listing yields an empty catalog.
    pub async fn build(&self, bucket: &BucketRef) -> Result<Catalog, CatalogError> {
        match self.lister.list_objects(bucket).await {
            Ok(objects) => {
                let listed = objects.len();
                let catalog = Catalog::from_objects(objects);
                tracing::info!(
                    bucket = %bucket,
                    listed,
                    entries = catalog.len(),
                    "built bucket catalog"
                );
                Ok(catalog)
            }
            Err(e) => match self.policy {
                ListingPolicy::SoftFail => {
                    tracing::error!("failed to query bucket '{}': {}", bucket, e);
                    Ok(Catalog::empty())
                }
                ListingPolicy::Strict => Err(e.into()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{TimeZone, Utc};

    use crate::listing::ListedObject;

    /// Lister that returns a canned response and counts calls
    struct FakeLister {
        response: Option<Vec<ListedObject>>,
        calls: AtomicUsize,
    }

    impl FakeLister {
        fn ok(objects: Vec<ListedObject>) -> Self {
            Self {
                response: Some(objects),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                response: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl ObjectLister for FakeLister {
        async fn list_objects(
            &self,
            bucket: &BucketRef,
        ) -> Result<Vec<ListedObject>, ListingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Some(objects) => Ok(objects.clone()),
                None => Err(ListingError::Request {
                    bucket: bucket.name().to_string(),
                    source: object_store::Error::NotFound {
                        path: bucket.name().to_string(),
                        source: "NoSuchBucket".into(),
                    },
                }),
            }
        }
    }

    fn bucket() -> BucketRef {
        BucketRef::new("test").unwrap()
    }

    fn objects(n: usize) -> Vec<ListedObject> {
        let modified = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| ListedObject::new(format!("object-{i}"), i as u64, modified))
            .collect()
    }

    #[tokio::test]
    async fn test_build_counts_entries() {
        for n in [0, 1, 7, 250] {
            let lister = Arc::new(FakeLister::ok(objects(n)));
            let catalog = CatalogBuilder::new(lister).build(&bucket()).await.unwrap();
            assert_eq!(catalog.len(), n);
        }
    }

    #[tokio::test]
    async fn test_build_issues_single_listing() {
        let lister = Arc::new(FakeLister::ok(objects(3)));
        CatalogBuilder::new(lister.clone())
            .build(&bucket())
            .await
            .unwrap();

        assert_eq!(lister.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_soft_fail_yields_empty_catalog() {
        let lister = Arc::new(FakeLister::failing());
        let catalog = CatalogBuilder::new(lister.clone())
            .build(&bucket())
            .await
            .unwrap();

        assert!(catalog.is_empty());
        // no retry
        assert_eq!(lister.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_strict_policy_surfaces_failure() {
        let lister = Arc::new(FakeLister::failing());
        let result = CatalogBuilder::new(lister)
            .with_policy(ListingPolicy::Strict)
            .build(&bucket())
            .await;

        assert!(matches!(result, Err(CatalogError::Listing(_))));
    }

    #[tokio::test]
    async fn test_builds_are_idempotent() {
        let lister = Arc::new(FakeLister::ok(objects(5)));
        let builder = CatalogBuilder::new(lister);

        let first = builder.build(&bucket()).await.unwrap();
        let second = builder.build(&bucket()).await.unwrap();

        assert_eq!(first, second);
    }
}
