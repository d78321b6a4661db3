//! `object_store` backed lister (in-memory, local, or any other backend).

use std::sync::Arc;

use futures::TryStreamExt;
use object_store::{ObjectMeta, ObjectStore};

use super::{ListedObject, ListingError, ObjectLister};
use crate::bucket::BucketRef;

/// Lists whatever bucket an [`ObjectStore`] was built for.
///
/// The store is already bound to its bucket, so the [`BucketRef`] passed to
/// [`ObjectLister::list_objects`] is only used for logs and errors. Keys come
/// back as `object_store::path::Path`, which drops leading and trailing
/// slashes and refuses empty, `.` or `..` segments.
#[derive(Debug, Clone)]
pub struct StoreLister {
    inner: Arc<dyn ObjectStore>,
}

impl StoreLister {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { inner: store }
    }
}

impl From<ObjectMeta> for ListedObject {
    fn from(meta: ObjectMeta) -> Self {
        Self {
            key: meta.location.to_string(),
            size: meta.size as u64,
            last_modified: meta.last_modified,
        }
    }
}

#[async_trait::async_trait]
impl ObjectLister for StoreLister {
    async fn list_objects(&self, bucket: &BucketRef) -> Result<Vec<ListedObject>, ListingError> {
        let objects: Vec<ObjectMeta> = self
            .inner
            .list(None)
            .try_collect()
            .await
            .map_err(|source| ListingError::Request {
                bucket: bucket.name().to_string(),
                source,
            })?;

        tracing::debug!("listed {} objects in {}", objects.len(), self.inner);

        Ok(objects.into_iter().map(ListedObject::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bytes::Bytes;
    use object_store::memory::InMemory;
    use object_store::path::Path as ObjectPath;

    #[tokio::test]
    async fn test_memory_listing() {
        let store = Arc::new(InMemory::new());
        store
            .put(&ObjectPath::from("a.txt"), Bytes::from("hello").into())
            .await
            .unwrap();
        store
            .put(&ObjectPath::from("b.bin"), Bytes::from(vec![0u8; 1024]).into())
            .await
            .unwrap();

        let lister = StoreLister::new(store);
        let bucket = BucketRef::new("test").unwrap();

        let mut objects = lister.list_objects(&bucket).await.unwrap();
        objects.sort_by(|a, b| a.key.cmp(&b.key));

        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].key, "a.txt");
        assert_eq!(objects[0].size, 5);
        assert_eq!(objects[1].key, "b.bin");
        assert_eq!(objects[1].size, 1024);
    }

    #[tokio::test]
    async fn test_nested_keys_are_listed_whole() {
        let store = Arc::new(InMemory::new());
        store
            .put(&ObjectPath::from("logs/2023/01.log"), Bytes::from("x").into())
            .await
            .unwrap();

        let lister = StoreLister::new(store);
        let objects = lister
            .list_objects(&BucketRef::new("test").unwrap())
            .await
            .unwrap();

        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].key, "logs/2023/01.log");
    }
}
