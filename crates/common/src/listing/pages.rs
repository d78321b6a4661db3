//! Continuation-token pagination shared by paged listers.

use crate::bucket::BucketRef;

use super::{ListedObject, ListingError};

/// One response page of a bucket listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub objects: Vec<ListedObject>,
    /// Token for the next page; `None` on the last page
    pub next: Option<String>,
}

/// Fetches a single page, starting after `token` (or at the beginning).
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(
        &self,
        bucket: &BucketRef,
        token: Option<&str>,
    ) -> Result<ListPage, ListingError>;
}

/// Walk every page of `bucket` and concatenate the objects in order.
///
/// A failed page fails the whole listing; nothing is retried.
pub async fn collect_pages<F>(
    fetcher: &F,
    bucket: &BucketRef,
) -> Result<Vec<ListedObject>, ListingError>
where
    F: PageFetcher + ?Sized,
{
    let mut objects = Vec::new();
    let mut token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = fetcher.fetch_page(bucket, token.as_deref()).await?;
        pages += 1;
        objects.extend(page.objects);

        match page.next {
            Some(next) if token.as_deref() != Some(next.as_str()) => token = Some(next),
            Some(next) => {
                tracing::warn!(
                    bucket = %bucket,
                    token = %next,
                    "listing repeated its continuation token, stopping"
                );
                break;
            }
            None => break,
        }
    }

    tracing::debug!(bucket = %bucket, pages, objects = objects.len(), "listing complete");
    Ok(objects)
}
