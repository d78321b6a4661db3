//! ListObjectsV2 lister for S3 and S3-compatible endpoints.
//!
//! Requests are signed with `object_store`'s SigV4 authorizer and its
//! environment-driven credential chain, but the listing itself is parsed
//! here. Keys are requested URL-encoded and decoded locally, so every key
//! reaches the catalog byte for byte: trailing or doubled slashes, `.` and
//! `..` segments and control characters included.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use object_store::aws::{AmazonS3Builder, AmazonS3ConfigKey, AwsAuthorizer, AwsCredential};
use object_store::CredentialProvider;
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use url::Url;

use super::pages::{collect_pages, ListPage, PageFetcher};
use super::{ListedObject, ListingError, ObjectLister};
use crate::bucket::BucketRef;

const DEFAULT_REGION: &str = "us-east-1";

/// Lists buckets with path-style ListObjectsV2 requests.
///
/// Not bound to a bucket: the bucket (and its endpoint override) come from
/// the [`BucketRef`] handed to each call.
#[derive(Debug, Clone)]
pub struct S3Lister {
    client: reqwest::Client,
    credentials: Arc<dyn CredentialProvider<Credential = AwsCredential>>,
    region: String,
}

impl S3Lister {
    /// Build a lister from the standard `AWS_*` environment.
    ///
    /// `region` overrides `AWS_REGION` / `AWS_DEFAULT_REGION`; without either
    /// the region is `us-east-1`. Nothing is sent over the network here.
    pub fn from_env(bucket: &BucketRef, region: Option<&str>) -> Result<Self, ListingError> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(bucket.name())
            .with_virtual_hosted_style_request(false);

        if let Some(region) = region {
            builder = builder.with_region(region);
        }

        if let Some(endpoint) = bucket.endpoint() {
            builder = builder
                .with_endpoint(endpoint.as_str().trim_end_matches('/'))
                .with_allow_http(endpoint.scheme() == "http");
        }

        let region = builder
            .get_config_value(&AmazonS3ConfigKey::Region)
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let store = builder.build().map_err(ListingError::Client)?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|source| ListingError::Http {
                bucket: bucket.name().to_string(),
                source,
            })?;

        tracing::debug!("created S3 client for bucket {} in {}", bucket, region);

        Ok(Self {
            client,
            credentials: store.credentials().clone(),
            region,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

#[async_trait::async_trait]
impl PageFetcher for S3Lister {
    async fn fetch_page(
        &self,
        bucket: &BucketRef,
        token: Option<&str>,
    ) -> Result<ListPage, ListingError> {
        let name = bucket.name();
        let http = |source| ListingError::Http {
            bucket: name.to_string(),
            source,
        };

        let credential = self
            .credentials
            .get_credential()
            .await
            .map_err(|source| ListingError::Request {
                bucket: name.to_string(),
                source,
            })?;

        let url = list_url(bucket, &self.region, token)?;
        let mut request = self.client.get(url).build().map_err(http)?;
        AwsAuthorizer::new(&credential, "s3", &self.region).authorize(&mut request, None);

        let response = self.client.execute(request).await.map_err(http)?;
        let status = response.status();
        let body = response.text().await.map_err(http)?;

        if !status.is_success() {
            return Err(ListingError::Status {
                bucket: name.to_string(),
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        parse_page(&body).map_err(|source| ListingError::Decode {
            bucket: name.to_string(),
            source,
        })
    }
}

#[async_trait::async_trait]
impl ObjectLister for S3Lister {
    async fn list_objects(&self, bucket: &BucketRef) -> Result<Vec<ListedObject>, ListingError> {
        collect_pages(self, bucket).await
    }
}

/// Path-style ListObjectsV2 URL for one page of `bucket`
fn list_url(bucket: &BucketRef, region: &str, token: Option<&str>) -> Result<Url, ListingError> {
    let mut url = match bucket.endpoint() {
        Some(endpoint) => endpoint.clone(),
        None => {
            let endpoint = format!("https://s3.{}.amazonaws.com", region);
            Url::parse(&endpoint).map_err(|_| ListingError::Endpoint(endpoint))?
        }
    };

    let endpoint = url.to_string();
    url.path_segments_mut()
        .map_err(|_| ListingError::Endpoint(endpoint))?
        .pop_if_empty()
        .push(bucket.name());

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("list-type", "2")
            .append_pair("encoding-type", "url");
        if let Some(token) = token {
            query.append_pair("continuation-token", token);
        }
    }

    Ok(url)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBucketResult {
    #[serde(default)]
    contents: Vec<Contents>,
    #[serde(default)]
    is_truncated: bool,
    #[serde(default)]
    next_continuation_token: Option<String>,
    #[serde(default)]
    encoding_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Contents {
    key: String,
    size: u64,
    last_modified: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorResponse {
    code: String,
    #[serde(default)]
    message: String,
}

/// Decode one ListObjectsV2 response body.
///
/// Keys that do not decode to UTF-8 cannot become entry names; they are
/// logged and skipped while the rest of the page is kept.
fn parse_page(body: &str) -> Result<ListPage, quick_xml::DeError> {
    let result: ListBucketResult = quick_xml::de::from_str(body)?;
    let url_encoded = result.encoding_type.as_deref() == Some("url");

    let mut objects = Vec::with_capacity(result.contents.len());
    for contents in result.contents {
        let key = if url_encoded {
            match decode_key(&contents.key) {
                Some(key) => key,
                None => {
                    tracing::warn!(key = %contents.key, "skipping object whose key is not UTF-8");
                    continue;
                }
            }
        } else {
            contents.key
        };
        objects.push(ListedObject::new(key, contents.size, contents.last_modified));
    }

    let next = if result.is_truncated {
        result.next_continuation_token
    } else {
        None
    };

    Ok(ListPage { objects, next })
}

/// Undo S3's `encoding-type=url` form encoding (`+` is a space)
fn decode_key(raw: &str) -> Option<String> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .ok()
        .map(|key| key.into_owned())
}

/// Best-effort summary of an S3 error body
fn error_message(body: &str) -> String {
    match quick_xml::de::from_str::<ErrorResponse>(body) {
        Ok(err) if err.message.is_empty() => err.code,
        Ok(err) => format!("{}: {}", err.code, err.message),
        Err(_) => body.trim().chars().take(200).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::catalog::Catalog;

    fn contents(key: &str, size: u64) -> String {
        format!(
            "<Contents><Key>{}</Key><LastModified>2023-01-01T00:00:00.000Z</LastModified>\
             <ETag>&quot;x&quot;</ETag><Size>{}</Size><StorageClass>STANDARD</StorageClass></Contents>",
            key, size
        )
    }

    fn response(keys: &[(&str, u64)], next: Option<&str>) -> String {
        let body: String = keys.iter().map(|(k, s)| contents(k, *s)).collect();
        let truncated = match next {
            Some(token) => format!(
                "<IsTruncated>true</IsTruncated><NextContinuationToken>{}</NextContinuationToken>",
                token
            ),
            None => "<IsTruncated>false</IsTruncated>".to_string(),
        };
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <ListBucketResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
             <Name>bucket</Name><Prefix></Prefix><KeyCount>{}</KeyCount><MaxKeys>1000</MaxKeys>\
             <EncodingType>url</EncodingType>{}{}</ListBucketResult>",
            keys.len(),
            truncated,
            body
        )
    }

    #[test]
    fn test_keys_decoded_verbatim() {
        let body = response(
            &[
                ("folder%2F", 0),
                ("folder", 1),
                ("%2Fabs.txt", 2),
                ("a%2F%2Fb.txt", 3),
                (".%2Fx", 4),
                ("dir/../y", 5),
                ("tab%09name", 6),
                ("with+space", 7),
                ("plus%2Bsign", 8),
            ],
            None,
        );

        let page = parse_page(&body).unwrap();

        let keys: Vec<&str> = page.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "folder/",
                "folder",
                "/abs.txt",
                "a//b.txt",
                "./x",
                "dir/../y",
                "tab\tname",
                "with space",
                "plus+sign",
            ]
        );
        assert_eq!(page.objects[3].size, 3);
        assert_eq!(page.objects[0].last_modified.timestamp(), 1_672_531_200);
        assert!(page.next.is_none());
    }

    #[test]
    fn test_unusual_keys_become_distinct_entries() {
        let body = response(&[("folder%2F", 0), ("folder", 10), ("a%2F%2Fb", 1)], None);

        let catalog = Catalog::from_objects(parse_page(&body).unwrap().objects);

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("folder/").unwrap().size(), 0);
        assert_eq!(catalog.get("folder").unwrap().size(), 10);
        assert!(catalog.get("a//b").is_some());
    }

    #[test]
    fn test_undecodable_key_skipped_rest_kept() {
        let body = response(&[("good", 1), ("bad%FF", 2), ("also-good", 3)], None);

        let page = parse_page(&body).unwrap();

        let keys: Vec<&str> = page.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["good", "also-good"]);
    }

    #[test]
    fn test_raw_keys_without_encoding_type() {
        let body = format!(
            "<ListBucketResult><IsTruncated>false</IsTruncated>{}</ListBucketResult>",
            contents("a//b.txt", 9)
        );

        let page = parse_page(&body).unwrap();

        assert_eq!(page.objects[0].key, "a//b.txt");
    }

    #[test]
    fn test_truncated_page_carries_token() {
        let body = response(&[("a", 1)], Some("1ueGcxLPRx1Tr/XYExHnhbYLgveDs2J/wm36Hy4vbOwM="));

        let page = parse_page(&body).unwrap();

        assert_eq!(
            page.next.as_deref(),
            Some("1ueGcxLPRx1Tr/XYExHnhbYLgveDs2J/wm36Hy4vbOwM=")
        );
    }

    #[test]
    fn test_empty_bucket_page() {
        let page = parse_page(&response(&[], None)).unwrap();

        assert!(page.objects.is_empty());
        assert!(page.next.is_none());
    }

    #[test]
    fn test_negative_size_rejected() {
        let body = response(&[("a", 1)], None).replace("<Size>1</Size>", "<Size>-1</Size>");
        assert!(parse_page(&body).is_err());
    }

    #[test]
    fn test_error_message() {
        let body = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                    <Error><Code>NoSuchBucket</Code><Message>The specified bucket does not exist</Message>\
                    <BucketName>photos</BucketName></Error>";
        assert_eq!(
            error_message(body),
            "NoSuchBucket: The specified bucket does not exist"
        );
        assert_eq!(error_message("  gateway timeout \n"), "gateway timeout");
    }

    #[test]
    fn test_list_url_path_style() {
        let bucket = BucketRef::new("photos")
            .unwrap()
            .with_endpoint("http://localhost:9000")
            .unwrap();

        let url = list_url(&bucket, "us-east-1", None).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9000/photos?list-type=2&encoding-type=url"
        );

        let url = list_url(&bucket, "us-east-1", Some("a+b/c=")).unwrap();
        let token = url
            .query_pairs()
            .find(|(k, _)| k == "continuation-token")
            .map(|(_, v)| v.into_owned());
        assert_eq!(token.as_deref(), Some("a+b/c="));
    }

    #[test]
    fn test_list_url_default_endpoint() {
        let bucket = BucketRef::new("photos").unwrap();

        let url = list_url(&bucket, "eu-west-1", None).unwrap();

        assert_eq!(url.host_str(), Some("s3.eu-west-1.amazonaws.com"));
        assert_eq!(url.path(), "/photos");
    }

    #[test]
    fn test_from_env_with_region() {
        let bucket = BucketRef::new("photos")
            .unwrap()
            .with_endpoint("http://localhost:9000")
            .unwrap();

        let lister = S3Lister::from_env(&bucket, Some("eu-central-1")).unwrap();
        assert_eq!(lister.region(), "eu-central-1");
    }
}
