use std::fmt;

use url::Url;

/// The bucket a mount session enumerates, and the endpoint serving it.
///
/// Built once at startup and never changed for the life of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketRef {
    name: String,
    endpoint: Option<Url>,
}

#[derive(Debug, thiserror::Error)]
pub enum BucketRefError {
    #[error("bucket name must not be empty")]
    EmptyName,
    #[error("invalid endpoint '{0}': {1}")]
    InvalidEndpoint(String, url::ParseError),
}

impl BucketRef {
    /// Create a reference to `name` on the provider's default endpoint.
    pub fn new(name: impl Into<String>) -> Result<Self, BucketRefError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(BucketRefError::EmptyName);
        }
        Ok(Self {
            name,
            endpoint: None,
        })
    }

    /// Override the endpoint. An empty string means "use the provider default",
    /// which mirrors how an unset `AWS_ENDPOINT` behaves.
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self, BucketRefError> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            self.endpoint = None;
            return Ok(self);
        }
        let url = Url::parse(endpoint)
            .map_err(|e| BucketRefError::InvalidEndpoint(endpoint.to_string(), e))?;
        self.endpoint = Some(url);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }
}

impl fmt::Display for BucketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.endpoint {
            Some(endpoint) => write!(f, "{} @ {}", self.name, endpoint),
            None => write!(f, "{}", self.name),
        }
    }
}
