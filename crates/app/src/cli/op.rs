use std::error::Error;
use std::sync::Arc;

use common::prelude::ObjectLister;
use s3fs::MountConfig;

#[derive(Clone)]
pub struct OpContext {
    /// Effective configuration (flags, environment and config file merged)
    pub config: MountConfig,
    /// Lister to use instead of the S3 client built from the environment
    pub lister: Option<Arc<dyn ObjectLister>>,
}

impl OpContext {
    pub fn new(config: MountConfig) -> Self {
        Self {
            config,
            lister: None,
        }
    }

    #[cfg(test)]
    pub fn with_lister(mut self, lister: Arc<dyn ObjectLister>) -> Self {
        self.lister = Some(lister);
        self
    }
}

#[allow(async_fn_in_trait)]
pub trait Op {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;

    /// Process exit code for a failure of this op
    fn exit_code(err: &Self::Error) -> i32;
}
