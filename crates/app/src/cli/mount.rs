use std::path::PathBuf;
use std::sync::Arc;

use clap::builder::NonEmptyStringValueParser;
use clap::Args;
use tokio::runtime::Handle;

use common::prelude::{
    BucketRef, BucketRefError, CatalogBuilder, ListingError, ListingPolicy, ObjectLister, S3Lister,
};
use s3fs::process::shutdown_signal;
use s3fs::{fuse, BucketFs, MountConfig, MountSession, SessionError};

use super::op::{Op, OpContext};
use super::{EX_OSFILE, EX_UNAVAILABLE, EX_USAGE};

#[derive(Args, Debug, Clone)]
pub struct Mount {
    /// Name of the bucket to expose
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub bucket: String,

    /// Existing directory to mount the bucket at
    pub mount_point: PathBuf,

    /// S3-compatible endpoint URL (empty for the provider default)
    #[arg(long, env = "AWS_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Bucket region; falls back to the config file, then AWS_REGION
    #[arg(long)]
    pub region: Option<String>,

    /// Allow other users to access the mount
    #[arg(long)]
    pub allow_other: bool,

    /// Fail the mount when the bucket cannot be listed
    #[arg(long)]
    pub strict: bool,

    /// Seconds the kernel may cache entries and attributes
    #[arg(long)]
    pub attr_ttl_secs: Option<u64>,
}

impl Mount {
    /// Layer flags over values loaded from the config file
    pub fn apply_overrides(&self, config: &mut MountConfig) {
        if let Some(region) = &self.region {
            config.region = Some(region.clone());
        }
        if let Some(ttl) = self.attr_ttl_secs {
            config.attr_ttl_secs = ttl;
        }
        config.allow_other |= self.allow_other;
        config.strict_listing |= self.strict;
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MountError {
    #[error("invalid bucket reference: {0}")]
    Bucket(#[from] BucketRefError),
    #[error("unable to reach bucket '{0}': {1}")]
    Unavailable(String, #[source] ListingError),
    #[error("unable to list bucket '{0}': {1}")]
    Listing(String, #[source] SessionError),
    #[error("mount point is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("failed to mount at {}: {}", .0.display(), .1)]
    Mount(PathBuf, #[source] std::io::Error),
    #[error("failed to unmount {}: {}", .0.display(), .1)]
    Unmount(PathBuf, #[source] std::io::Error),
    #[error("FUSE session task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Create the session for `bucket`.
///
/// Under the strict policy the catalog is built here, before anything is
/// mounted: fuser cannot fail a mount from `init`, so a listing failure
/// has to stop the process first.
async fn open_session(
    bucket: BucketRef,
    lister: Arc<dyn ObjectLister>,
    config: &MountConfig,
) -> Result<MountSession, MountError> {
    let name = bucket.name().to_string();
    let policy = config.listing_policy();
    let builder = CatalogBuilder::new(lister).with_policy(policy);
    let mut session = MountSession::new(Handle::current(), bucket, builder);

    if policy == ListingPolicy::Strict {
        session
            .attach_async()
            .await
            .map_err(|e| MountError::Listing(name, e))?;
    }

    Ok(session)
}

impl Op for Mount {
    type Error = MountError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let config = &ctx.config;

        let bucket =
            BucketRef::new(&self.bucket)?.with_endpoint(self.endpoint.as_deref().unwrap_or(""))?;

        if !self.mount_point.is_dir() {
            return Err(MountError::NotADirectory(self.mount_point.clone()));
        }

        let lister: Arc<dyn ObjectLister> = match &ctx.lister {
            Some(lister) => lister.clone(),
            None => Arc::new(
                S3Lister::from_env(&bucket, config.region.as_deref())
                    .map_err(|e| MountError::Unavailable(bucket.name().to_string(), e))?,
            ),
        };

        let session = open_session(bucket.clone(), lister, config).await?;
        let fs = BucketFs::new(session, config.attr_ttl());
        let options = fuse::mount_options(config.allow_other);

        tracing::info!(
            "mounting bucket {} at {} ({:?} listing)",
            bucket,
            self.mount_point.display(),
            config.listing_policy()
        );

        // mount2 blocks until the filesystem is unmounted
        let mount_point = self.mount_point.clone();
        let mut session_task =
            tokio::task::spawn_blocking(move || fuser::mount2(fs, &mount_point, &options));

        let shutdown = async {
            if let Err(e) = shutdown_signal().await {
                tracing::warn!("signal handlers unavailable, unmount manually: {}", e);
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            result = &mut session_task => {
                result?.map_err(|e| MountError::Mount(self.mount_point.clone(), e))?;
            }
            _ = shutdown => {
                tracing::info!("shutdown requested, unmounting {}", self.mount_point.display());
                fuse::unmount(&self.mount_point)
                    .map_err(|e| MountError::Unmount(self.mount_point.clone(), e))?;
                session_task
                    .await?
                    .map_err(|e| MountError::Mount(self.mount_point.clone(), e))?;
            }
        }

        Ok(format!("Unmounted {}", self.mount_point.display()))
    }

    fn exit_code(err: &Self::Error) -> i32 {
        match err {
            MountError::Bucket(_) => EX_USAGE,
            MountError::Unavailable(..) | MountError::Listing(..) => EX_UNAVAILABLE,
            MountError::NotADirectory(_)
            | MountError::Mount(..)
            | MountError::Unmount(..)
            | MountError::Join(_) => EX_OSFILE,
        }
    }
}
