//! FUSE filesystem implementation for s3fs
//!
//! Mounts a bucket as a read-only directory whose entries are the bucket's
//! object keys. Only metadata is served; file contents cannot be read.

pub mod bucket_fs;

use std::path::Path;

use fuser::MountOption;

pub use bucket_fs::BucketFs;

/// Mount options for a bucket mount
pub fn mount_options(allow_other: bool) -> Vec<MountOption> {
    let mut options = vec![
        MountOption::FSName("s3fs".to_string()),
        MountOption::Subtype("s3fs".to_string()),
        MountOption::RO,
        MountOption::DefaultPermissions,
    ];

    if allow_other {
        options.push(MountOption::AllowOther);
        // AutoUnmount requires AllowOther or AllowRoot
        options.push(MountOption::AutoUnmount);
    }

    options
}

/// Unmount `mount_point` using the platform's unprivileged tool
pub fn unmount(mount_point: &Path) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    let status = std::process::Command::new("umount")
        .arg(mount_point)
        .status()?;

    #[cfg(not(target_os = "macos"))]
    let status = std::process::Command::new("fusermount")
        .arg("-u")
        .arg(mount_point)
        .status()?;

    if !status.success() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("unmount of {} failed with status: {}", mount_point.display(), status),
        ));
    }

    Ok(())
}
