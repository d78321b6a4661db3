// Mount configuration (file + defaults)
pub mod config;

// FUSE bridge over a mount session
pub mod fuse;
pub mod inode_table;

// Logging, signals, build info
pub mod process;

// Mount session coordinator (catalog lifecycle + queries)
pub mod session;

// Re-exports for consumers
pub use config::{ConfigError, MountConfig};
pub use fuse::BucketFs;
pub use inode_table::ROOT_INO;
pub use session::{MountSession, SessionError};
