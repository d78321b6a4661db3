pub mod args;
pub mod mount;
pub mod op;

pub use mount::Mount;

// Exit status as per sysexits(3)
pub const EX_USAGE: i32 = 64;
pub const EX_UNAVAILABLE: i32 = 69;
pub const EX_OSFILE: i32 = 72;
