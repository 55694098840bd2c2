mod tests;

pub mod config;
pub mod deploy;
pub mod diff;
pub mod errors;
pub mod persistence;
pub mod source;
pub mod store;

/// The directory name for xdg
pub const HYPERKEY_DIR_NAME: &str = "hyperkey";
