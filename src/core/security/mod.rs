// Security module for download path validation
//
// Caller-supplied file names are confined to the configured download
// directory, preventing path traversal through the download tool.

pub mod path_validator;

pub use path_validator::{PathSecurityError, resolve_within_root};
