//! Process exit code contract.
//!
//! Exit codes are part of the scripting interface and must stay stable:
//! - 0-9: operational outcomes
//! - 10-19: user/input errors
//! - 20-29: internal errors

use cs_common::{Error, ErrorCategory};

/// Operation completed successfully.
pub const SUCCESS: i32 = 0;

/// The user declined to proceed at a prompt.
pub const CANCELLED: i32 = 2;

/// The run handed off to the uninstall flow instead of installing.
pub const UNINSTALL_DELEGATED: i32 = 3;

/// Invalid command-line arguments.
pub const ARGS_ERROR: i32 = 10;

/// Version parsing or bump invariant failure.
pub const VERSION_ERROR: i32 = 11;

/// A build step failed or produced no output.
pub const BUILD_ERROR: i32 = 12;

/// Publishing the tree or manifest failed.
pub const PUBLISH_ERROR: i32 = 13;

/// The installer could not complete.
pub const INSTALL_ERROR: i32 = 14;

/// Configuration handling failed fatally.
pub const CONFIG_ERROR: i32 = 15;

/// Manifest assembly or validation failed.
pub const MANIFEST_ERROR: i32 = 16;

/// Filesystem or serialization error.
pub const IO_ERROR: i32 = 21;

/// Map an error to its exit code.
pub fn from_error(err: &Error) -> i32 {
    match err {
        Error::PublishFailed(_) => PUBLISH_ERROR,
        _ => match err.category() {
            ErrorCategory::Version => VERSION_ERROR,
            ErrorCategory::Release => BUILD_ERROR,
            ErrorCategory::Manifest => MANIFEST_ERROR,
            ErrorCategory::Install => INSTALL_ERROR,
            ErrorCategory::Config => CONFIG_ERROR,
            ErrorCategory::Io => IO_ERROR,
        },
    }
}
