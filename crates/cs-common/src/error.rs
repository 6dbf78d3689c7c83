//! Error types for Cotizador Ship.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints
//!
//! The taxonomy follows the release/install design: fatal errors abort the
//! pipeline or installer run with nothing partial published; recoverable
//! errors are logged and substituted with a default; deferred cleanup is not
//! an error at all (see the reconciler's pending-cleanup token).

use thiserror::Error;

/// Result type alias for Cotizador Ship operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Version parsing and bump invariant errors.
    Version,
    /// Release pipeline errors (build, diff, publish).
    Release,
    /// Manifest assembly and validation errors.
    Manifest,
    /// Installer lifecycle errors.
    Install,
    /// Configuration snapshot and backup errors.
    Config,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Version => write!(f, "version"),
            ErrorCategory::Release => write!(f, "release"),
            ErrorCategory::Manifest => write!(f, "manifest"),
            ErrorCategory::Install => write!(f, "install"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for Cotizador Ship.
#[derive(Error, Debug)]
pub enum Error {
    // Version errors (10-19)
    #[error("invalid version: {0}")]
    InvalidVersion(String),

    #[error("bump invariant violated: {from} -[{kind}]-> {candidate}")]
    BumpInvariantViolated {
        from: String,
        kind: String,
        candidate: String,
    },

    // Release errors (20-29)
    #[error("build step failed: {0}")]
    BuildFailed(String),

    #[error("missing build output: {0}")]
    MissingBuildOutput(String),

    #[error("publish failed: {0}")]
    PublishFailed(String),

    // Manifest errors (30-39)
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    // Install errors (40-49)
    #[error("installation step failed: {0}")]
    InstallFailed(String),

    #[error("configuration backup failed: {0}")]
    BackupFailed(String),

    // Config errors (50-59)
    #[error("configuration write failed: {0}")]
    ConfigWrite(String),

    // I/O errors (60-69)
    #[error("filesystem retries exhausted for {path}")]
    RetriesExhausted { path: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the stable error code for this error.
    ///
    /// Codes are grouped by category:
    /// - 10-19: Version errors
    /// - 20-29: Release errors
    /// - 30-39: Manifest errors
    /// - 40-49: Install errors
    /// - 50-59: Config errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::InvalidVersion(_) => 10,
            Error::BumpInvariantViolated { .. } => 11,
            Error::BuildFailed(_) => 20,
            Error::MissingBuildOutput(_) => 21,
            Error::PublishFailed(_) => 22,
            Error::InvalidManifest(_) => 30,
            Error::InstallFailed(_) => 40,
            Error::BackupFailed(_) => 41,
            Error::ConfigWrite(_) => 50,
            Error::RetriesExhausted { .. } => 60,
            Error::Io(_) => 61,
            Error::Json(_) => 62,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidVersion(_) | Error::BumpInvariantViolated { .. } => {
                ErrorCategory::Version
            }

            Error::BuildFailed(_) | Error::MissingBuildOutput(_) | Error::PublishFailed(_) => {
                ErrorCategory::Release
            }

            Error::InvalidManifest(_) => ErrorCategory::Manifest,

            Error::InstallFailed(_) | Error::BackupFailed(_) => ErrorCategory::Install,

            Error::ConfigWrite(_) => ErrorCategory::Config,

            Error::RetriesExhausted { .. } | Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether the caller may substitute a default and continue.
    ///
    /// Fatal errors abort the run; nothing partial is published or left
    /// half-installed where avoidable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // A wrong version must never reach a published release.
            Error::InvalidVersion(_) => false,
            Error::BumpInvariantViolated { .. } => false,

            Error::BuildFailed(_) => false,
            Error::MissingBuildOutput(_) => false,
            Error::PublishFailed(_) => false,

            Error::InvalidManifest(_) => false,

            Error::InstallFailed(_) => false,
            Error::BackupFailed(_) => false,

            // The application runs with defaults if its config is missing.
            Error::ConfigWrite(_) => true,

            Error::RetriesExhausted { .. } => false,
            Error::Io(_) => false,
            Error::Json(_) => true,
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::InvalidVersion(_) => "Invalid Version",
            Error::BumpInvariantViolated { .. } => "Version Bump Invariant Violated",
            Error::BuildFailed(_) => "Build Step Failed",
            Error::MissingBuildOutput(_) => "Missing Build Output",
            Error::PublishFailed(_) => "Publish Failed",
            Error::InvalidManifest(_) => "Invalid Manifest",
            Error::InstallFailed(_) => "Installation Failed",
            Error::BackupFailed(_) => "Configuration Backup Failed",
            Error::ConfigWrite(_) => "Configuration Write Failed",
            Error::RetriesExhausted { .. } => "Filesystem Retries Exhausted",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Error",
        }
    }
}

/// Format an error for human-readable stderr output.
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, reset) = if use_color {
        ("\x1b[31m", "\x1b[0m")
    } else {
        ("", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}",
        red = red,
        reset = reset,
        headline = err.headline(),
        message = err,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(Error::InvalidVersion("x".into()).code(), 10);
        assert_eq!(
            Error::BumpInvariantViolated {
                from: "1.2.7".into(),
                kind: "minor".into(),
                candidate: "2.0.0".into(),
            }
            .code(),
            11
        );
        assert_eq!(Error::BackupFailed("x".into()).code(), 41);
        assert_eq!(Error::ConfigWrite("x".into()).code(), 50);
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            Error::InvalidVersion("x".into()).category(),
            ErrorCategory::Version
        );
        assert_eq!(
            Error::BuildFailed("x".into()).category(),
            ErrorCategory::Release
        );
        assert_eq!(
            Error::BackupFailed("x".into()).category(),
            ErrorCategory::Install
        );
    }

    #[test]
    fn test_error_recoverable() {
        assert!(!Error::BumpInvariantViolated {
            from: "1.2.7".into(),
            kind: "minor".into(),
            candidate: "2.0.0".into(),
        }
        .is_recoverable());
        assert!(Error::ConfigWrite("x".into()).is_recoverable());
        assert!(!Error::BackupFailed("x".into()).is_recoverable());
    }

    #[test]
    fn test_format_error_human() {
        let err = Error::MissingBuildOutput("dist/".into());
        let formatted = format_error_human(&err, false);
        assert!(formatted.contains("Missing Build Output"));
        assert!(formatted.contains("dist/"));
    }
}
