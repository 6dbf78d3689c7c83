//! Cotizador Ship shared types and errors.
//!
//! This crate provides foundational types shared across the release builder
//! and the installer:
//! - Three-part application versions with checked bump semantics
//! - Canonical relative paths and the protected-path policy
//! - The unified error type

pub mod error;
pub mod paths;
pub mod version;

pub use error::{format_error_human, Error, ErrorCategory, Result};
pub use paths::AppPaths;
pub use version::{BumpKind, Version};
