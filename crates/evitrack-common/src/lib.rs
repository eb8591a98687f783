//! Evitrack Common Library
//!
//! Shared utilities for the Evitrack workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`CommonError`] and the [`Result`] alias
//! - **Checksums**: SHA-256 digests for uploaded evidence payloads
//! - **Logging**: `tracing` subscriber setup shared by every binary
//!
//! # Example
//!
//! ```no_run
//! use evitrack_common::checksum::PayloadDigest;
//!
//! let digest = PayloadDigest::of(b"signed policy");
//! assert!(digest.verify(b"signed policy").is_ok());
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod checksum;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{CommonError, Result};
