//! Checksum utilities for evidence payloads
//!
//! Uploaded evidence keeps a SHA-256 digest of its bytes so a later save can
//! prove the bytes handed back are the bytes that were attached.

use crate::error::{CommonError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of a payload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayloadDigest(String);

impl PayloadDigest {
    /// Digest an in-memory payload
    pub fn of(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    /// Check `bytes` against this digest
    pub fn verify(&self, bytes: &[u8]) -> Result<()> {
        let actual = Self::of(bytes);
        if &actual == self {
            Ok(())
        } else {
            Err(CommonError::ChecksumMismatch {
                expected: self.0.clone(),
                actual: actual.0,
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for listings
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for PayloadDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.0)
    }
}
