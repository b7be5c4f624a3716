//! Digest step of the signature engine.
//!
//! The gateway mandates hex-encoded MD5 over the rendered template. The
//! algorithm sits behind [`SignatureDigest`] so it can change without
//! touching template rendering or request building.

use std::fmt::Debug;

use md5::Md5;
use sha2::{Digest, Sha256};

/// Hash function applied to a rendered template.
pub trait SignatureDigest: Debug + Send + Sync {
    /// Algorithm name for logs.
    fn algorithm(&self) -> &'static str;

    /// Lowercase hex digest of `input`.
    fn hex_digest(&self, input: &[u8]) -> String;
}

/// MD5, the wire format required by the gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Md5Digest;

impl SignatureDigest for Md5Digest {
    fn algorithm(&self) -> &'static str {
        "md5"
    }

    fn hex_digest(&self, input: &[u8]) -> String {
        hex::encode(Md5::digest(input))
    }
}

/// SHA-256.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sha256Digest;

impl SignatureDigest for Sha256Digest {
    fn algorithm(&self) -> &'static str {
        "sha256"
    }

    fn hex_digest(&self, input: &[u8]) -> String {
        hex::encode(Sha256::digest(input))
    }
}
