//! Error types for the codec crate.
//!
//! This module collects all error kinds produced by the public API into one
//! top-level enum, re-exporting per-concern errors behind a single surface.

use thiserror::Error;

/// A cryptographic failure: either AEAD authentication failed, or nonce
/// derivation itself could not be completed.
#[derive(Error, Debug)]
pub enum CryptoFailure {
    /// The AEAD tag did not verify for the given block.
    #[error("authentication tag mismatch at block {block_index}")]
    TagMismatch { block_index: u64 },

    /// HMAC/HKDF nonce derivation failed. No partial output is exposed.
    #[error("failed to derive nonce or salt")]
    NonceDerivation,
}

/// Header version validation failure.
#[derive(Error, Debug)]
pub enum VersionFailure {
    /// `major_version == 0` is reserved and never valid.
    #[error("major version cannot be zero")]
    MajorIsZero,

    /// The file was encrypted by a newer, unsupported major version.
    #[error("file encrypted with newer version: major={found}, supported up to {max}")]
    MajorTooNew { found: u8, max: u8 },

    /// The minor-version strategy for this major version rejected the file.
    #[error("unsupported minor version {minor} for major version {major}")]
    MinorRejected { major: u8, minor: u8 },
}

/// Top-level error returned by [`crate::encrypt`] and [`crate::decrypt`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CodecError {
    /// A precondition on the caller's input was violated (bad key length, bad
    /// path, bad version argument). No I/O was performed.
    #[error("validation error: {0}")]
    Validation(String),

    /// An I/O operation (open, read, write, fsync, truncate) failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// AEAD authentication or nonce derivation failed. The output is
    /// considered poisoned and should not be reused.
    #[error("cryptographic error: {0}")]
    Crypto(#[from] CryptoFailure),

    /// The header's version fields could not be validated.
    #[error("version error: {0}")]
    Version(#[from] VersionFailure),

    /// Cooperative cancellation was observed at a state-machine boundary.
    #[error("operation was cancelled")]
    Cancelled,

    /// The operation was invoked on a service after it was torn down.
    #[error("resource has been disposed")]
    ResourceDisposed,

    /// The key vault collaborator failed to store or retrieve a key.
    #[error("key vault error: {0}")]
    KeyVault(#[from] crate::vault::KeyVaultError),
}
