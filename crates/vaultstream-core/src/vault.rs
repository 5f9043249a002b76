//! Key storage boundary.
//!
//! The codec never decides how encryption keys are stored or retrieved; it
//! asks a [`KeyVault`] for one, keyed by file ID and the deployment's master
//! public key. Production callers wire in whatever key-management backend
//! they already have (a master-key file, an OS keychain, a KMS); the
//! in-memory double in [`crate::test_util`] exists purely so the pipeline
//! can be exercised without one.

/// A source of encryption keys, keyed by file ID and wrapped under a
/// deployment's master public key.
///
/// Implementations own the actual key storage and access control; this
/// trait only describes the retrieval boundary the codec depends on. It
/// does not prescribe how `file_id`/`master_public_key` map to stored key
/// material — a KMS-backed implementation might ignore one of them
/// entirely in favor of an external index.
pub trait KeyVault: Send + Sync {
    /// Wrap and persist `file_private_key` under `master_public_key`,
    /// associated with `file_id`. Returns an opaque byte handle to the
    /// stored entry; the codec never interprets its contents.
    fn store_key(
        &self,
        file_id: &str,
        file_private_key: &[u8],
        master_public_key: &[u8],
    ) -> Result<Vec<u8>, KeyVaultError>;

    /// Recover the key previously stored for `file_id` under
    /// `master_public_key`.
    fn retrieve_key(&self, file_id: &str, master_public_key: &[u8]) -> Result<Vec<u8>, KeyVaultError>;
}

/// Failure modes a [`KeyVault`] implementation can report.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum KeyVaultError {
    #[error("no key stored for file id {0}")]
    NotFound(String),

    #[error("key vault backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("key vault denied access for file id {0}")]
    AccessDenied(String),
}
