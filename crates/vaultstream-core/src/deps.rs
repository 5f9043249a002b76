//! Explicit dependency wiring for [`crate::pipeline`].
//!
//! The codec takes its collaborators as an explicitly constructed struct
//! rather than resolving them from a container: a caller builds one
//! `CodecDependencies` once (typically at process startup) and passes it by
//! reference into every `encrypt`/`decrypt` call.

use std::sync::Arc;

use crate::buffer_pool::BufferPool;
use crate::cipher::CipherProfile;
use crate::error::CodecError;
use crate::platform_io::FileIoFactory;
use crate::profile::Profile;
use crate::vault::KeyVault;

/// Collaborators a codec job needs, constructed once and shared across
/// calls.
///
/// `vault`/`master_public_key` are optional: when both are set, `encrypt`
/// calls `KeyVault::store_key` before block processing and `decrypt` calls
/// `KeyVault::retrieve_key` before block processing, per the key-vault
/// calling convention. Leaving them unset (the default from [`Self::new`])
/// skips the vault entirely and the key passed to `encrypt`/`decrypt` is
/// used as-is — the right choice for a caller that resolves its per-file key
/// some other way before invoking the codec.
pub struct CodecDependencies {
    pub buffer_pool: Arc<BufferPool>,
    pub profile: Profile,
    pub file_io: Arc<dyn FileIoFactory>,
    pub vault: Option<Arc<dyn KeyVault>>,
    pub master_public_key: Option<Vec<u8>>,
}

impl CodecDependencies {
    #[must_use]
    pub fn new(profile: Profile, file_io: Arc<dyn FileIoFactory>) -> Self {
        Self {
            buffer_pool: Arc::new(BufferPool::new()),
            profile,
            file_io,
            vault: None,
            master_public_key: None,
        }
    }

    /// Attach a [`KeyVault`] and the master public key it should wrap keys
    /// under. Once set, `encrypt`/`decrypt` route their per-file key through
    /// `store_key`/`retrieve_key` before block processing.
    #[must_use]
    pub fn with_vault(mut self, vault: Arc<dyn KeyVault>, master_public_key: Vec<u8>) -> Self {
        self.vault = Some(vault);
        self.master_public_key = Some(master_public_key);
        self
    }
}

/// The key used for an `encrypt` call. A sealed AEAD key is symmetric, so
/// this is the same underlying type as [`DecryptionKey`]; the two names
/// document intent at call sites rather than describing different data.
pub type EncryptionKey = CipherProfile;

/// The key used for a `decrypt` call. See [`EncryptionKey`].
pub type DecryptionKey = CipherProfile;

/// Identifies one codec job.
///
/// `file_id` is an opaque identifier used only for key-vault lookups; it is
/// never embedded in the ciphertext. `source_path`/`destination_path` are
/// treated as already-valid, caller-sanitized paths — this crate performs
/// only the minimal sanity check in [`validate_instruction_paths`], not a
/// full path-traversal sanitizer.
#[derive(Debug, Clone)]
pub struct FileTransferInstruction {
    pub file_id: String,
    pub source_path: std::path::PathBuf,
    pub destination_path: std::path::PathBuf,
}

/// Reject an instruction with an empty path or identical source and
/// destination. Anything beyond that (existence, permissions, traversal
/// sanitization) is the external caller's responsibility.
pub fn validate_instruction_paths(instruction: &FileTransferInstruction) -> Result<(), CodecError> {
    if instruction.source_path.as_os_str().is_empty() {
        return Err(CodecError::Validation("source_path must not be empty".into()));
    }
    if instruction.destination_path.as_os_str().is_empty() {
        return Err(CodecError::Validation(
            "destination_path must not be empty".into(),
        ));
    }
    if instruction.source_path == instruction.destination_path {
        return Err(CodecError::Validation(
            "source_path and destination_path must differ".into(),
        ));
    }
    Ok(())
}
