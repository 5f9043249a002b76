//! Streaming authenticated file encryption codec.
//!
//! Encrypts a plaintext file into a self-describing ciphertext file block by
//! block, so memory use stays bounded regardless of file size. Each block is
//! sealed with an independent AEAD operation keyed by a nonce derived from a
//! per-file salt and the block's index (see [`nonce`]). The on-disk layout is
//! described in [`header`] and [`pipeline`].
//!
//! Two independent axes are configurable. [`profile::Profile`] selects the
//! HMAC/HKDF hash and salt size used to derive nonces; [`cipher::CipherKind`]
//! selects the AEAD algorithm (AES-256-GCM or ChaCha20-Poly1305) used to seal
//! each block. Both must match between encryption and decryption, or
//! authentication fails.

pub mod buffer_pool;
pub mod cancel;
pub mod cipher;
pub mod constants;
pub mod deps;
pub mod error;
pub mod header;
pub mod nonce;
pub mod pipeline;
pub mod platform_io;
pub mod profile;
pub mod vault;

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;

pub use cancel::CancelToken;
pub use cipher::{CipherKind, CipherProfile};
pub use deps::{CodecDependencies, DecryptionKey, EncryptionKey, FileTransferInstruction};
pub use error::CodecError;
pub use pipeline::{decrypt, encrypt};
pub use profile::Profile;
pub use vault::{KeyVault, KeyVaultError};

#[cfg(feature = "async")]
pub use pipeline::{decrypt_async, encrypt_async};
