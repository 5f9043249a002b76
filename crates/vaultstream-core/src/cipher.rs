//! Cipher facade (C6): a uniform interface over AES-256-GCM and
//! ChaCha20-Poly1305, both with a 128-bit tag and a 12-byte nonce.
//!
//! AES-256-GCM carries no associated data. ChaCha20-Poly1305 binds a fixed
//! 76-byte associated-data structure per block (`salt[..64] || block_index
//! || aligned_size`), so a decryptor must reconstruct identical AAD before
//! the tag will verify — see [`chacha_aad`].

use aead::{Aead, KeyInit, Payload};
use aes_gcm::Aes256Gcm;
use chacha20poly1305::ChaCha20Poly1305;

use crate::constants::{NONCE_SIZE, TAG_SIZE};
use crate::error::CryptoFailure;

/// Which AEAD construction a [`CipherProfile`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherKind {
    /// AES-256-GCM, no associated data.
    Aes256Gcm,
    /// ChaCha20-Poly1305, 76-byte fixed associated data per block.
    ChaCha20Poly1305,
}

impl CipherKind {
    /// Valid key lengths in bytes for this cipher.
    #[must_use]
    pub fn valid_key_lengths(self) -> &'static [usize] {
        match self {
            CipherKind::Aes256Gcm => &[16, 24, 32],
            CipherKind::ChaCha20Poly1305 => &[32],
        }
    }
}

/// A cipher key bound to a specific [`CipherKind`], validated at
/// construction time. Construction is the only place key-length validation
/// happens; everything downstream trusts it.
pub struct CipherProfile {
    kind: CipherKind,
    key: zeroize::Zeroizing<Vec<u8>>,
}

impl CipherProfile {
    /// Validate `key`'s length against `kind` and take ownership of it.
    pub fn new(kind: CipherKind, key: Vec<u8>) -> Result<Self, String> {
        if !kind.valid_key_lengths().contains(&key.len()) {
            return Err(format!(
                "invalid key length {} for {kind:?}, expected one of {:?}",
                key.len(),
                kind.valid_key_lengths()
            ));
        }
        Ok(Self {
            kind,
            key: zeroize::Zeroizing::new(key),
        })
    }

    #[must_use]
    pub fn kind(&self) -> CipherKind {
        self.kind
    }

    /// The raw key bytes, for handing to a [`crate::vault::KeyVault`] before
    /// block processing. Not exposed outside the crate: callers construct a
    /// `CipherProfile` from bytes they already own via [`Self::new`], so
    /// there is no legitimate external reason to read them back out.
    pub(crate) fn key_bytes(&self) -> &[u8] {
        &self.key
    }

    /// Encrypt `plaintext` in place, returning the detached tag. `block_index`
    /// and `aligned_size` are only consumed when `kind` is ChaCha20-Poly1305
    /// (to build the AAD); AES-256-GCM ignores them.
    pub fn encrypt_block(
        &self,
        nonce: &[u8; NONCE_SIZE],
        plaintext: &[u8],
        block_index: u64,
        aligned_size: u32,
        salt: &[u8],
        ciphertext_out: &mut [u8],
        tag_out: &mut [u8; TAG_SIZE],
    ) -> Result<(), CryptoFailure> {
        let sealed = match self.kind {
            CipherKind::Aes256Gcm => {
                let cipher = Aes256Gcm::new_from_slice(&self.key)
                    .map_err(|_| CryptoFailure::TagMismatch { block_index })?;
                cipher
                    .encrypt(nonce.into(), plaintext)
                    .map_err(|_| CryptoFailure::TagMismatch { block_index })?
            }
            CipherKind::ChaCha20Poly1305 => {
                let cipher = ChaCha20Poly1305::new_from_slice(&self.key)
                    .map_err(|_| CryptoFailure::TagMismatch { block_index })?;
                let aad = chacha_aad(salt, block_index, aligned_size);
                cipher
                    .encrypt(
                        nonce.into(),
                        Payload {
                            msg: plaintext,
                            aad: &aad,
                        },
                    )
                    .map_err(|_| CryptoFailure::TagMismatch { block_index })?
            }
        };
        debug_assert_eq!(sealed.len(), plaintext.len() + TAG_SIZE);
        let split = sealed.len() - TAG_SIZE;
        ciphertext_out.copy_from_slice(&sealed[..split]);
        tag_out.copy_from_slice(&sealed[split..]);
        Ok(())
    }

    /// Decrypt and verify one block. `ciphertext` and `tag` are reassembled
    /// internally to match the AEAD crates' combined-ciphertext API.
    pub fn decrypt_block(
        &self,
        nonce: &[u8; NONCE_SIZE],
        ciphertext: &[u8],
        tag: &[u8; TAG_SIZE],
        block_index: u64,
        aligned_size: u32,
        salt: &[u8],
        plaintext_out: &mut [u8],
    ) -> Result<(), CryptoFailure> {
        let mut combined = Vec::with_capacity(ciphertext.len() + TAG_SIZE);
        combined.extend_from_slice(ciphertext);
        combined.extend_from_slice(tag);

        let opened = match self.kind {
            CipherKind::Aes256Gcm => {
                let cipher = Aes256Gcm::new_from_slice(&self.key)
                    .map_err(|_| CryptoFailure::TagMismatch { block_index })?;
                cipher
                    .decrypt(nonce.into(), combined.as_ref())
                    .map_err(|_| CryptoFailure::TagMismatch { block_index })?
            }
            CipherKind::ChaCha20Poly1305 => {
                let cipher = ChaCha20Poly1305::new_from_slice(&self.key)
                    .map_err(|_| CryptoFailure::TagMismatch { block_index })?;
                let aad = chacha_aad(salt, block_index, aligned_size);
                cipher
                    .decrypt(
                        nonce.into(),
                        Payload {
                            msg: &combined,
                            aad: &aad,
                        },
                    )
                    .map_err(|_| CryptoFailure::TagMismatch { block_index })?
            }
        };
        if opened.len() != plaintext_out.len() {
            return Err(CryptoFailure::TagMismatch { block_index });
        }
        plaintext_out.copy_from_slice(&opened);
        Ok(())
    }
}

/// `salt[..min(64, salt.len())] || i64_le(block_index) || i32_le(aligned_size)`.
fn chacha_aad(salt: &[u8], block_index: u64, aligned_size: u32) -> [u8; 76] {
    let mut aad = [0u8; 76];
    let salt_part = &salt[..salt.len().min(64)];
    aad[..salt_part.len()].copy_from_slice(salt_part);
    aad[64..72].copy_from_slice(&(block_index as i64).to_le_bytes());
    aad[72..76].copy_from_slice(&(aligned_size as i32).to_le_bytes());
    aad
}
