//! Per-block nonce derivation (C3).
//!
//! Turns a per-file salt and a block index into a unique, uniformly
//! random-looking 12-byte chunk nonce, and derives that salt from the
//! per-file nonce in the first place. Both steps are HMAC/HKDF constructions
//! keyed on the [`crate::profile::Profile`] in effect; encrypting under one
//! profile and decrypting under another silently produces different nonces,
//! which is caught downstream as an AEAD tag mismatch.

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use sha3::Sha3_512;
use zeroize::Zeroizing;

use crate::constants::NONCE_SIZE;
use crate::error::CryptoFailure;
use crate::profile::Profile;

const NONCE_INFO_SUFFIX: &[u8] = b"ACL_NONCE";

/// Compute the per-file salt from the file's random nonce.
///
/// `salt = HMAC(key = file_nonce, msg = i64_le(0))`, with the HMAC hash
/// chosen by `profile`. The output length is the profile's `salt_size()`.
#[tracing::instrument(level = "debug", skip(file_nonce), fields(profile = ?profile))]
pub fn derive_salt(profile: Profile, file_nonce: &[u8]) -> Result<Vec<u8>, CryptoFailure> {
    let msg = 0i64.to_le_bytes();
    let salt = match profile {
        Profile::Default => hmac_sha3_512(file_nonce, &msg)?,
        Profile::Constrained => hmac_sha256(file_nonce, &msg)?,
    };
    debug_assert_eq!(salt.len(), profile.salt_size());
    Ok(salt)
}

/// Derive the chunk nonce for `block_index` given the file's precomputed
/// `salt`.
///
/// ```text
/// prk  = HMAC(key = salt, msg = i64_le(block_index))
/// info = i64_le(block_index) || b"ACL_NONCE"
/// okm  = HKDF-Expand(hash, prk, info, L = 12)
/// ```
#[tracing::instrument(level = "trace", skip(salt), fields(profile = ?profile, block_index))]
pub fn derive_chunk_nonce(
    profile: Profile,
    salt: &[u8],
    block_index: u64,
) -> Result<[u8; NONCE_SIZE], CryptoFailure> {
    let index_le = (block_index as i64).to_le_bytes();
    let mut info = Zeroizing::new(Vec::with_capacity(8 + NONCE_INFO_SUFFIX.len()));
    info.extend_from_slice(&index_le);
    info.extend_from_slice(NONCE_INFO_SUFFIX);

    let mut okm = [0u8; NONCE_SIZE];
    match profile {
        Profile::Default => {
            let prk = hmac_sha3_512(salt, &index_le)?;
            let hk = Hkdf::<Sha3_512>::from_prk(&prk).map_err(|_| CryptoFailure::NonceDerivation)?;
            hk.expand(&info, &mut okm)
                .map_err(|_| CryptoFailure::NonceDerivation)?;
        }
        Profile::Constrained => {
            let prk = hmac_sha256(salt, &index_le)?;
            let hk = Hkdf::<Sha256>::from_prk(&prk).map_err(|_| CryptoFailure::NonceDerivation)?;
            hk.expand(&info, &mut okm)
                .map_err(|_| CryptoFailure::NonceDerivation)?;
        }
    }
    Ok(okm)
}

fn hmac_sha256(key: &[u8], msg: &[u8]) -> Result<Vec<u8>, CryptoFailure> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).map_err(|_| CryptoFailure::NonceDerivation)?;
    mac.update(msg);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hmac_sha3_512(key: &[u8], msg: &[u8]) -> Result<Vec<u8>, CryptoFailure> {
    let mut mac =
        Hmac::<Sha3_512>::new_from_slice(key).map_err(|_| CryptoFailure::NonceDerivation)?;
    mac.update(msg);
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salt_length_matches_profile() {
        let nonce = [7u8; NONCE_SIZE];
        assert_eq!(
            derive_salt(Profile::Default, &nonce).unwrap().len(),
            Profile::Default.salt_size()
        );
        assert_eq!(
            derive_salt(Profile::Constrained, &nonce).unwrap().len(),
            Profile::Constrained.salt_size()
        );
    }

    #[test]
    fn salt_is_deterministic_in_file_nonce() {
        let nonce = [9u8; NONCE_SIZE];
        let a = derive_salt(Profile::Default, &nonce).unwrap();
        let b = derive_salt(Profile::Default, &nonce).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_block_indices_yield_distinct_nonces() {
        let salt = derive_salt(Profile::Default, &[1u8; NONCE_SIZE]).unwrap();
        let mut seen = std::collections::HashSet::new();
        for i in 0..2000u64 {
            let n = derive_chunk_nonce(Profile::Default, &salt, i).unwrap();
            assert!(seen.insert(n), "duplicate nonce at block {i}");
        }
    }

    #[test]
    fn constrained_profile_also_yields_distinct_nonces() {
        let salt = derive_salt(Profile::Constrained, &[2u8; NONCE_SIZE]).unwrap();
        let mut seen = std::collections::HashSet::new();
        for i in 0..2000u64 {
            let n = derive_chunk_nonce(Profile::Constrained, &salt, i).unwrap();
            assert!(seen.insert(n), "duplicate nonce at block {i}");
        }
    }

    #[test]
    fn different_salts_yield_different_nonces_for_same_index() {
        let salt_a = derive_salt(Profile::Default, &[1u8; NONCE_SIZE]).unwrap();
        let salt_b = derive_salt(Profile::Default, &[2u8; NONCE_SIZE]).unwrap();
        let nonce_a = derive_chunk_nonce(Profile::Default, &salt_a, 0).unwrap();
        let nonce_b = derive_chunk_nonce(Profile::Default, &salt_b, 0).unwrap();
        assert_ne!(nonce_a, nonce_b);
    }

    proptest::proptest! {
        #[test]
        fn nonce_derivation_never_panics(seed: [u8; NONCE_SIZE], index in 0u64..1_000_000) {
            let salt = derive_salt(Profile::Default, &seed).unwrap();
            let _ = derive_chunk_nonce(Profile::Default, &salt, index).unwrap();
        }
    }
}
