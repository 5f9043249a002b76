//! Test doubles for exercising the codec without a real key-management
//! backend. Compiled for unit/integration tests and, behind the
//! `test-util` feature, for downstream crates that need the same double.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::vault::{KeyVault, KeyVaultError};

/// An in-process [`KeyVault`] backed by a `HashMap`, wrapping stored keys
/// with a byte-wise XOR against the caller's master public key.
///
/// This is a stand-in two-layer wrap to exercise the trait end-to-end, not
/// a real security boundary: XOR against a caller-supplied key provides no
/// confidentiality on its own.
#[derive(Default)]
pub struct InMemoryKeyVault {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryKeyVault {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn xor_with(data: &[u8], key: &[u8]) -> Vec<u8> {
    if key.is_empty() {
        return data.to_vec();
    }
    data.iter()
        .enumerate()
        .map(|(i, b)| b ^ key[i % key.len()])
        .collect()
}

impl KeyVault for InMemoryKeyVault {
    fn store_key(
        &self,
        file_id: &str,
        file_private_key: &[u8],
        master_public_key: &[u8],
    ) -> Result<Vec<u8>, KeyVaultError> {
        let wrapped = xor_with(file_private_key, master_public_key);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(file_id.to_owned(), wrapped.clone());
        Ok(wrapped)
    }

    fn retrieve_key(&self, file_id: &str, master_public_key: &[u8]) -> Result<Vec<u8>, KeyVaultError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let wrapped = entries
            .get(file_id)
            .ok_or_else(|| KeyVaultError::NotFound(file_id.to_owned()))?;
        Ok(xor_with(wrapped, master_public_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_key_round_trips_under_same_master_key() {
        let vault = InMemoryKeyVault::new();
        let master_key = b"master-public-key-bytes";
        let file_key = vec![9u8; 32];
        vault.store_key("file-1", &file_key, master_key).unwrap();
        let fetched = vault.retrieve_key("file-1", master_key).unwrap();
        assert_eq!(fetched, file_key);
    }

    #[test]
    fn unknown_file_id_is_not_found() {
        let vault = InMemoryKeyVault::new();
        assert!(matches!(
            vault.retrieve_key("missing", b"key"),
            Err(KeyVaultError::NotFound(_))
        ));
    }

    #[test]
    fn wrong_master_key_yields_wrong_bytes_not_an_error() {
        let vault = InMemoryKeyVault::new();
        let file_key = vec![1u8; 16];
        vault.store_key("file-2", &file_key, b"right-key").unwrap();
        let fetched = vault.retrieve_key("file-2", b"wrong-key").unwrap();
        assert_ne!(fetched, file_key);
    }
}
