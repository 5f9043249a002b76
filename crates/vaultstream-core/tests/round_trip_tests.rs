//! Encrypt/decrypt round-trip tests exercising the public API end to end,
//! the way a caller outside this crate would use it.

use std::sync::Arc;

use vaultstream_core::cipher::{CipherKind, CipherProfile};
use vaultstream_core::platform_io::StdFileIo;
use vaultstream_core::profile::Profile;
use vaultstream_core::{CancelToken, CodecDependencies, CodecError, FileTransferInstruction};

fn deps(profile: Profile) -> CodecDependencies {
    CodecDependencies::new(profile, Arc::new(StdFileIo))
}

fn write_then_roundtrip(profile: Profile, kind: CipherKind, key_bytes: Vec<u8>, plaintext: &[u8]) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("plain.bin");
    let ciphertext = dir.path().join("cipher.bin");
    let restored = dir.path().join("restored.bin");
    std::fs::write(&source, plaintext).unwrap();

    let encrypt_instruction = FileTransferInstruction {
        file_id: "round-trip".into(),
        source_path: source,
        destination_path: ciphertext.clone(),
    };
    let encrypt_key = CipherProfile::new(kind, key_bytes.clone()).unwrap();
    vaultstream_core::encrypt(&deps(profile), &encrypt_instruction, encrypt_key, &CancelToken::new()).unwrap();

    let decrypt_instruction = FileTransferInstruction {
        file_id: "round-trip".into(),
        source_path: ciphertext,
        destination_path: restored.clone(),
    };
    let decrypt_key = CipherProfile::new(kind, key_bytes).unwrap();
    vaultstream_core::decrypt(&deps(profile), &decrypt_instruction, decrypt_key, &CancelToken::new()).unwrap();

    std::fs::read(&restored).unwrap()
}

#[test]
fn empty_file() {
    let restored = write_then_roundtrip(Profile::Default, CipherKind::Aes256Gcm, vec![0u8; 32], &[]);
    assert!(restored.is_empty());
}

#[test]
fn single_byte() {
    let restored = write_then_roundtrip(Profile::Default, CipherKind::Aes256Gcm, vec![1u8; 32], &[0x5A]);
    assert_eq!(restored, vec![0x5A]);
}

#[test]
fn one_megabyte_random() {
    use rand::RngCore;
    let mut plaintext = vec![0u8; 1024 * 1024];
    rand::rng().fill_bytes(&mut plaintext);
    let restored = write_then_roundtrip(Profile::Constrained, CipherKind::ChaCha20Poly1305, vec![2u8; 32], &plaintext);
    assert_eq!(restored, plaintext);
}

#[test]
fn all_four_profile_cipher_combinations_round_trip() {
    let plaintext = b"shared across every profile/cipher combination".to_vec();
    for profile in [Profile::Default, Profile::Constrained] {
        for (kind, key) in [
            (CipherKind::Aes256Gcm, vec![7u8; 32]),
            (CipherKind::ChaCha20Poly1305, vec![8u8; 32]),
        ] {
            let restored = write_then_roundtrip(profile, kind, key, &plaintext);
            assert_eq!(restored, plaintext, "profile={profile:?} kind={kind:?}");
        }
    }
}

#[test]
fn unknown_destination_directory_surfaces_as_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("plain.bin");
    std::fs::write(&source, b"payload").unwrap();

    let instruction = FileTransferInstruction {
        file_id: "missing-dir".into(),
        source_path: source,
        destination_path: dir.path().join("no/such/dir/out.bin"),
    };
    let key = CipherProfile::new(CipherKind::Aes256Gcm, vec![3u8; 32]).unwrap();
    let result = vaultstream_core::encrypt(&deps(Profile::Default), &instruction, key, &CancelToken::new());
    assert!(matches!(result, Err(CodecError::Io(_))));
}

#[test]
fn identical_source_and_destination_is_rejected_before_any_io() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("same.bin");
    std::fs::write(&path, b"payload").unwrap();

    let instruction = FileTransferInstruction {
        file_id: "same-path".into(),
        source_path: path.clone(),
        destination_path: path,
    };
    let key = CipherProfile::new(CipherKind::Aes256Gcm, vec![4u8; 32]).unwrap();
    let result = vaultstream_core::encrypt(&deps(Profile::Default), &instruction, key, &CancelToken::new());
    assert!(matches!(result, Err(CodecError::Validation(_))));
}
