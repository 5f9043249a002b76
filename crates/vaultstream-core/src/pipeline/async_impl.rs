//! Async mirror of the sync block pipeline, gated behind the `async`
//! feature.
//!
//! I/O is async (`tokio::fs::File`); the AEAD calls themselves stay
//! synchronous inside the async function body, since authenticated
//! encryption is CPU-bound and a fixed-size block is never large enough to
//! justify `spawn_blocking`'s overhead. The final durability step is the
//! exception: it hands the file back to [`platform_io::flush_durable`] on a
//! blocking task so both pipelines get the same per-platform
//! fsync/F_FULLFSYNC/FlushFileBuffers discipline instead of a bare
//! `sync_all`.

use rand::RngCore;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::cancel::CancelToken;
use crate::cipher::CipherProfile;
use crate::constants::{BUFFER_SIZE, SECTOR_SIZE, TAG_SIZE, aligned_size};
use crate::deps::{CodecDependencies, DecryptionKey, EncryptionKey, FileTransferInstruction, validate_instruction_paths};
use crate::error::CodecError;
use crate::header;
use crate::nonce;
use crate::platform_io;

use super::remaining_plaintext_len;

/// Hand `file` to a blocking task and run `platform_io::flush_durable` on
/// it, so the async pipelines get the same per-platform durability
/// discipline as the sync one instead of a bare `sync_all`.
async fn flush_durable_async(file: tokio::fs::File) -> std::io::Result<()> {
    let mut std_file = file.into_std().await;
    tokio::task::spawn_blocking(move || platform_io::flush_durable(&mut std_file))
        .await
        .map_err(|e| std::io::Error::other(format!("flush_durable task panicked: {e}")))??;
    Ok(())
}

/// Hand `file` to a blocking task, truncate it to `len`, and flush it
/// durably — the decrypt-path finalization step.
async fn truncate_and_flush_durable_async(file: tokio::fs::File, len: u64) -> std::io::Result<()> {
    let mut std_file = file.into_std().await;
    tokio::task::spawn_blocking(move || {
        platform_io::truncate(&std_file, len)?;
        platform_io::flush_durable(&mut std_file)?;
        Ok::<_, std::io::Error>(())
    })
    .await
    .map_err(|e| std::io::Error::other(format!("flush_durable task panicked: {e}")))??;
    Ok(())
}

/// Async version of [`super::encrypt`].
#[tracing::instrument(level = "info", skip(deps, key, cancel), fields(file_id = %instruction.file_id))]
pub async fn encrypt_async(
    deps: &CodecDependencies,
    instruction: &FileTransferInstruction,
    key: EncryptionKey,
    cancel: &CancelToken,
) -> Result<(), CodecError> {
    validate_instruction_paths(instruction)?;

    let mut input = tokio::fs::File::open(&instruction.source_path).await?;
    let source_length = input.metadata().await?.len();
    let mut output = tokio::fs::File::create(&instruction.destination_path).await?;

    let mut file_nonce = [0u8; crate::constants::NONCE_SIZE];
    rand::rng().fill_bytes(&mut file_nonce);
    let salt = nonce::derive_salt(deps.profile, &file_nonce)?;

    let header_bytes = header::encode(&file_nonce, source_length as i64, &salt);
    output.write_all(&header_bytes).await?;

    if let (Some(vault), Some(master_key)) = (deps.vault.as_ref(), deps.master_public_key.as_ref()) {
        vault.store_key(&instruction.file_id, key.key_bytes(), master_key)?;
    }

    let mut buffer = deps.buffer_pool.rent(BUFFER_SIZE);
    let mut ciphertext = deps.buffer_pool.rent(BUFFER_SIZE);
    let mut metadata = deps.buffer_pool.rent(SECTOR_SIZE);
    metadata.clear_only_prefix(TAG_SIZE);
    let mut tag = [0u8; TAG_SIZE];

    let mut block_index: u64 = 0;
    loop {
        if cancel.is_cancelled() {
            return Err(CodecError::Cancelled);
        }

        let bytes_read = read_fill_async(&mut input, &mut buffer[..BUFFER_SIZE]).await?;
        if bytes_read == 0 {
            break;
        }

        let is_last = bytes_read < BUFFER_SIZE;
        let aligned = if is_last { aligned_size(bytes_read) } else { bytes_read };
        buffer[bytes_read..aligned].fill(0);

        let chunk_nonce = nonce::derive_chunk_nonce(deps.profile, &salt, block_index)?;
        key.encrypt_block(
            &chunk_nonce,
            &buffer[..aligned],
            block_index,
            aligned as u32,
            &salt,
            &mut ciphertext[..aligned],
            &mut tag,
        )?;

        if cancel.is_cancelled() {
            return Err(CodecError::Cancelled);
        }

        metadata[..SECTOR_SIZE].fill(0);
        metadata[..TAG_SIZE].copy_from_slice(&tag);
        output.write_all(&metadata[..SECTOR_SIZE]).await?;
        output.write_all(&ciphertext[..aligned]).await?;

        block_index += 1;
    }

    output.flush().await?;
    flush_durable_async(output).await?;
    Ok(())
}

/// Async version of [`super::decrypt`].
#[tracing::instrument(level = "info", skip(deps, key, cancel), fields(file_id = %instruction.file_id))]
pub async fn decrypt_async(
    deps: &CodecDependencies,
    instruction: &FileTransferInstruction,
    key: DecryptionKey,
    cancel: &CancelToken,
) -> Result<(), CodecError> {
    validate_instruction_paths(instruction)?;

    let mut input = tokio::fs::File::open(&instruction.source_path).await?;
    let mut output = tokio::fs::File::create(&instruction.destination_path).await?;

    let salt_size = deps.profile.salt_size();
    let header_size = header::header_size(salt_size);
    let mut header_buf = vec![0u8; header_size];
    input.read_exact(&mut header_buf).await?;
    let decoded = header::decode(&header_buf, salt_size)?;
    let original_size = decoded.original_size.max(0) as u64;

    let key = if let (Some(vault), Some(master_key)) = (deps.vault.as_ref(), deps.master_public_key.as_ref()) {
        let kind = key.kind();
        let raw = vault.retrieve_key(&instruction.file_id, master_key)?;
        CipherProfile::new(kind, raw).map_err(CodecError::Validation)?
    } else {
        key
    };

    let mut buffer = deps.buffer_pool.rent(BUFFER_SIZE);
    let mut plaintext = deps.buffer_pool.rent(BUFFER_SIZE);
    let mut metadata = deps.buffer_pool.rent(SECTOR_SIZE);
    metadata.clear_only_prefix(TAG_SIZE);

    let mut block_index: u64 = 0;
    let mut processed: u64 = 0;
    while let Some(remaining) = remaining_plaintext_len(original_size, processed) {
        if cancel.is_cancelled() {
            return Err(CodecError::Cancelled);
        }

        let aligned = if remaining > BUFFER_SIZE as u64 {
            BUFFER_SIZE
        } else {
            aligned_size(remaining as usize)
        };

        input.read_exact(&mut metadata[..SECTOR_SIZE]).await?;
        let mut tag = [0u8; TAG_SIZE];
        tag.copy_from_slice(&metadata[..TAG_SIZE]);

        input.read_exact(&mut buffer[..aligned]).await?;

        let chunk_nonce = nonce::derive_chunk_nonce(deps.profile, &decoded.salt, block_index)?;
        key.decrypt_block(
            &chunk_nonce,
            &buffer[..aligned],
            &tag,
            block_index,
            aligned as u32,
            &decoded.salt,
            &mut plaintext[..aligned],
        )?;

        if cancel.is_cancelled() {
            return Err(CodecError::Cancelled);
        }

        let to_write = remaining.min(aligned as u64);
        let is_final_block = processed + to_write >= original_size;
        if is_final_block {
            let write_len = aligned_size(to_write as usize);
            output.write_all(&plaintext[..write_len]).await?;
        } else {
            output.write_all(&plaintext[..to_write as usize]).await?;
        }

        processed += to_write;
        block_index += 1;
    }

    output.flush().await?;
    truncate_and_flush_durable_async(output, original_size).await?;
    Ok(())
}

async fn read_fill_async(
    reader: &mut (impl AsyncReadExt + Unpin),
    buf: &mut [u8],
) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]).await? {
            0 => break,
            n => total += n,
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::{CipherKind, CipherProfile};
    use crate::platform_io::StdFileIo;
    use crate::profile::Profile;
    use std::sync::Arc;

    fn deps(profile: Profile) -> CodecDependencies {
        CodecDependencies::new(profile, Arc::new(StdFileIo))
    }

    #[tokio::test]
    async fn async_round_trip_matches_sync_output() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("plain.bin");
        let ciphertext_path = dir.path().join("cipher.bin");
        let restored_path = dir.path().join("restored.bin");
        let plaintext = b"round tripping through the async pipeline".to_vec();
        std::fs::write(&source, &plaintext).unwrap();

        let encrypt_instruction = FileTransferInstruction {
            file_id: "f1".into(),
            source_path: source,
            destination_path: ciphertext_path.clone(),
        };
        let key = CipherProfile::new(CipherKind::Aes256Gcm, vec![1u8; 32]).unwrap();
        encrypt_async(&deps(Profile::Default), &encrypt_instruction, key, &CancelToken::new())
            .await
            .unwrap();

        let decrypt_instruction = FileTransferInstruction {
            file_id: "f1".into(),
            source_path: ciphertext_path,
            destination_path: restored_path.clone(),
        };
        let key = CipherProfile::new(CipherKind::Aes256Gcm, vec![1u8; 32]).unwrap();
        decrypt_async(&deps(Profile::Default), &decrypt_instruction, key, &CancelToken::new())
            .await
            .unwrap();

        let restored = std::fs::read(&restored_path).unwrap();
        assert_eq!(restored, plaintext);
    }

    #[tokio::test]
    async fn two_independent_jobs_run_concurrently() {
        let dir = tempfile::tempdir().unwrap();
        let deps = Arc::new(deps(Profile::Default));

        let make_job = |name: &str, byte: u8| {
            let dir = dir.path().to_owned();
            let deps = Arc::clone(&deps);
            async move {
                let source = dir.join(format!("{name}-plain.bin"));
                let ciphertext = dir.join(format!("{name}-cipher.bin"));
                let restored = dir.join(format!("{name}-restored.bin"));
                std::fs::write(&source, vec![byte; 4096]).unwrap();

                let instruction = FileTransferInstruction {
                    file_id: name.to_owned(),
                    source_path: source,
                    destination_path: ciphertext.clone(),
                };
                let key = CipherProfile::new(CipherKind::Aes256Gcm, vec![byte; 32]).unwrap();
                encrypt_async(&deps, &instruction, key, &CancelToken::new()).await.unwrap();

                let instruction = FileTransferInstruction {
                    file_id: name.to_owned(),
                    source_path: ciphertext,
                    destination_path: restored.clone(),
                };
                let key = CipherProfile::new(CipherKind::Aes256Gcm, vec![byte; 32]).unwrap();
                decrypt_async(&deps, &instruction, key, &CancelToken::new()).await.unwrap();

                std::fs::read(&restored).unwrap()
            }
        };

        let (a, b) = tokio::join!(make_job("a", 0xAA), make_job("b", 0xBB));
        assert_eq!(a, vec![0xAAu8; 4096]);
        assert_eq!(b, vec![0xBBu8; 4096]);
    }
}
