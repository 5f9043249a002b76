use std::io::{Read, Write};

use tracing::{debug, instrument, trace, warn};

use crate::cancel::CancelToken;
use crate::cipher::CipherProfile;
use crate::constants::{BUFFER_SIZE, SECTOR_SIZE, TAG_SIZE, aligned_size};
use crate::deps::{CodecDependencies, DecryptionKey, FileTransferInstruction, validate_instruction_paths};
use crate::error::CodecError;
use crate::header;
use crate::nonce;
use crate::platform_io;

use super::remaining_plaintext_len;

/// Decrypt the file named by `instruction.source_path` (a ciphertext
/// produced by [`super::encrypt`]) into `instruction.destination_path`.
#[instrument(level = "info", skip(deps, key, cancel), fields(file_id = %instruction.file_id))]
pub fn decrypt(
    deps: &CodecDependencies,
    instruction: &FileTransferInstruction,
    key: DecryptionKey,
    cancel: &CancelToken,
) -> Result<(), CodecError> {
    validate_instruction_paths(instruction)?;

    let mut input = deps.file_io.open_input(&instruction.source_path)?;
    let mut output = deps.file_io.create_output(&instruction.destination_path)?;

    let salt_size = deps.profile.salt_size();
    let header_size = header::header_size(salt_size);
    let mut header_buf = vec![0u8; header_size];
    input.read_exact(&mut header_buf)?;
    let decoded = header::decode(&header_buf, salt_size)?;
    let original_size = decoded.original_size.max(0) as u64;
    trace!(original_size, "decoded header");

    let key = if let (Some(vault), Some(master_key)) = (deps.vault.as_ref(), deps.master_public_key.as_ref()) {
        let kind = key.kind();
        let raw = vault.retrieve_key(&instruction.file_id, master_key)?;
        trace!("retrieved per-file key from key vault before block processing");
        CipherProfile::new(kind, raw).map_err(CodecError::Validation)?
    } else {
        key
    };

    let mut buffer = deps.buffer_pool.rent(BUFFER_SIZE);
    let mut plaintext = deps.buffer_pool.rent(BUFFER_SIZE);
    let mut metadata = deps.buffer_pool.rent(SECTOR_SIZE);
    // Only the first TAG_SIZE bytes of a tag sector ever hold secret
    // material; the rest is zero padding read straight off disk.
    metadata.clear_only_prefix(TAG_SIZE);

    let mut block_index: u64 = 0;
    let mut processed: u64 = 0;
    while let Some(remaining) = remaining_plaintext_len(original_size, processed) {
        if cancel.is_cancelled() {
            warn!(block_index, "decryption cancelled before reading next block");
            return Err(CodecError::Cancelled);
        }

        let aligned = if remaining > BUFFER_SIZE as u64 {
            BUFFER_SIZE
        } else {
            aligned_size(remaining as usize)
        };

        input.read_exact(&mut metadata[..SECTOR_SIZE])?;
        let mut tag = [0u8; TAG_SIZE];
        tag.copy_from_slice(&metadata[..TAG_SIZE]);

        input.read_exact(&mut buffer[..aligned])?;

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
            warn!(block_index, "decryption cancelled before writing block");
            return Err(CodecError::Cancelled);
        }

        let to_write = remaining.min(aligned as u64);
        let is_final_block = processed + to_write >= original_size;
        if is_final_block {
            let write_len = aligned_size(to_write as usize);
            output.write_all(&plaintext[..write_len])?;
        } else {
            output.write_all(&plaintext[..to_write as usize])?;
        }

        processed += to_write;
        block_index += 1;
    }

    platform_io::truncate(&output, original_size)?;
    platform_io::flush_durable(&mut output)?;
    debug!(blocks_read = block_index, "decryption finished");
    Ok(())
}
