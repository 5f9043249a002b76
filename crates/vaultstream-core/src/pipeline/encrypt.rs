use std::io::{Read, Write};

use rand::RngCore;
use tracing::{debug, instrument, trace, warn};

use crate::cancel::CancelToken;
use crate::constants::{BUFFER_SIZE, NONCE_SIZE, SECTOR_SIZE, TAG_SIZE, aligned_size};
use crate::deps::{CodecDependencies, EncryptionKey, FileTransferInstruction, validate_instruction_paths};
use crate::error::CodecError;
use crate::header;
use crate::nonce;
use crate::platform_io;

/// Encrypt the file named by `instruction.source_path` into
/// `instruction.destination_path`.
///
/// Processes the plaintext in fixed `BUFFER_SIZE` blocks so memory use
/// stays bounded regardless of file size. On success, the destination file
/// is a self-describing ciphertext: header, then one `(tag sector,
/// ciphertext)` frame per block.
#[instrument(level = "info", skip(deps, key, cancel), fields(file_id = %instruction.file_id))]
pub fn encrypt(
    deps: &CodecDependencies,
    instruction: &FileTransferInstruction,
    key: EncryptionKey,
    cancel: &CancelToken,
) -> Result<(), CodecError> {
    validate_instruction_paths(instruction)?;

    let mut input = deps.file_io.open_input(&instruction.source_path)?;
    let source_length = input.metadata()?.len();
    let mut output = deps.file_io.create_output(&instruction.destination_path)?;

    let mut file_nonce = [0u8; NONCE_SIZE];
    rand::rng().fill_bytes(&mut file_nonce);
    let salt = nonce::derive_salt(deps.profile, &file_nonce)?;

    let header_bytes = header::encode(&file_nonce, source_length as i64, &salt);
    output.write_all(&header_bytes)?;
    trace!(source_length, header_len = header_bytes.len(), "wrote header");

    if let (Some(vault), Some(master_key)) = (deps.vault.as_ref(), deps.master_public_key.as_ref()) {
        vault.store_key(&instruction.file_id, key.key_bytes(), master_key)?;
        trace!("stored per-file key in key vault before block processing");
    }

    let mut buffer = deps.buffer_pool.rent(BUFFER_SIZE);
    let mut ciphertext = deps.buffer_pool.rent(BUFFER_SIZE);
    let mut metadata = deps.buffer_pool.rent(SECTOR_SIZE);
    // Only the first TAG_SIZE bytes of a tag sector ever hold secret
    // material; the rest is zero padding this loop itself wrote.
    metadata.clear_only_prefix(TAG_SIZE);
    let mut tag = [0u8; TAG_SIZE];

    let mut block_index: u64 = 0;
    loop {
        if cancel.is_cancelled() {
            warn!(block_index, "encryption cancelled before reading next block");
            return Err(CodecError::Cancelled);
        }

        let bytes_read = read_fill(&mut input, &mut buffer[..BUFFER_SIZE])?;
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
            warn!(block_index, "encryption cancelled before writing block");
            return Err(CodecError::Cancelled);
        }

        metadata[..SECTOR_SIZE].fill(0);
        metadata[..TAG_SIZE].copy_from_slice(&tag);
        output.write_all(&metadata[..SECTOR_SIZE])?;
        output.write_all(&ciphertext[..aligned])?;

        block_index += 1;
    }

    platform_io::flush_durable(&mut output)?;
    debug!(blocks_written = block_index, "encryption finished");
    Ok(())
}

/// Read into `buf` until it is full or the source is exhausted, returning
/// the number of bytes actually read. Unlike `Read::read_exact`, a short
/// read at end-of-stream is not an error — the caller interprets it as the
/// final, partial block.
fn read_fill(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..])? {
            0 => break,
            n => total += n,
        }
    }
    Ok(total)
}
