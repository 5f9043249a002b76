//! Version and header codec (C4).
//!
//! The header is `[major, minor, nonce(12), original_size(8 LE), salt]`,
//! zero-padded to a whole sector. It is written once, before any block is
//! processed, and never rewritten.

use crate::constants::{CURRENT_MAJOR, NONCE_SIZE, SECTOR_SIZE, aligned_size};
use crate::error::VersionFailure;

/// Unaligned length of the logical header fields for a given salt size.
const fn logical_len(salt_size: usize) -> usize {
    2 + NONCE_SIZE + 8 + salt_size
}

/// On-disk length of the header: `logical_len` rounded up to a sector.
#[must_use]
pub const fn header_size(salt_size: usize) -> usize {
    aligned_size(logical_len(salt_size))
}

/// Decoded header contents, as returned by [`decode`].
#[derive(Debug, Clone)]
pub struct DecodedHeader {
    pub major_version: u8,
    pub minor_version: u8,
    pub nonce: [u8; NONCE_SIZE],
    pub original_size: i64,
    pub salt: Vec<u8>,
}

/// Encode a header into a freshly allocated, sector-aligned buffer.
#[tracing::instrument(level = "debug", skip(nonce, salt), fields(original_size, salt_len = salt.len()))]
pub fn encode(nonce: &[u8; NONCE_SIZE], original_size: i64, salt: &[u8]) -> Vec<u8> {
    let size = header_size(salt.len());
    let mut buf = vec![0u8; size];
    buf[0] = CURRENT_MAJOR;
    buf[1] = crate::constants::CURRENT_MINOR;
    buf[2..2 + NONCE_SIZE].copy_from_slice(nonce);
    buf[2 + NONCE_SIZE..2 + NONCE_SIZE + 8].copy_from_slice(&original_size.to_le_bytes());
    buf[2 + NONCE_SIZE + 8..2 + NONCE_SIZE + 8 + salt.len()].copy_from_slice(salt);
    buf
}

/// Decode and validate a header of exactly `header_size(salt_size)` bytes.
///
/// `salt_size` must be known ahead of time by the caller (it is a property
/// of the [`crate::profile::Profile`] the caller expects the file to use),
/// since the header has no explicit length-prefixed salt field.
#[tracing::instrument(level = "debug", skip(buf), fields(buf_len = buf.len(), salt_size))]
pub fn decode(buf: &[u8], salt_size: usize) -> Result<DecodedHeader, VersionFailure> {
    let major_version = buf[0];
    let minor_version = buf[1];

    if major_version == 0 {
        tracing::warn!("header major version is zero");
        return Err(VersionFailure::MajorIsZero);
    }
    if major_version > CURRENT_MAJOR {
        tracing::warn!(found = major_version, max = CURRENT_MAJOR, "header major version too new");
        return Err(VersionFailure::MajorTooNew {
            found: major_version,
            max: CURRENT_MAJOR,
        });
    }
    validate_minor(major_version, minor_version)?;

    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(&buf[2..2 + NONCE_SIZE]);

    let mut size_bytes = [0u8; 8];
    size_bytes.copy_from_slice(&buf[2 + NONCE_SIZE..2 + NONCE_SIZE + 8]);
    let original_size = i64::from_le_bytes(size_bytes);

    let salt = buf[2 + NONCE_SIZE + 8..2 + NONCE_SIZE + 8 + salt_size].to_vec();

    Ok(DecodedHeader {
        major_version,
        minor_version,
        nonce,
        original_size,
        salt,
    })
}

/// Per-major minor-version acceptance strategy. Major version 1 currently
/// accepts any minor version; a future major version would get its own
/// match arm here instead of a generic "reject everything" fallback.
fn validate_minor(major: u8, _minor: u8) -> Result<(), VersionFailure> {
    match major {
        1 => Ok(()),
        _ => Err(VersionFailure::MinorRejected {
            major,
            minor: _minor,
        }),
    }
}
