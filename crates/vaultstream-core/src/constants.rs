//! Fixed sizes that define the on-disk layout.
//!
//! These are not configurable: changing any of them changes the wire format
//! and breaks compatibility with files written by a different build.

/// Size in bytes of one plaintext block before padding.
pub const BUFFER_SIZE: usize = 81_920;

/// Alignment unit for the header and for each block's tag slot.
pub const SECTOR_SIZE: usize = 512;

/// AEAD authentication tag size, for both supported ciphers.
pub const TAG_SIZE: usize = 16;

/// AEAD nonce size, for both supported ciphers.
pub const NONCE_SIZE: usize = 12;

/// Current major version written by this implementation.
pub const CURRENT_MAJOR: u8 = 1;

/// Current minor version written by this implementation.
pub const CURRENT_MINOR: u8 = 0;

/// Round `n` up to the next multiple of `SECTOR_SIZE`.
#[must_use]
pub const fn aligned_size(n: usize) -> usize {
    ((n + SECTOR_SIZE - 1) / SECTOR_SIZE) * SECTOR_SIZE
}
