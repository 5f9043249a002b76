//! Block pipeline (C5): the state machines that turn a plaintext file into
//! a framed ciphertext file and back.
//!
//! Both directions are linear — there is no backtracking, and cancellation
//! is only observed at block boundaries (see [`crate::cancel::CancelToken`]).
//! A synchronous implementation is always available; an async mirror lives
//! behind the `async` feature and delegates the CPU-bound AEAD work
//! synchronously inside the async function body, the same tradeoff the
//! teacher's own async file path documents.

mod decrypt;
mod encrypt;

pub use decrypt::decrypt;
pub use encrypt::encrypt;

#[cfg(feature = "async")]
mod async_impl;

#[cfg(feature = "async")]
pub use async_impl::{decrypt_async, encrypt_async};

/// How many plaintext bytes the ciphertext block at index `i` covers, given
/// the file's total plaintext length. `None` once `i` is past the last
/// block.
fn remaining_plaintext_len(original_size: u64, processed: u64) -> Option<u64> {
    if processed >= original_size {
        None
    } else {
        Some(original_size - processed)
    }
}
