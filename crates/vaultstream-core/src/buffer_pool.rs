//! Reusable byte buffers for the block pipeline (C2).
//!
//! Buffers rented from [`BufferPool`] stage plaintext, ciphertext, tags, and
//! derived key material. Every buffer is zeroed before it is returned to the
//! pool, so a later `rent()` call never observes residual secret bytes —
//! this is a scoped-acquisition guard standing in for a finally-style
//! dispose.
//!
//! The pool is process-wide and safe to share across concurrently running
//! jobs via `Arc<BufferPool>`.

use std::sync::Mutex;

use zeroize::Zeroize;

/// A process-wide, thread-safe pool of reusable byte buffers.
#[derive(Debug, Default)]
pub struct BufferPool {
    free: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rent a buffer of at least `min_len` bytes, reusing a freed allocation
    /// when one is large enough.
    ///
    /// Growing a reused buffer zero-fills the newly exposed tail; shrinking
    /// one leaves its existing prefix bytes untouched — whatever the last
    /// tenant's [`PooledBuffer::drop`](Drop) left there (all zero, unless it
    /// called [`PooledBuffer::discard_without_clearing`]).
    pub fn rent(&self, min_len: usize) -> PooledBuffer<'_> {
        let mut free = self.free.lock().unwrap_or_else(|e| e.into_inner());
        let mut buf = match free.iter().position(|b| b.capacity() >= min_len) {
            Some(idx) => free.swap_remove(idx),
            None => Vec::new(),
        };
        if buf.len() < min_len {
            buf.resize(min_len, 0);
        } else {
            buf.truncate(min_len);
        }
        PooledBuffer {
            pool: self,
            buf: Some(buf),
            clear_mode: ClearMode::Full,
        }
    }

    fn reclaim(&self, mut buf: Vec<u8>, clear_mode: ClearMode) {
        match clear_mode {
            ClearMode::Full => buf.zeroize(),
            ClearMode::Prefix(n) => buf[..n].zeroize(),
            ClearMode::None => {}
        }
        let mut free = self.free.lock().unwrap_or_else(|e| e.into_inner());
        free.push(buf);
    }
}

/// How much of a [`PooledBuffer`] gets zeroed when it is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClearMode {
    /// Zero the whole buffer (the default).
    Full,
    /// Zero only the first `n` bytes — for buffers whose secret material is
    /// known to be confined to a prefix (e.g. a tag sector, where only the
    /// first `TAG_SIZE` bytes are ever non-zero-padding).
    Prefix(usize),
    /// Skip zeroing entirely — only for buffers known to hold no secret
    /// material.
    None,
}

/// A buffer rented from a [`BufferPool`].
///
/// Dropping it zeroes the contents (in full, or a prefix, per
/// [`ClearMode`]) and returns the allocation to the pool, unless
/// [`PooledBuffer::discard_without_clearing`] was called first.
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buf: Option<Vec<u8>>,
    clear_mode: ClearMode,
}

impl PooledBuffer<'_> {
    /// Mark this buffer as free of secret material, skipping the zeroing
    /// pass when it is returned to the pool.
    pub fn discard_without_clearing(&mut self) {
        self.clear_mode = ClearMode::None;
    }

    /// Zero only the first `n` bytes on return instead of the whole buffer —
    /// for buffers like a tag sector, where bytes beyond the tag are known
    /// to be non-secret zero padding. Panics if `n` exceeds the buffer's
    /// length.
    pub fn clear_only_prefix(&mut self, n: usize) {
        assert!(n <= self.len(), "clear prefix longer than the buffer");
        self.clear_mode = ClearMode::Prefix(n);
    }
}

impl std::ops::Deref for PooledBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buf.as_deref().expect("buffer taken before drop")
    }
}

impl std::ops::DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buf.as_deref_mut().expect("buffer taken before drop")
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.reclaim(buf, self.clear_mode);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rent_returns_zeroed_buffer_of_requested_length() {
        let pool = BufferPool::new();
        let buf = pool.rent(1024);
        assert_eq!(buf.len(), 1024);
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn returned_buffer_is_cleared_before_reuse() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.rent(256);
            buf.fill(0xAA);
        }
        let buf = pool.rent(256);
        assert!(
            buf.iter().all(|&b| b == 0),
            "residual secret bytes observed after rent/return cycle"
        );
    }

    #[test]
    fn reused_allocation_can_grow() {
        let pool = BufferPool::new();
        {
            let _buf = pool.rent(64);
        }
        let buf = pool.rent(128);
        assert_eq!(buf.len(), 128);
        // The newly exposed tail beyond the original 64 bytes must be zero
        // even though the pool never explicitly cleared it (it was never
        // written to by a prior tenant).
        assert!(buf[64..].iter().all(|&b| b == 0));
    }

    #[test]
    fn discard_without_clearing_skips_zeroing() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.rent(16);
            buf.fill(0xFF);
            buf.discard_without_clearing();
        }
        let buf = pool.rent(16);
        assert!(buf.iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn clear_only_prefix_leaves_the_rest_untouched() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.rent(32);
            buf.fill(0x7A);
            buf.clear_only_prefix(4);
        }
        let buf = pool.rent(32);
        assert!(buf[..4].iter().all(|&b| b == 0), "prefix was not cleared");
        assert!(
            buf[4..].iter().all(|&b| b == 0x7A),
            "clear_only_prefix cleared bytes beyond the requested prefix"
        );
    }

    #[test]
    #[should_panic(expected = "clear prefix longer than the buffer")]
    fn clear_only_prefix_rejects_out_of_range_length() {
        let pool = BufferPool::new();
        let mut buf = pool.rent(8);
        buf.clear_only_prefix(9);
    }

    #[test]
    fn pool_is_shareable_across_threads() {
        use std::sync::Arc;

        let pool = Arc::new(BufferPool::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = Arc::clone(&pool);
            handles.push(std::thread::spawn(move || {
                for _ in 0..50 {
                    let mut buf = pool.rent(4096);
                    buf.fill(0x42);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
