//! Reusable payload buffers.
//!
//! Workers take a buffer before generating and the writer gives it back once
//! the archive entry is written. The pool never blocks: when it is empty, or
//! a request is larger than the per-buffer ceiling, a plain allocation is
//! made instead and counted.

use corpus_core::PoolConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Buffers served from the pool
    pub hits: u64,
    /// Pool was empty; a fresh buffer was allocated
    pub misses: u64,
    /// Requests or returns above the ceiling, never pooled
    pub oversize: u64,
}

#[derive(Debug)]
pub struct BufferPool {
    buffers: Mutex<Vec<Vec<u8>>>,
    max_buffers: usize,
    ceiling: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    oversize: AtomicU64,
}

impl BufferPool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            buffers: Mutex::new(Vec::with_capacity(config.max_buffers)),
            max_buffers: config.max_buffers,
            ceiling: config.buffer_ceiling,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            oversize: AtomicU64::new(0),
        }
    }

    /// Empty buffer for a payload of roughly `size_hint` bytes.
    pub fn acquire(&self, size_hint: usize) -> Vec<u8> {
        if size_hint > self.ceiling {
            self.oversize.fetch_add(1, Ordering::Relaxed);
            return Vec::with_capacity(size_hint);
        }
        let pooled = self
            .buffers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop();
        match pooled {
            Some(buf) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                buf
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Vec::with_capacity(size_hint)
            }
        }
    }

    /// Return a buffer. Oversized buffers and returns to a full pool are
    /// dropped.
    pub fn release(&self, mut buf: Vec<u8>) {
        if buf.capacity() > self.ceiling {
            self.oversize.fetch_add(1, Ordering::Relaxed);
            return;
        }
        buf.clear();
        let mut buffers = self
            .buffers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if buffers.len() < self.max_buffers {
            buffers.push(buf);
        }
    }

    /// Buffers currently idle in the pool.
    pub fn idle(&self) -> usize {
        self.buffers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            oversize: self.oversize.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(max_buffers: usize, buffer_ceiling: usize) -> BufferPool {
        BufferPool::new(PoolConfig {
            max_buffers,
            buffer_ceiling,
        })
    }

    #[test]
    fn test_reuses_released_buffers() {
        let pool = pool(2, 1024);
        let mut buf = pool.acquire(100);
        buf.extend_from_slice(b"payload");
        pool.release(buf);
        assert_eq!(pool.idle(), 1);

        let again = pool.acquire(100);
        assert!(again.is_empty());
        assert!(again.capacity() >= 7);
        assert_eq!(pool.stats(), PoolStats { hits: 1, misses: 1, oversize: 0 });
    }

    #[test]
    fn test_exhausted_pool_falls_back_to_allocation() {
        let pool = pool(1, 1024);
        let a = pool.acquire(10);
        let b = pool.acquire(10);
        assert_eq!(pool.stats().misses, 2);
        pool.release(a);
        pool.release(b);
        // only one slot
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_oversize_never_pooled() {
        let pool = pool(4, 64);
        let big = pool.acquire(1000);
        assert!(big.capacity() >= 1000);
        pool.release(big);
        assert_eq!(pool.idle(), 0);
        assert_eq!(pool.stats().oversize, 2);
    }
}
