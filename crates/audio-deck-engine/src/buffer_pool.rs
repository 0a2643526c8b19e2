//! Shared pool of transfer buffers for the copy loop.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};

pub(crate) struct BufferPool {
    buffer_size: usize,
    free: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    pub(crate) fn new(buffer_size: usize) -> Arc<Self> {
        Arc::new(Self {
            buffer_size: buffer_size.max(1),
            free: Mutex::new(Vec::new()),
        })
    }

    /// Rent a buffer; it returns to the pool when dropped.
    pub(crate) fn acquire(self: &Arc<Self>) -> PooledBuffer {
        let buf = self
            .free
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| vec![0u8; self.buffer_size]);
        PooledBuffer {
            buf: Some(buf),
            pool: Arc::clone(self),
        }
    }

    #[cfg(test)]
    fn free_count(&self) -> usize {
        self.free.lock().unwrap().len()
    }
}

pub(crate) struct PooledBuffer {
    buf: Option<Vec<u8>>,
    pool: Arc<BufferPool>,
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self.buf.as_deref() {
            Some(buf) => buf,
            None => &[],
        }
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        match self.buf.as_deref_mut() {
            Some(buf) => buf,
            None => &mut [],
        }
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.free.lock().unwrap().push(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_return_to_the_pool_on_drop() {
        let pool = BufferPool::new(16);
        assert_eq!(pool.free_count(), 0);

        let buf = pool.acquire();
        assert_eq!(buf.len(), 16);
        drop(buf);
        assert_eq!(pool.free_count(), 1);

        let _again = pool.acquire();
        assert_eq!(pool.free_count(), 0);
    }

    #[test]
    fn concurrent_rentals_get_distinct_buffers() {
        let pool = BufferPool::new(8);
        let mut a = pool.acquire();
        let mut b = pool.acquire();
        a[0] = 1;
        b[0] = 2;
        assert_ne!(a[0], b[0]);
        drop(a);
        drop(b);
        assert_eq!(pool.free_count(), 2);
    }
}
