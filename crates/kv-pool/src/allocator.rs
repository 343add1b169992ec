//! Reusable I/O buffers.

use bytes::BytesMut;
use parking_lot::Mutex;

/// A bounded free-list of fixed-size buffers.
///
/// The pool only hands the allocator to connections through
/// [`ConnectionContext`](crate::ConnectionContext); connections take and
/// return buffers themselves.
#[derive(Debug)]
pub struct BufferAllocator {
    buffer_size: usize,
    max_free: usize,
    free: Mutex<Vec<BytesMut>>,
}

impl BufferAllocator {
    /// Create an allocator keeping at most `max_free` idle buffers.
    #[must_use]
    pub fn new(buffer_size: usize, max_free: usize) -> Self {
        Self {
            buffer_size,
            max_free,
            free: Mutex::new(Vec::with_capacity(max_free)),
        }
    }

    /// Size of each buffer.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Take a cleared buffer with at least `buffer_size` capacity.
    pub fn acquire(&self) -> BytesMut {
        self.free
            .lock()
            .pop()
            .unwrap_or_else(|| BytesMut::with_capacity(self.buffer_size))
    }

    /// Return a buffer for reuse.
    ///
    /// Buffers that shrank below `buffer_size` are dropped, as are buffers
    /// beyond the free-list bound.
    pub fn release(&self, mut buffer: BytesMut) {
        buffer.clear();
        if buffer.capacity() < self.buffer_size {
            return;
        }
        let mut free = self.free.lock();
        if free.len() < self.max_free {
            free.push(buffer);
        }
    }

    /// Number of idle buffers.
    #[must_use]
    pub fn available(&self) -> usize {
        self.free.lock().len()
    }
}
