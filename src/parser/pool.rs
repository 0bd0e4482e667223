//! Recycled line buffers for the pooled parsing strategy.

use std::sync::Arc;

use parking_lot::Mutex;

/// Default number of idle buffers kept by a pool.
pub const DEFAULT_MAX_IDLE: usize = 64;

/// Default capacity of a freshly allocated buffer.
const INITIAL_CAPACITY: usize = 512;

/// Buffers larger than this are dropped instead of returned.
const MAX_RETAINED_CAPACITY: usize = 16 * 1024;

#[derive(Debug)]
struct PoolInner {
    idle: Mutex<Vec<String>>,
    max_idle: usize,
}

/// A pool of reusable line buffers.
///
/// Cloning the pool is cheap; clones share the same buffers.
#[derive(Debug, Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IDLE)
    }
}

impl BufferPool {
    /// Create a pool keeping at most `max_idle` idle buffers.
    pub fn new(max_idle: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                idle: Mutex::new(Vec::with_capacity(max_idle)),
                max_idle,
            }),
        }
    }

    /// Copy `line` into a rented buffer.
    ///
    /// The buffer goes back to the pool when the returned handle and every
    /// view into it are dropped.
    pub fn rent(&self, line: &str) -> Arc<PooledLine> {
        let mut buf = self
            .inner
            .idle
            .lock()
            .pop()
            .unwrap_or_else(|| String::with_capacity(INITIAL_CAPACITY.max(line.len())));
        buf.push_str(line);

        Arc::new(PooledLine {
            buf,
            pool: Arc::clone(&self.inner),
        })
    }

    /// Number of idle buffers ready to be rented.
    pub fn idle(&self) -> usize {
        self.inner.idle.lock().len()
    }
}

/// A line copied into a pooled buffer.
#[derive(Debug)]
pub struct PooledLine {
    buf: String,
    pool: Arc<PoolInner>,
}

impl PooledLine {
    /// The line content.
    pub fn as_str(&self) -> &str {
        &self.buf
    }
}

impl Drop for PooledLine {
    fn drop(&mut self) {
        let mut buf = std::mem::take(&mut self.buf);
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buf.clear();

        let mut idle = self.pool.idle.lock();
        if idle.len() < self.pool.max_idle {
            idle.push(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_returns_on_drop() {
        let pool = BufferPool::new(4);
        assert_eq!(pool.idle(), 0);

        let line = pool.rent("PING :tmi.twitch.tv");
        assert_eq!(line.as_str(), "PING :tmi.twitch.tv");
        assert_eq!(pool.idle(), 0);

        drop(line);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_buffer_is_reused_and_cleared() {
        let pool = BufferPool::new(4);
        drop(pool.rent("a much longer first line"));

        let second = pool.rent("short");
        assert_eq!(second.as_str(), "short");
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_idle_limit() {
        let pool = BufferPool::new(1);
        let a = pool.rent("a");
        let b = pool.rent("b");
        drop(a);
        drop(b);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_shared_handle_keeps_buffer() {
        let pool = BufferPool::new(4);
        let line = pool.rent("x");
        let view = Arc::clone(&line);
        drop(line);
        assert_eq!(pool.idle(), 0);
        drop(view);
        assert_eq!(pool.idle(), 1);
    }
}
