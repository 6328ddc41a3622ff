//! Reusable instance pool
//!
//! Short-lived entities (bullets, rock fragments) are recycled instead of
//! dropped so their heap buffers survive between lives.
//!
//! The pool never resets fields on release: whoever acquires an instance
//! re-initialises every field it reads.

/// Free-list of retired instances backed by a factory
#[derive(Debug, Clone)]
pub struct ObjectPool<T> {
    free: Vec<T>,
    factory: fn() -> T,
}

impl<T> ObjectPool<T> {
    pub fn new(factory: fn() -> T) -> Self {
        Self {
            free: Vec::new(),
            factory,
        }
    }

    /// Create a pool pre-filled with `count` factory instances
    pub fn with_capacity(factory: fn() -> T, count: usize) -> Self {
        let mut free = Vec::with_capacity(count);
        free.extend((0..count).map(|_| factory()));
        Self { free, factory }
    }

    /// Take a pooled instance, or build a fresh one when empty
    #[inline]
    pub fn acquire(&mut self) -> T {
        self.free.pop().unwrap_or_else(self.factory)
    }

    /// Return an instance for reuse
    #[inline]
    pub fn release(&mut self, obj: T) {
        self.free.push(obj);
    }

    /// Drop every pooled instance
    pub fn clear(&mut self) {
        self.free.clear();
    }

    /// Number of instances waiting for reuse
    #[inline]
    pub fn size(&self) -> usize {
        self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_buf() -> Vec<u8> {
        Vec::with_capacity(16)
    }

    #[test]
    fn test_acquire_from_empty_uses_factory() {
        let mut pool = ObjectPool::new(make_buf);
        assert_eq!(pool.size(), 0);
        let buf = pool.acquire();
        assert!(buf.capacity() >= 16);
        assert_eq!(pool.size(), 0);
    }

    #[test]
    fn test_release_does_not_reset() {
        let mut pool = ObjectPool::new(make_buf);
        let mut buf = pool.acquire();
        buf.push(7);
        pool.release(buf);
        assert_eq!(pool.acquire(), vec![7]);
    }

    #[test]
    fn test_clear_then_factory_fallback() {
        let mut pool = ObjectPool::with_capacity(make_buf, 4);
        assert_eq!(pool.size(), 4);
        pool.clear();
        assert_eq!(pool.size(), 0);
        let _ = pool.acquire();
        assert_eq!(pool.size(), 0);
    }

    #[test]
    fn test_round_trip_restores_size() {
        let mut pool = ObjectPool::with_capacity(make_buf, 2);
        let before = pool.size();
        let buf = pool.acquire();
        pool.release(buf);
        assert_eq!(pool.size(), before);
        pool.release(make_buf());
        let _ = pool.acquire();
        assert_eq!(pool.size(), before);
    }

    proptest! {
        /// Any acquire/release sequence keeps acquire total and size consistent
        #[test]
        fn prop_acquire_never_fails(ops in proptest::collection::vec(any::<bool>(), 0..200)) {
            let mut pool = ObjectPool::new(make_buf);
            let mut held: Vec<Vec<u8>> = Vec::new();
            for acquire in ops {
                if acquire || held.is_empty() {
                    let before = pool.size();
                    let buf = pool.acquire();
                    prop_assert!(buf.capacity() >= 16);
                    prop_assert_eq!(pool.size(), before.saturating_sub(1));
                    held.push(buf);
                } else if let Some(buf) = held.pop() {
                    let before = pool.size();
                    pool.release(buf);
                    prop_assert_eq!(pool.size(), before + 1);
                }
            }
        }
    }
}
