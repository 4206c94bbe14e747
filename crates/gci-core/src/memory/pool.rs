// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::heap::GpuMemoryHeap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A named sub-allocation domain drawn from exactly one [`GpuMemoryHeap`].
///
/// The usage counter is plain atomic accounting with last-write-wins semantics.
/// Structural pool operations take the exclusive side of [`memory_lock`](Self::memory_lock);
/// concurrent CPU access through [`GpuMemoryRef`](super::GpuMemoryRef)s takes the shared side.
#[derive(Debug)]
pub struct GpuMemoryPool {
    name: String,
    heap: Arc<GpuMemoryHeap>,
    current_usage: AtomicU64,
    peak_usage: AtomicU64,
    memory_lock: RwLock<()>,
}

impl GpuMemoryPool {
    /// Creates an empty pool on `heap`.
    pub fn new(name: impl Into<String>, heap: Arc<GpuMemoryHeap>) -> Self {
        Self {
            name: name.into(),
            heap,
            current_usage: AtomicU64::new(0),
            peak_usage: AtomicU64::new(0),
            memory_lock: RwLock::new(()),
        }
    }

    /// The name of this pool.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The heap this pool draws from.
    pub fn heap(&self) -> &Arc<GpuMemoryHeap> {
        &self.heap
    }

    /// Overwrites the usage counter. The chronologically last call wins.
    pub fn set_current_usage(&self, bytes: u64) {
        self.current_usage.store(bytes, Ordering::Release);
        self.peak_usage.fetch_max(bytes, Ordering::Relaxed);
    }

    /// The usage counter as last written.
    pub fn get_current_usage(&self) -> u64 {
        self.current_usage.load(Ordering::Acquire)
    }

    /// The highest usage this pool ever reported.
    pub fn peak_usage(&self) -> u64 {
        self.peak_usage.load(Ordering::Relaxed)
    }

    /// The number of bytes still available in the backing heap from this pool's view.
    pub fn available(&self) -> u64 {
        self.heap
            .total_size()
            .saturating_sub(self.get_current_usage())
    }

    /// Accounts for `bytes` more usage if the heap capacity allows it.
    ///
    /// Returns the usage before the reservation (a nominal offset for the
    /// new sub-range), or `None` if the heap would overflow.
    pub fn reserve(&self, bytes: u64) -> Option<u64> {
        let capacity = self.heap.total_size();
        let previous = self
            .current_usage
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |usage| {
                usage.checked_add(bytes).filter(|next| *next <= capacity)
            })
            .ok()?;
        self.peak_usage
            .fetch_max(previous + bytes, Ordering::Relaxed);
        Some(previous)
    }

    /// Removes `bytes` of usage, saturating at zero.
    pub fn release(&self, bytes: u64) {
        let _ = self
            .current_usage
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |usage| {
                Some(usage.saturating_sub(bytes))
            });
    }

    /// The shared/exclusive lock guarding this pool.
    pub fn memory_lock(&self) -> &RwLock<()> {
        &self.memory_lock
    }

    /// Takes the shared side of the pool lock.
    pub fn lock_shared(&self) -> RwLockReadGuard<'_, ()> {
        self.memory_lock
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Takes the exclusive side of the pool lock, for structural operations.
    pub fn lock_exclusive(&self) -> RwLockWriteGuard<'_, ()> {
        self.memory_lock
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{GpuMemoryHeapDesc, GpuMemoryHeapFlags, GpuMemoryHeapId};
    use std::thread;

    fn test_pool(capacity: u64) -> GpuMemoryPool {
        let heap = Arc::new(GpuMemoryHeap::new(
            GpuMemoryHeapId(0),
            &GpuMemoryHeapDesc {
                label: "test".to_string(),
                base_alignment: 16,
                total_size: capacity,
                flags: GpuMemoryHeapFlags::DEVICE_LOCAL,
            },
        ));
        GpuMemoryPool::new("test_pool", heap)
    }

    #[test]
    fn set_current_usage_is_last_write_wins() {
        let pool = test_pool(1024);
        for value in [10, 500, 3, 77] {
            pool.set_current_usage(value);
        }
        assert_eq!(pool.get_current_usage(), 77);
        assert_eq!(pool.peak_usage(), 500);
    }

    #[test]
    fn concurrent_writers_then_final_write_wins() {
        let pool = Arc::new(test_pool(1 << 20));
        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let pool = pool.clone();
                thread::spawn(move || {
                    for i in 0..1000u64 {
                        pool.set_current_usage(t * 1000 + i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        pool.set_current_usage(4242);
        assert_eq!(pool.get_current_usage(), 4242);
    }

    #[test]
    fn reserve_respects_heap_capacity() {
        let pool = test_pool(100);
        assert_eq!(pool.reserve(60), Some(0));
        assert_eq!(pool.reserve(40), Some(60));
        assert_eq!(pool.reserve(1), None);
        assert_eq!(pool.available(), 0);
        pool.release(30);
        assert_eq!(pool.get_current_usage(), 70);
        pool.release(1000);
        assert_eq!(pool.get_current_usage(), 0);
        assert_eq!(pool.peak_usage(), 100);
    }

    #[test]
    fn shared_lock_admits_many_readers() {
        let pool = test_pool(64);
        let first = pool.lock_shared();
        let second = pool.lock_shared();
        assert!(pool.memory_lock().try_write().is_err());
        drop(first);
        drop(second);
        let _exclusive = pool.lock_exclusive();
        assert!(pool.memory_lock().try_read().is_err());
    }
}
