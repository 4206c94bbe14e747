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

use super::pool::GpuMemoryPool;
use super::region::GpuMemoryRegion;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLockReadGuard};

/// Binds one [`GpuMemoryPool`] and one region inside it.
///
/// The atomic lock flag gates CPU access to this particular region. It is much
/// cheaper than the pool-wide lock, and a contended ref never blocks the others.
#[derive(Debug)]
pub struct GpuMemoryRef {
    pool: Arc<GpuMemoryPool>,
    region: GpuMemoryRegion,
    lock_status: AtomicBool,
}

impl GpuMemoryRef {
    /// Binds `region` of `pool`.
    pub fn new(pool: Arc<GpuMemoryPool>, region: GpuMemoryRegion) -> Self {
        Self {
            pool,
            region,
            lock_status: AtomicBool::new(false),
        }
    }

    /// The pool this reference draws from.
    pub fn pool(&self) -> &Arc<GpuMemoryPool> {
        &self.pool
    }

    /// The region bound by this reference.
    pub fn region(&self) -> GpuMemoryRegion {
        self.region
    }

    /// Returns `true` while some holder owns the lock.
    pub fn is_locked(&self) -> bool {
        self.lock_status.load(Ordering::Acquire)
    }

    /// Attempts to take the lock without waiting.
    pub fn try_lock(&self) -> bool {
        self.lock_status
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Spins until the lock is taken.
    pub fn lock(&self) {
        while !self.try_lock() {
            while self.lock_status.load(Ordering::Relaxed) {
                std::hint::spin_loop();
            }
        }
    }

    /// Releases the lock.
    pub fn unlock(&self) {
        let was_locked = self.lock_status.swap(false, Ordering::Release);
        debug_assert!(was_locked, "GpuMemoryRef unlocked while not locked");
    }

    /// Takes the lock and returns a guard releasing it on drop.
    pub fn scoped_lock(&self) -> GpuMemoryRefGuard<'_> {
        self.lock();
        GpuMemoryRefGuard { owner: self }
    }

    /// Takes the lock if it is free and returns a guard releasing it on drop.
    pub fn try_scoped_lock(&self) -> Option<GpuMemoryRefGuard<'_>> {
        self.try_lock().then_some(GpuMemoryRefGuard { owner: self })
    }

    /// Takes the shared side of the owning pool's lock.
    pub fn lock_pool_shared(&self) -> RwLockReadGuard<'_, ()> {
        self.pool.lock_shared()
    }
}

/// Releases a [`GpuMemoryRef`] lock when dropped.
#[derive(Debug)]
pub struct GpuMemoryRefGuard<'a> {
    owner: &'a GpuMemoryRef,
}

impl GpuMemoryRefGuard<'_> {
    /// The region guarded by this lock.
    pub fn region(&self) -> GpuMemoryRegion {
        self.owner.region
    }
}

impl Drop for GpuMemoryRefGuard<'_> {
    fn drop(&mut self) {
        self.owner.unlock();
    }
}
