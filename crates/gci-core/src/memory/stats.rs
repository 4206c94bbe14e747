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

use super::heap::GpuMemoryHeapId;
use super::pool::GpuMemoryPool;
use std::sync::Arc;

/// The accounting state of one pool at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuMemoryPoolUsage {
    /// The pool name.
    pub name: String,
    /// The heap the pool draws from.
    pub heap_id: GpuMemoryHeapId,
    /// Bytes currently accounted to the pool.
    pub current_bytes: u64,
    /// The highest usage the pool ever reported.
    pub peak_bytes: u64,
    /// The capacity of the backing heap.
    pub capacity_bytes: u64,
}

/// A snapshot of GPU memory accounting across every pool of a device.
#[derive(Debug, Clone, Default)]
pub struct GpuMemoryStats {
    /// Per-pool usage.
    pub pools: Vec<GpuMemoryPoolUsage>,
    /// Sum of current usage over all pools.
    pub total_current_bytes: u64,
    /// Sum of peak usage over all pools.
    pub total_peak_bytes: u64,
    /// Ratio of current usage to the capacity of all heaps that have pools, in `[0, 1]`.
    pub utilization: f64,
}

impl GpuMemoryStats {
    /// Captures the current state of `pools`.
    pub fn capture(pools: &[Arc<GpuMemoryPool>]) -> Self {
        let mut stats = Self {
            pools: pools
                .iter()
                .map(|pool| GpuMemoryPoolUsage {
                    name: pool.name().to_string(),
                    heap_id: pool.heap().id(),
                    current_bytes: pool.get_current_usage(),
                    peak_bytes: pool.peak_usage(),
                    capacity_bytes: pool.heap().total_size(),
                })
                .collect(),
            ..Default::default()
        };
        stats.calculate_derived_metrics();
        stats
    }

    /// Populates the totals from the per-pool entries.
    pub fn calculate_derived_metrics(&mut self) {
        self.total_current_bytes = self.pools.iter().map(|p| p.current_bytes).sum();
        self.total_peak_bytes = self.pools.iter().map(|p| p.peak_bytes).sum();

        let mut seen = Vec::new();
        let mut capacity = 0u64;
        for pool in &self.pools {
            if !seen.contains(&pool.heap_id) {
                seen.push(pool.heap_id);
                capacity += pool.capacity_bytes;
            }
        }
        self.utilization = if capacity > 0 {
            (self.total_current_bytes as f64 / capacity as f64).min(1.0)
        } else {
            0.0
        };
    }

    /// Looks up a pool by name.
    pub fn pool(&self, name: &str) -> Option<&GpuMemoryPoolUsage> {
        self.pools.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{GpuMemoryHeap, GpuMemoryHeapDesc, GpuMemoryHeapFlags};

    #[test]
    fn capture_sums_pools_and_counts_shared_heaps_once() {
        let heap = Arc::new(GpuMemoryHeap::new(
            GpuMemoryHeapId(0),
            &GpuMemoryHeapDesc {
                label: "vram".to_string(),
                base_alignment: 1,
                total_size: 1000,
                flags: GpuMemoryHeapFlags::DEVICE_LOCAL,
            },
        ));
        let a = Arc::new(GpuMemoryPool::new("buffers", heap.clone()));
        let b = Arc::new(GpuMemoryPool::new("textures", heap));
        a.set_current_usage(100);
        b.set_current_usage(150);

        let stats = GpuMemoryStats::capture(&[a, b]);
        assert_eq!(stats.total_current_bytes, 250);
        assert_eq!(stats.pool("textures").unwrap().current_bytes, 150);
        assert!((stats.utilization - 0.25).abs() < f64::EPSILON);
    }
}
